//! Business logic services.
//!
//! Services compose the collaborators in [`crate::storage`] into the
//! import-time duplicate checks.

pub mod deduplication;

pub use deduplication::{DispositionChecker, DuplicateFinder};
