//! Collaborator traits.
//!
//! The duplicate finder depends on four external services, each modelled
//! as an object-safe async trait so they can be shared via `Arc<dyn _>` and
//! substituted in tests.

mod content_index;
mod fingerprint;
mod history;
mod volume;

pub use content_index::{ContentIndex, HashMatches};
pub use fingerprint::MetadataFingerprinter;
pub use history::{HistoryLoader, ImportHistory};
pub use volume::VolumeManager;
