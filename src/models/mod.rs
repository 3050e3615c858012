//! Data models for import-dedup.
//!
//! File entries and the enums that describe import destinations, scan modes,
//! and the resulting disposition.

mod destination;
mod disposition;
mod entry;

pub use destination::{Destination, ScanMode, VolumeType};
pub use disposition::Disposition;
pub use entry::{FileEntry, path_to_url};
