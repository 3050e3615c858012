//! Collaborator backends.
//!
//! The duplicate finder talks to four external services:
//! - **Fingerprint**: cheap metadata proxy for "content may have changed"
//! - **Content index**: digest computation and search by digest
//! - **Volumes**: storage volume id resolution
//! - **History**: what was previously copied or imported
//!
//! Traits live in [`traits`]; this module also ships local implementations
//! used by the CLI and tests.

// Allow significant_drop_tightening - guards are dropped at scope end in short blocks.
#![allow(clippy::significant_drop_tightening)]

pub mod content_index;
pub mod fingerprint;
pub mod history;
pub mod traits;
pub mod volume;

pub use content_index::LocalContentIndex;
pub use fingerprint::SizeMtimeFingerprinter;
pub use history::{
    HistoryRecord, HistorySnapshotFile, InMemoryHistory, InMemoryHistoryLoader, JsonHistoryLoader,
};
pub use traits::{
    ContentIndex, HashMatches, HistoryLoader, ImportHistory, MetadataFingerprinter, VolumeManager,
};
pub use volume::StaticVolumeManager;
