//! # import-dedup
//!
//! Duplicate detection for files imported into cloud storage.
//!
//! Given a candidate file, decides whether it is already present at the
//! import destination, using two signals:
//!
//! - **Import history**: was the file previously copied or imported?
//! - **Content hash**: does the destination volume already hold a file
//!   with the same content digest?
//!
//! History is always consulted first and short-circuits the expensive
//! content-hash path.
//!
//! ## Example
//!
//! ```rust,ignore
//! use import_dedup::{Destination, DispositionChecker, FileEntry, ScanMode};
//!
//! let checker = DispositionChecker::new(history_loader, Arc::new(finder));
//! let entry = FileEntry::from_path("/media/card/DCIM/IMG_0001.JPG").await?;
//! let disposition = checker
//!     .get_disposition(&entry, Destination::CloudDrive, ScanMode::Content)
//!     .await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::DedupConfig;
pub use models::{Destination, Disposition, FileEntry, ScanMode, VolumeType};
pub use observability::{MetricsTelemetry, TelemetryRecorder};
pub use services::deduplication::{
    CacheKey, CheckerFn, ContentHasher, ContentMatcher, DispositionChecker, DuplicateFinder,
    DuplicateSearchClient, FinderCollaborators, HashCache, HashResult, VolumeResolver,
};

/// Error type for import-dedup operations.
///
/// `Clone` so that one failed computation can be handed to every caller
/// sharing it.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `UnsupportedDestination` | Disposition requested for a destination without content dedup |
/// | `HashFailed` | The content index fails to compute a digest |
/// | `SearchFailed` | The content index fails a search-by-hash |
/// | `HistoryUnavailable` | The history snapshot cannot be loaded or queried |
/// | `VolumeUnavailable` | The volume manager cannot resolve the destination volume |
/// | `InvalidInput` | Bad configuration values, malformed arguments |
/// | `OperationFailed` | Filesystem I/O, config parsing, observability setup |
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// The destination does not support duplicate detection.
    ///
    /// Raised before any collaborator is invoked.
    #[error("unsupported destination: {0}")]
    UnsupportedDestination(Destination),

    /// Content hash computation failed.
    #[error("content hash for '{url}' failed: {cause}")]
    HashFailed {
        /// URL of the entry being hashed.
        url: String,
        /// The underlying cause.
        cause: String,
    },

    /// Search by content hash failed.
    #[error("search in volume '{volume_id}' failed: {cause}")]
    SearchFailed {
        /// The volume that was searched.
        volume_id: String,
        /// The underlying cause.
        cause: String,
    },

    /// The import history could not be loaded or queried.
    #[error("import history unavailable: {0}")]
    HistoryUnavailable(String),

    /// The destination volume could not be resolved.
    #[error("volume '{volume_type}' unavailable: {cause}")]
    VolumeUnavailable {
        /// The volume type requested.
        volume_type: VolumeType,
        /// The underlying cause.
        cause: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for import-dedup operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedDestination(Destination::LocalFolder);
        assert_eq!(err.to_string(), "unsupported destination: local-folder");

        let err = Error::HashFailed {
            url: "file:///a.jpg".to_string(),
            cause: "disk error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "content hash for 'file:///a.jpg' failed: disk error"
        );

        let err = Error::VolumeUnavailable {
            volume_type: VolumeType::CloudDrive,
            cause: "not mounted".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "volume 'cloud-drive' unavailable: not mounted"
        );
    }

    #[test]
    fn test_error_is_clone() {
        let err = Error::SearchFailed {
            volume_id: "drive:1".to_string(),
            cause: "timeout".to_string(),
        };
        let copy = err.clone();
        assert_eq!(err.to_string(), copy.to_string());
    }
}
