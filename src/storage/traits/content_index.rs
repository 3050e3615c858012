//! Content index trait.
//!
//! The content index computes digests of file content and searches a
//! volume for files by digest.
//!
//! # Available Implementations
//!
//! | Backend | Use Case | Digest |
//! |---------|----------|--------|
//! | `LocalContentIndex` | CLI, tests | SHA-256 hex over file bytes |
//!
//! # Error Modes
//!
//! Both operations are expensive and may fail on I/O. Callers in this
//! crate wrap failures as [`crate::Error::HashFailed`] and
//! [`crate::Error::SearchFailed`] respectively.

use crate::Result;
use crate::models::FileEntry;
use async_trait::async_trait;
use std::collections::HashMap;

/// URLs of files matching each searched hash.
///
/// A hash with no matches may be absent or map to an empty list.
pub type HashMatches = HashMap<String, Vec<String>>;

/// Trait for content index backends.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn ContentIndex>`
/// - `compute_hash` reads file content and may take seconds for large files
/// - `search_by_hashes` must scope results to the given volume
#[async_trait]
pub trait ContentIndex: Send + Sync {
    /// Computes the content digest of an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be read.
    async fn compute_hash(&self, entry: &FileEntry) -> Result<String>;

    /// Searches a volume for files with any of the given hashes.
    ///
    /// # Errors
    ///
    /// Returns an error if the search backend fails.
    async fn search_by_hashes(&self, volume_id: &str, hashes: &[String]) -> Result<HashMatches>;
}
