//! Metadata fingerprint trait.

use crate::Result;
use crate::models::FileEntry;
use async_trait::async_trait;

/// Derives a cheap fingerprint of an entry's metadata.
///
/// The fingerprint must change whenever the content could have changed
/// (size or modification time).
#[async_trait]
pub trait MetadataFingerprinter: Send + Sync {
    /// Returns the metadata fingerprint of an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata cannot be read.
    async fn fingerprint(&self, entry: &FileEntry) -> Result<String>;
}
