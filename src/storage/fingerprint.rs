//! Size and modification-time fingerprint.

use crate::Result;
use crate::models::FileEntry;
use crate::storage::traits::MetadataFingerprinter;
use async_trait::async_trait;

/// Fingerprints an entry as `{modified_ms}_{size}`.
///
/// Uses the metadata already carried by the entry, so it never touches disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeMtimeFingerprinter;

impl SizeMtimeFingerprinter {
    /// Creates a new fingerprinter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the fingerprint synchronously.
    #[must_use]
    pub fn fingerprint_of(entry: &FileEntry) -> String {
        format!("{}_{}", entry.modified_ms, entry.size)
    }
}

#[async_trait]
impl MetadataFingerprinter for SizeMtimeFingerprinter {
    async fn fingerprint(&self, entry: &FileEntry) -> Result<String> {
        Ok(Self::fingerprint_of(entry))
    }
}
