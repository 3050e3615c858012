//! Search-by-hash within the destination volume.

use super::volume::VolumeResolver;
use crate::observability::{LONG_SEARCH_BY_HASH, TelemetryRecorder};
use crate::storage::traits::ContentIndex;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

/// Looks up files with a given content hash on the destination volume.
pub struct DuplicateSearchClient {
    index: Arc<dyn ContentIndex>,
    volumes: Arc<VolumeResolver>,
    telemetry: Arc<dyn TelemetryRecorder>,
    threshold: Duration,
}

impl DuplicateSearchClient {
    /// Creates a search client.
    #[must_use]
    pub fn new(
        index: Arc<dyn ContentIndex>,
        volumes: Arc<VolumeResolver>,
        telemetry: Arc<dyn TelemetryRecorder>,
    ) -> Self {
        Self {
            index,
            volumes,
            telemetry,
            threshold: Duration::from_millis(crate::config::DEFAULT_SEARCH_THRESHOLD_MS),
        }
    }

    /// Sets the duration at or above which a search is reported as slow.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Returns the URLs of files on the volume whose content hash is `hash`.
    ///
    /// The list is empty when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VolumeUnavailable`] if the volume cannot be resolved,
    /// or [`Error::SearchFailed`] if the index search fails.
    #[instrument(skip(self), fields(operation = "search_by_hash"))]
    pub async fn find_by_hash(&self, hash: &str) -> Result<Vec<String>> {
        let volume_id = self.volumes.volume_id().await?;
        let hashes = [hash.to_string()];

        let start = Instant::now();
        let result = self.index.search_by_hashes(volume_id, &hashes).await;
        let elapsed = start.elapsed();

        if elapsed >= self.threshold {
            tracing::info!(
                volume_id,
                elapsed_ms = elapsed.as_millis(),
                "Search by hash was slow"
            );
            self.telemetry.record_duration(LONG_SEARCH_BY_HASH, elapsed);
        }

        let mut matches = result.map_err(|e| Error::SearchFailed {
            volume_id: volume_id.to_string(),
            cause: e.to_string(),
        })?;

        let urls = matches.remove(hash).unwrap_or_default();
        tracing::debug!(matches = urls.len(), "Search by hash complete");
        Ok(urls)
    }
}
