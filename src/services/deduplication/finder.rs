//! Content-duplicate detection against the destination volume.

use super::cache::HashCache;
use super::hasher::ContentHasher;
use super::search::DuplicateSearchClient;
use super::volume::VolumeResolver;
use crate::config::DedupConfig;
use crate::models::{Destination, FileEntry};
use crate::observability::{MetricsTelemetry, TelemetryRecorder};
use crate::storage::traits::{ContentIndex, MetadataFingerprinter, VolumeManager};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

/// Answers whether an entry's content already exists at the destination.
#[async_trait]
pub trait ContentMatcher: Send + Sync {
    /// Returns true if a file with the same content exists at the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing, volume resolution or search fails.
    async fn is_duplicate(&self, entry: &FileEntry) -> Result<bool>;
}

/// External collaborators a [`DuplicateFinder`] is built from.
///
/// Cheap to clone; every finder built from it gets its own cache and
/// volume resolver.
#[derive(Clone)]
pub struct FinderCollaborators {
    /// Derives metadata fingerprints.
    pub fingerprinter: Arc<dyn MetadataFingerprinter>,
    /// Computes and searches content hashes.
    pub index: Arc<dyn ContentIndex>,
    /// Resolves volume ids.
    pub volumes: Arc<dyn VolumeManager>,
    /// Receives slow-operation durations.
    pub telemetry: Arc<dyn TelemetryRecorder>,
}

impl FinderCollaborators {
    /// Bundles collaborators, reporting telemetry through `metrics`.
    #[must_use]
    pub fn new(
        fingerprinter: Arc<dyn MetadataFingerprinter>,
        index: Arc<dyn ContentIndex>,
        volumes: Arc<dyn VolumeManager>,
    ) -> Self {
        Self {
            fingerprinter,
            index,
            volumes,
            telemetry: Arc::new(MetricsTelemetry::new()),
        }
    }

    /// Replaces the telemetry recorder.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetryRecorder>) -> Self {
        self.telemetry = telemetry;
        self
    }
}

/// Detects content duplicates: hash the entry, then search the cloud drive
/// volume for that hash.
///
/// The only destination with content-duplicate detection.
const SEARCHED_DESTINATION: Destination = Destination::CloudDrive;

/// Owns the session's [`HashCache`] and [`VolumeResolver`]; the rest is
/// composition.
pub struct DuplicateFinder {
    hasher: ContentHasher,
    search: DuplicateSearchClient,
}

impl DuplicateFinder {
    /// Builds a finder with a fresh cache sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the config is invalid.
    pub fn new(collaborators: FinderCollaborators, config: &DedupConfig) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(HashCache::new(config.cache_capacity)?);
        let volumes = Arc::new(VolumeResolver::new(
            collaborators.volumes,
            SEARCHED_DESTINATION.volume_type(),
        ));

        let hasher = ContentHasher::new(
            collaborators.fingerprinter,
            Arc::clone(&collaborators.index),
            cache,
            Arc::clone(&collaborators.telemetry),
        )
        .with_threshold(config.hash_threshold)
        .with_retain_failed(config.retain_failed_hashes);

        let search =
            DuplicateSearchClient::new(collaborators.index, volumes, collaborators.telemetry)
                .with_threshold(config.search_threshold);

        Ok(Self::from_parts(hasher, search))
    }

    /// Builds a finder from already-configured parts.
    #[must_use]
    pub const fn from_parts(hasher: ContentHasher, search: DuplicateSearchClient) -> Self {
        Self { hasher, search }
    }

    /// Returns the content hasher.
    #[must_use]
    pub const fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    /// Returns the URLs at the destination with the same content as `entry`.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing, volume resolution or search fails.
    #[instrument(skip(self, entry), fields(operation = "find_duplicates", url = %entry.url))]
    pub async fn find_duplicates(&self, entry: &FileEntry) -> Result<Vec<String>> {
        let hash = self.hasher.hash(entry).await?;
        self.search.find_by_hash(&hash).await
    }

    /// Returns true if a file with the same content exists at the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing, volume resolution or search fails.
    pub async fn is_duplicate(&self, entry: &FileEntry) -> Result<bool> {
        Ok(!self.find_duplicates(entry).await?.is_empty())
    }
}

#[async_trait]
impl ContentMatcher for DuplicateFinder {
    async fn is_duplicate(&self, entry: &FileEntry) -> Result<bool> {
        Self::is_duplicate(self, entry).await
    }
}
