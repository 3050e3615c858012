//! Content hashing with per-version memoization.

use super::cache::{CacheKey, HashCache, HashResult};
use crate::models::FileEntry;
use crate::observability::{LONG_COMPUTE_HASH, TelemetryRecorder};
use crate::storage::traits::{ContentIndex, MetadataFingerprinter};
use crate::{Error, Result};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

/// Computes content hashes, sharing one computation per file version.
///
/// The cache key is the entry's metadata fingerprint joined with its URL.
/// On a miss the hash is computed on a spawned task whose handle is stored
/// before it settles, so concurrent callers for the same key all await the
/// same task.
pub struct ContentHasher {
    fingerprinter: Arc<dyn MetadataFingerprinter>,
    index: Arc<dyn ContentIndex>,
    cache: Arc<HashCache>,
    telemetry: Arc<dyn TelemetryRecorder>,
    threshold: Duration,
    retain_failed: bool,
}

impl ContentHasher {
    /// Creates a hasher over the given collaborators and cache.
    #[must_use]
    pub fn new(
        fingerprinter: Arc<dyn MetadataFingerprinter>,
        index: Arc<dyn ContentIndex>,
        cache: Arc<HashCache>,
        telemetry: Arc<dyn TelemetryRecorder>,
    ) -> Self {
        Self {
            fingerprinter,
            index,
            cache,
            telemetry,
            threshold: Duration::from_millis(crate::config::DEFAULT_HASH_THRESHOLD_MS),
            retain_failed: false,
        }
    }

    /// Sets the duration at or above which a computation is reported as slow.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Keeps failed computations cached until evicted.
    #[must_use]
    pub const fn with_retain_failed(mut self, retain: bool) -> Self {
        self.retain_failed = retain;
        self
    }

    /// Returns the cache backing this hasher.
    #[must_use]
    pub fn cache(&self) -> &Arc<HashCache> {
        &self.cache
    }

    /// Builds the cache key for an entry.
    ///
    /// # Errors
    ///
    /// Returns the fingerprinter's error.
    pub async fn cache_key(&self, entry: &FileEntry) -> Result<CacheKey> {
        let fingerprint = self.fingerprinter.fingerprint(entry).await?;
        Ok(CacheKey::new(&fingerprint, &entry.url))
    }

    /// Returns the shared handle to the entry's hash computation.
    ///
    /// Starts the computation if no handle is cached for the entry's
    /// current version.
    ///
    /// # Errors
    ///
    /// Returns the fingerprinter's error. Hash failures are carried by the
    /// returned handle.
    #[instrument(skip(self, entry), fields(operation = "hash_handle", url = %entry.url))]
    pub async fn hash_handle(&self, entry: &FileEntry) -> Result<HashResult> {
        let key = self.cache_key(entry).await?;

        let (handle, started) = self
            .cache
            .get_or_insert_with(key.clone(), |generation| self.spawn(entry, key, generation));

        let result = if started { "miss" } else { "hit" };
        metrics::counter!("hash_cache_lookups_total", "result" => result).increment(1);
        if !started {
            tracing::debug!(url = %entry.url, "Hash cache hit");
        }

        Ok(handle)
    }

    /// Returns the content hash of the entry.
    ///
    /// # Errors
    ///
    /// Returns the fingerprinter's error, or [`Error::HashFailed`] if the
    /// content index cannot compute the digest.
    pub async fn hash(&self, entry: &FileEntry) -> Result<String> {
        self.hash_handle(entry).await?.await
    }

    fn spawn(&self, entry: &FileEntry, key: CacheKey, generation: u64) -> HashResult {
        let eviction = (!self.retain_failed).then(|| Eviction {
            cache: Arc::clone(&self.cache),
            key,
            generation,
        });
        let job = HashJob {
            index: Arc::clone(&self.index),
            telemetry: Arc::clone(&self.telemetry),
            threshold: self.threshold,
            eviction: eviction.clone(),
            entry: entry.clone(),
        };
        let url = entry.url.clone();
        let task = tokio::spawn(job.run());

        async move {
            // A panicking backend aborts the job before its own cleanup runs.
            task.await.unwrap_or_else(|e| {
                tracing::warn!(url = %url, error = %e, "Content hash task aborted");
                if let Some(eviction) = &eviction {
                    eviction.evict();
                }
                Err(Error::HashFailed {
                    url,
                    cause: e.to_string(),
                })
            })
        }
        .boxed()
        .shared()
    }
}

/// Cache slot to drop when its computation fails.
#[derive(Clone)]
struct Eviction {
    cache: Arc<HashCache>,
    key: CacheKey,
    generation: u64,
}

impl Eviction {
    fn evict(&self) {
        self.cache.remove_generation(&self.key, self.generation);
    }
}

/// State moved into the spawned hash task.
struct HashJob {
    index: Arc<dyn ContentIndex>,
    telemetry: Arc<dyn TelemetryRecorder>,
    threshold: Duration,
    eviction: Option<Eviction>,
    entry: FileEntry,
}

impl HashJob {
    async fn run(self) -> Result<String> {
        let start = Instant::now();
        let result = self
            .index
            .compute_hash(&self.entry)
            .await
            .map_err(|e| into_hash_failed(&self.entry, e));
        let elapsed = start.elapsed();

        if elapsed >= self.threshold {
            tracing::info!(
                url = %self.entry.url,
                elapsed_ms = elapsed.as_millis(),
                "Content hash computation was slow"
            );
            self.telemetry.record_duration(LONG_COMPUTE_HASH, elapsed);
        }

        if let Err(e) = &result {
            tracing::warn!(url = %self.entry.url, error = %e, "Content hash failed");
            if let Some(eviction) = &self.eviction {
                eviction.evict();
            }
        }

        result
    }
}

fn into_hash_failed(entry: &FileEntry, err: Error) -> Error {
    match err {
        e @ Error::HashFailed { .. } => e,
        other => Error::HashFailed {
            url: entry.url.clone(),
            cause: other.to_string(),
        },
    }
}
