//! Three-way classification of a candidate import.

use super::finder::{ContentMatcher, DuplicateFinder, FinderCollaborators};
use crate::config::DedupConfig;
use crate::models::{Destination, Disposition, FileEntry, ScanMode};
use crate::observability::DISPOSITION_CHECK_DURATION;
use crate::storage::traits::HistoryLoader;
use crate::{Error, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::instrument;

/// A standalone disposition capability, detached from its checker.
pub type CheckerFn = Arc<
    dyn Fn(&FileEntry, Destination, ScanMode) -> BoxFuture<'static, Result<Disposition>>
        + Send
        + Sync,
>;

/// Combines import history with content matching.
///
/// # Evaluation order
///
/// 1. Reject destinations without duplicate detection (no I/O).
/// 2. Load the history snapshot; query copied and imported concurrently.
/// 3. Either hit → [`Disposition::HistoryDuplicate`], content is not hashed.
/// 4. History-only scan → [`Disposition::Original`].
/// 5. Otherwise ask the content matcher.
///
/// Any collaborator failure fails the whole determination.
pub struct DispositionChecker {
    history: Arc<dyn HistoryLoader>,
    matcher: Arc<dyn ContentMatcher>,
}

impl DispositionChecker {
    /// Creates a checker over a history source and a content matcher.
    #[must_use]
    pub fn new(history: Arc<dyn HistoryLoader>, matcher: Arc<dyn ContentMatcher>) -> Self {
        Self { history, matcher }
    }

    /// Builds a checker owning a fresh [`DuplicateFinder`] and returns its
    /// [`Self::get_disposition`] as a [`CheckerFn`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the config is invalid.
    pub fn create_checker(
        history: Arc<dyn HistoryLoader>,
        collaborators: FinderCollaborators,
        config: &DedupConfig,
    ) -> Result<CheckerFn> {
        let finder = DuplicateFinder::new(collaborators, config)?;
        let checker = Arc::new(Self::new(history, Arc::new(finder)));
        Ok(checker.into_checker_fn())
    }

    /// Converts a shared checker into a [`CheckerFn`].
    #[must_use]
    pub fn into_checker_fn(self: Arc<Self>) -> CheckerFn {
        Arc::new(move |entry: &FileEntry, destination: Destination, mode: ScanMode| {
            let checker = Arc::clone(&self);
            let entry = entry.clone();
            async move { checker.get_disposition(&entry, destination, mode).await }.boxed()
        })
    }

    /// Classifies `entry` for import to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDestination`] before any I/O if the
    /// destination has no duplicate detection, [`Error::HistoryUnavailable`]
    /// if history cannot be loaded or queried, or the content matcher's error.
    #[instrument(
        skip(self, entry),
        fields(
            operation = "get_disposition",
            url = %entry.url,
            destination = %destination,
            mode = mode.as_str()
        )
    )]
    pub async fn get_disposition(
        &self,
        entry: &FileEntry,
        destination: Destination,
        mode: ScanMode,
    ) -> Result<Disposition> {
        if !destination.supports_content_dedup() {
            return Err(Error::UnsupportedDestination(destination));
        }

        let start = Instant::now();
        let disposition = self.classify(entry, destination, mode).await;
        let elapsed = start.elapsed();

        match &disposition {
            Ok(d) => {
                tracing::info!(
                    disposition = d.as_str(),
                    elapsed_ms = elapsed.as_millis(),
                    "Disposition determined"
                );
                metrics::counter!("disposition_checks_total", "disposition" => d.as_str())
                    .increment(1);
            },
            Err(e) => {
                tracing::warn!(error = %e, "Disposition check failed");
                metrics::counter!("disposition_checks_total", "disposition" => "error")
                    .increment(1);
            },
        }
        #[allow(clippy::cast_precision_loss)]
        let elapsed_ms = elapsed.as_millis() as f64;
        metrics::histogram!(DISPOSITION_CHECK_DURATION).record(elapsed_ms);

        disposition
    }

    async fn classify(
        &self,
        entry: &FileEntry,
        destination: Destination,
        mode: ScanMode,
    ) -> Result<Disposition> {
        if self.has_history_duplicate(entry, destination).await? {
            tracing::debug!("History match, skipping content check");
            return Ok(Disposition::HistoryDuplicate);
        }

        if mode == ScanMode::History {
            return Ok(Disposition::Original);
        }

        if self.matcher.is_duplicate(entry).await? {
            Ok(Disposition::ContentDuplicate)
        } else {
            Ok(Disposition::Original)
        }
    }

    async fn has_history_duplicate(
        &self,
        entry: &FileEntry,
        destination: Destination,
    ) -> Result<bool> {
        let history = self.history.history().await.map_err(history_unavailable)?;

        let (copied, imported) = tokio::try_join!(
            history.was_copied(entry, destination),
            history.was_imported(entry, destination),
        )
        .map_err(history_unavailable)?;

        Ok(copied || imported)
    }
}

fn history_unavailable(err: Error) -> Error {
    match err {
        e @ Error::HistoryUnavailable(_) => e,
        other => Error::HistoryUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VolumeType;
    use crate::observability::NoopTelemetry;
    use crate::storage::traits::{
        ContentIndex, HashMatches, ImportHistory, MetadataFingerprinter, VolumeManager,
    };
    use crate::storage::{InMemoryHistory, InMemoryHistoryLoader, StaticVolumeManager};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_case::test_case;

    /// Content matcher returning a fixed answer and counting calls.
    struct FixedMatcher {
        duplicate: bool,
        calls: AtomicUsize,
    }

    impl FixedMatcher {
        fn new(duplicate: bool) -> Arc<Self> {
            Arc::new(Self {
                duplicate,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentMatcher for FixedMatcher {
        async fn is_duplicate(&self, _entry: &FileEntry) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.duplicate)
        }
    }

    /// History loader that counts calls and can fail.
    struct CountingLoader {
        inner: InMemoryHistoryLoader,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingLoader {
        fn new(history: InMemoryHistory) -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryHistoryLoader::new(Arc::new(history)),
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryHistoryLoader::default(),
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl HistoryLoader for CountingLoader {
        async fn history(&self) -> Result<Arc<dyn ImportHistory>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::OperationFailed {
                    operation: "load_history".to_string(),
                    cause: "corrupt".to_string(),
                });
            }
            self.inner.history().await
        }
    }

    fn entry() -> FileEntry {
        FileEntry::new("file:///card/IMG_0001.JPG", 2048, 1_700_000_000_000)
    }

    fn history(copied: bool, imported: bool) -> InMemoryHistory {
        let history = InMemoryHistory::new();
        if copied {
            history.mark_copied(&entry(), Destination::CloudDrive);
        }
        if imported {
            history.mark_imported(&entry(), Destination::CloudDrive);
        }
        history
    }

    #[test_case(true, false, ScanMode::Content, false => Disposition::HistoryDuplicate; "copied")]
    #[test_case(false, true, ScanMode::Content, false => Disposition::HistoryDuplicate; "imported")]
    #[test_case(true, true, ScanMode::History, true => Disposition::HistoryDuplicate; "both in history mode")]
    #[test_case(false, false, ScanMode::History, true => Disposition::Original; "history mode no match")]
    #[test_case(false, false, ScanMode::Content, true => Disposition::ContentDuplicate; "content match")]
    #[test_case(false, false, ScanMode::Content, false => Disposition::Original; "no match anywhere")]
    #[tokio::test]
    async fn test_disposition_table(
        copied: bool,
        imported: bool,
        mode: ScanMode,
        content_duplicate: bool,
    ) -> Disposition {
        let loader = CountingLoader::new(history(copied, imported));
        let matcher = FixedMatcher::new(content_duplicate);
        let checker = DispositionChecker::new(loader, Arc::clone(&matcher) as Arc<dyn ContentMatcher>);

        let disposition = checker
            .get_disposition(&entry(), Destination::CloudDrive, mode)
            .await
            .unwrap();

        // Content is only consulted when history is clean and the scan is full.
        let expect_content_call = !copied && !imported && mode == ScanMode::Content;
        assert_eq!(matcher.calls(), usize::from(expect_content_call));
        disposition
    }

    #[tokio::test]
    async fn test_history_for_other_destination_is_ignored() {
        let history = InMemoryHistory::new();
        history.mark_imported(&entry(), Destination::LocalFolder);
        let checker = DispositionChecker::new(
            CountingLoader::new(history),
            FixedMatcher::new(false),
        );

        let disposition = checker
            .get_disposition(&entry(), Destination::CloudDrive, ScanMode::History)
            .await
            .unwrap();
        assert_eq!(disposition, Disposition::Original);
    }

    #[tokio::test]
    async fn test_unsupported_destination_touches_nothing() {
        let loader = CountingLoader::new(InMemoryHistory::new());
        let matcher = FixedMatcher::new(true);
        let checker = DispositionChecker::new(
            Arc::clone(&loader) as Arc<dyn HistoryLoader>,
            Arc::clone(&matcher) as Arc<dyn ContentMatcher>,
        );

        let result = checker
            .get_disposition(&entry(), Destination::LocalFolder, ScanMode::Content)
            .await;

        assert!(matches!(
            result,
            Err(Error::UnsupportedDestination(Destination::LocalFolder))
        ));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(matcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_history_failure_aborts_check() {
        let matcher = FixedMatcher::new(true);
        let checker = DispositionChecker::new(
            CountingLoader::failing(),
            Arc::clone(&matcher) as Arc<dyn ContentMatcher>,
        );

        let result = checker
            .get_disposition(&entry(), Destination::CloudDrive, ScanMode::Content)
            .await;

        assert!(matches!(result, Err(Error::HistoryUnavailable(_))));
        assert_eq!(matcher.calls(), 0);
    }

    struct F1Fingerprint;

    #[async_trait]
    impl MetadataFingerprinter for F1Fingerprint {
        async fn fingerprint(&self, _entry: &FileEntry) -> Result<String> {
            Ok("f1".to_string())
        }
    }

    struct H1Index {
        results: HashMatches,
        hashes: AtomicUsize,
    }

    #[async_trait]
    impl ContentIndex for H1Index {
        async fn compute_hash(&self, _entry: &FileEntry) -> Result<String> {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            Ok("h1".to_string())
        }

        async fn search_by_hashes(&self, _: &str, _: &[String]) -> Result<HashMatches> {
            Ok(self.results.clone())
        }
    }

    fn collaborators(index: &Arc<H1Index>) -> FinderCollaborators {
        let volumes: Arc<dyn VolumeManager> =
            Arc::new(StaticVolumeManager::new().with_volume(VolumeType::CloudDrive, "drive-1"));
        FinderCollaborators::new(
            Arc::new(F1Fingerprint),
            Arc::clone(index) as Arc<dyn ContentIndex>,
            volumes,
        )
        .with_telemetry(Arc::new(NoopTelemetry))
    }

    #[test_case(&["u2"] => Disposition::ContentDuplicate; "match elsewhere")]
    #[test_case(&[] => Disposition::Original; "empty match list")]
    #[tokio::test]
    async fn test_create_checker_end_to_end(urls: &[&str]) -> Disposition {
        let index = Arc::new(H1Index {
            results: HashMatches::from([(
                "h1".to_string(),
                urls.iter().map(ToString::to_string).collect(),
            )]),
            hashes: AtomicUsize::new(0),
        });
        let check = DispositionChecker::create_checker(
            Arc::new(InMemoryHistoryLoader::default()),
            collaborators(&index),
            &DedupConfig::default(),
        )
        .unwrap();

        let disposition = check(
            &FileEntry::new("u1", 1, 1),
            Destination::CloudDrive,
            ScanMode::Content,
        )
        .await
        .unwrap();
        assert_eq!(index.hashes.load(Ordering::SeqCst), 1);
        disposition
    }

    #[tokio::test]
    async fn test_history_duplicate_never_hashes() {
        let index = Arc::new(H1Index {
            results: HashMatches::new(),
            hashes: AtomicUsize::new(0),
        });
        let loader = InMemoryHistoryLoader::default();
        let candidate = FileEntry::new("u1", 1, 1);
        loader
            .inner()
            .mark_copied(&candidate, Destination::CloudDrive);

        let check = DispositionChecker::create_checker(
            Arc::new(loader),
            collaborators(&index),
            &DedupConfig::default(),
        )
        .unwrap();

        let disposition = check(&candidate, Destination::CloudDrive, ScanMode::Content)
            .await
            .unwrap();
        assert_eq!(disposition, Disposition::HistoryDuplicate);
        assert_eq!(index.hashes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_checkers_do_not_share_caches() {
        let index = Arc::new(H1Index {
            results: HashMatches::new(),
            hashes: AtomicUsize::new(0),
        });
        let first = DispositionChecker::create_checker(
            Arc::new(InMemoryHistoryLoader::default()),
            collaborators(&index),
            &DedupConfig::default(),
        )
        .unwrap();
        let second = DispositionChecker::create_checker(
            Arc::new(InMemoryHistoryLoader::default()),
            collaborators(&index),
            &DedupConfig::default(),
        )
        .unwrap();
        let candidate = FileEntry::new("u1", 1, 1);

        first(&candidate, Destination::CloudDrive, ScanMode::Content)
            .await
            .unwrap();
        first(&candidate, Destination::CloudDrive, ScanMode::Content)
            .await
            .unwrap();
        second(&candidate, Destination::CloudDrive, ScanMode::Content)
            .await
            .unwrap();

        assert_eq!(index.hashes.load(Ordering::SeqCst), 2);
    }
}
