//! In-memory import history.

use crate::Result;
use crate::models::{Destination, FileEntry};
use crate::storage::fingerprint::SizeMtimeFingerprinter;
use crate::storage::traits::{HistoryLoader, ImportHistory};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Fingerprint → destinations.
type HistoryTable = HashMap<String, HashSet<Destination>>;

/// Import history held in memory.
///
/// Entries are keyed by metadata fingerprint, so a file that was moved or
/// renamed after import is still recognised.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    copied: RwLock<HistoryTable>,
    imported: RwLock<HistoryTable>,
}

impl InMemoryHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that an entry was copied to a destination.
    pub fn mark_copied(&self, entry: &FileEntry, destination: Destination) {
        self.mark_copied_fingerprint(SizeMtimeFingerprinter::fingerprint_of(entry), destination);
    }

    /// Records that an entry was imported to a destination.
    pub fn mark_imported(&self, entry: &FileEntry, destination: Destination) {
        self.mark_imported_fingerprint(SizeMtimeFingerprinter::fingerprint_of(entry), destination);
    }

    /// Records a copy by pre-computed fingerprint.
    pub fn mark_copied_fingerprint(&self, fingerprint: String, destination: Destination) {
        insert(&self.copied, fingerprint, destination);
    }

    /// Records an import by pre-computed fingerprint.
    pub fn mark_imported_fingerprint(&self, fingerprint: String, destination: Destination) {
        insert(&self.imported, fingerprint, destination);
    }

    /// Returns the number of fingerprints with at least one recorded copy
    /// or import.
    #[must_use]
    pub fn len(&self) -> usize {
        let copied = self.copied.read().unwrap_or_else(PoisonError::into_inner);
        let imported = self.imported.read().unwrap_or_else(PoisonError::into_inner);
        copied
            .keys()
            .chain(imported.keys())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn insert(table: &RwLock<HistoryTable>, fingerprint: String, destination: Destination) {
    table
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(fingerprint)
        .or_default()
        .insert(destination);
}

fn contains(table: &RwLock<HistoryTable>, entry: &FileEntry, destination: Destination) -> bool {
    let fingerprint = SizeMtimeFingerprinter::fingerprint_of(entry);
    table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&fingerprint)
        .is_some_and(|destinations| destinations.contains(&destination))
}

#[async_trait]
impl ImportHistory for InMemoryHistory {
    async fn was_copied(&self, entry: &FileEntry, destination: Destination) -> Result<bool> {
        Ok(contains(&self.copied, entry, destination))
    }

    async fn was_imported(&self, entry: &FileEntry, destination: Destination) -> Result<bool> {
        Ok(contains(&self.imported, entry, destination))
    }
}

/// History loader over a shared [`InMemoryHistory`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoryLoader {
    history: Arc<InMemoryHistory>,
}

impl InMemoryHistoryLoader {
    /// Creates a loader serving the given history.
    #[must_use]
    pub const fn new(history: Arc<InMemoryHistory>) -> Self {
        Self { history }
    }

    /// Returns the underlying history for recording.
    #[must_use]
    pub fn inner(&self) -> &Arc<InMemoryHistory> {
        &self.history
    }
}

#[async_trait]
impl HistoryLoader for InMemoryHistoryLoader {
    async fn history(&self) -> Result<Arc<dyn ImportHistory>> {
        let history: Arc<dyn ImportHistory> = self.history.clone();
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copied_per_destination() {
        let history = InMemoryHistory::new();
        let entry = FileEntry::new("file:///a.jpg", 10, 1000);

        history.mark_copied(&entry, Destination::CloudDrive);

        assert!(history.was_copied(&entry, Destination::CloudDrive).await.unwrap());
        assert!(!history.was_copied(&entry, Destination::LocalFolder).await.unwrap());
        assert!(!history.was_imported(&entry, Destination::CloudDrive).await.unwrap());
    }

    #[tokio::test]
    async fn test_keyed_by_fingerprint_not_url() {
        let history = InMemoryHistory::new();
        let original = FileEntry::new("file:///card/a.jpg", 10, 1000);
        let renamed = FileEntry::new("file:///card/renamed.jpg", 10, 1000);
        let edited = FileEntry::new("file:///card/a.jpg", 11, 2000);

        history.mark_imported(&original, Destination::CloudDrive);

        assert!(history.was_imported(&renamed, Destination::CloudDrive).await.unwrap());
        assert!(!history.was_imported(&edited, Destination::CloudDrive).await.unwrap());
    }

    #[test]
    fn test_len_counts_distinct_fingerprints() {
        let history = InMemoryHistory::new();
        assert!(history.is_empty());

        history.mark_copied_fingerprint("1000_10".to_string(), Destination::CloudDrive);
        history.mark_imported_fingerprint("1000_10".to_string(), Destination::CloudDrive);
        history.mark_imported_fingerprint("2000_20".to_string(), Destination::CloudDrive);

        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_loader_shares_history() {
        let loader = InMemoryHistoryLoader::default();
        let entry = FileEntry::new("u1", 1, 1);

        loader.inner().mark_copied(&entry, Destination::CloudDrive);

        let snapshot = loader.history().await.unwrap();
        assert!(snapshot.was_copied(&entry, Destination::CloudDrive).await.unwrap());
    }
}
