//! Read-only JSON history snapshot.
//!
//! ```json
//! {
//!   "copied":   [{ "fingerprint": "1700000000000_2048", "destination": "cloud-drive" }],
//!   "imported": [{ "fingerprint": "1700000001000_4096", "destination": "cloud-drive" }]
//! }
//! ```
//!
//! The snapshot is loaded once on first use and shared for the rest of the
//! session.

use super::memory::InMemoryHistory;
use crate::models::Destination;
use crate::storage::traits::{HistoryLoader, ImportHistory};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Maximum snapshot size (64MB).
/// Prevents memory exhaustion from a corrupt or hostile file.
const MAX_SNAPSHOT_SIZE: u64 = 64 * 1024 * 1024;

/// One recorded copy or import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Metadata fingerprint of the entry.
    pub fingerprint: String,
    /// Where it went.
    pub destination: Destination,
}

/// On-disk snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySnapshotFile {
    /// Entries copied to a destination.
    #[serde(default)]
    pub copied: Vec<HistoryRecord>,
    /// Entries imported to a destination.
    #[serde(default)]
    pub imported: Vec<HistoryRecord>,
}

impl HistorySnapshotFile {
    fn into_history(self) -> InMemoryHistory {
        let history = InMemoryHistory::new();
        for record in self.copied {
            history.mark_copied_fingerprint(record.fingerprint, record.destination);
        }
        for record in self.imported {
            history.mark_imported_fingerprint(record.fingerprint, record.destination);
        }
        history
    }
}

/// History loader reading a JSON snapshot file.
#[derive(Debug)]
pub struct JsonHistoryLoader {
    path: PathBuf,
    snapshot: OnceCell<Arc<InMemoryHistory>>,
}

impl JsonHistoryLoader {
    /// Creates a loader for the given snapshot path.
    ///
    /// Nothing is read until the first [`HistoryLoader::history`] call.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: OnceCell::new(),
        }
    }

    /// Returns the snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Arc<InMemoryHistory>> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| unavailable(&self.path, &e))?;

        if metadata.len() > MAX_SNAPSHOT_SIZE {
            return Err(Error::HistoryUnavailable(format!(
                "{}: snapshot exceeds maximum size of {MAX_SNAPSHOT_SIZE} bytes",
                self.path.display()
            )));
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| unavailable(&self.path, &e))?;

        let file: HistorySnapshotFile =
            serde_json::from_str(&contents).map_err(|e| unavailable(&self.path, &e))?;

        tracing::debug!(
            path = %self.path.display(),
            copied = file.copied.len(),
            imported = file.imported.len(),
            "Loaded history snapshot"
        );

        Ok(Arc::new(file.into_history()))
    }
}

#[async_trait]
impl HistoryLoader for JsonHistoryLoader {
    async fn history(&self) -> Result<Arc<dyn ImportHistory>> {
        let snapshot: Arc<dyn ImportHistory> =
            self.snapshot.get_or_try_init(|| self.load()).await?.clone();
        Ok(snapshot)
    }
}

fn unavailable(path: &Path, e: &impl std::fmt::Display) -> Error {
    Error::HistoryUnavailable(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileEntry;
    use std::fs;

    #[tokio::test]
    async fn test_load_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"{
                "copied": [{"fingerprint": "1000_10", "destination": "cloud-drive"}],
                "imported": [{"fingerprint": "2000_20", "destination": "local-folder"}]
            }"#,
        )
        .unwrap();

        let loader = JsonHistoryLoader::new(&path);
        let history = loader.history().await.unwrap();

        let copied = FileEntry::new("u1", 10, 1000);
        let imported = FileEntry::new("u2", 20, 2000);
        assert!(history.was_copied(&copied, Destination::CloudDrive).await.unwrap());
        assert!(history.was_imported(&imported, Destination::LocalFolder).await.unwrap());
        assert!(!history.was_imported(&imported, Destination::CloudDrive).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_sections_default_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{}").unwrap();

        let history = JsonHistoryLoader::new(&path).history().await.unwrap();
        let entry = FileEntry::new("u1", 10, 1000);
        assert!(!history.was_copied(&entry, Destination::CloudDrive).await.unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{}").unwrap();

        let loader = JsonHistoryLoader::new(&path);
        loader.history().await.unwrap();

        // Later edits are not observed within the session.
        fs::write(
            &path,
            r#"{"copied": [{"fingerprint": "1000_10", "destination": "cloud-drive"}]}"#,
        )
        .unwrap();

        let history = loader.history().await.unwrap();
        let entry = FileEntry::new("u1", 10, 1000);
        assert!(!history.was_copied(&entry, Destination::CloudDrive).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_history_unavailable() {
        let loader = JsonHistoryLoader::new("/no/such/history.json");
        let result = loader.history().await;
        assert!(matches!(result, Err(Error::HistoryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_malformed_file_is_history_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();

        let result = JsonHistoryLoader::new(&path).history().await;
        assert!(matches!(result, Err(Error::HistoryUnavailable(_))));
    }
}
