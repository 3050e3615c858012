//! Local content index.
//!
//! Hashes files on local disk with SHA-256 and keeps an in-memory,
//! per-volume table of digest → URLs.
//!
//! # Example
//!
//! ```rust,ignore
//! use import_dedup::storage::LocalContentIndex;
//!
//! let index = LocalContentIndex::new();
//! let indexed = index.index_directory("drive:me", Path::new("/mnt/drive")).await?;
//! ```

use crate::models::{FileEntry, path_to_url};
use crate::storage::traits::{ContentIndex, HashMatches};
use crate::{Error, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::io::AsyncReadExt;
use walkdir::WalkDir;

/// Read buffer size for hashing.
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Digest → URLs, per volume.
type VolumeTable = HashMap<String, HashMap<String, Vec<String>>>;

/// Content index over local files.
#[derive(Debug, Default)]
pub struct LocalContentIndex {
    volumes: RwLock<VolumeTable>,
}

impl LocalContentIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `url` in `volume_id` has content digest `hash`.
    pub fn insert(&self, volume_id: &str, hash: impl Into<String>, url: impl Into<String>) {
        let url = url.into();
        let mut volumes = self.volumes.write().unwrap_or_else(PoisonError::into_inner);
        let urls = volumes
            .entry(volume_id.to_string())
            .or_default()
            .entry(hash.into())
            .or_default();
        if !urls.contains(&url) {
            urls.push(url);
        }
    }

    /// Returns the number of distinct digests indexed for a volume.
    #[must_use]
    pub fn hash_count(&self, volume_id: &str) -> usize {
        self.volumes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(volume_id)
            .map_or(0, HashMap::len)
    }

    /// Computes the SHA-256 hex digest of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(path: &Path) -> Result<String> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| io_error("open_content_file", path, &e))?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .map_err(|e| io_error("read_content_file", path, &e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Hashes every regular file under `root` into `volume_id`.
    ///
    /// Files that cannot be read are skipped with a warning.
    ///
    /// Returns the number of files indexed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory walk cannot be started.
    #[tracing::instrument(skip(self), fields(operation = "index_directory"))]
    pub async fn index_directory(&self, volume_id: &str, root: &Path) -> Result<usize> {
        let walk_root = root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_files(&walk_root))
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "walk_library".to_string(),
                cause: e.to_string(),
            })?;

        let mut indexed = 0usize;
        for path in files {
            match Self::hash_file(&path).await {
                Ok(hash) => {
                    self.insert(volume_id, hash, path_to_url(&path));
                    indexed += 1;
                },
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Skipping unreadable file");
                },
            }
        }

        tracing::debug!(indexed = indexed, volume_id = %volume_id, "Indexed library");
        Ok(indexed)
    }
}

#[async_trait]
impl ContentIndex for LocalContentIndex {
    async fn compute_hash(&self, entry: &FileEntry) -> Result<String> {
        let Some(path) = entry.path.as_deref() else {
            return Err(Error::InvalidInput(format!(
                "entry has no local path: {}",
                entry.url
            )));
        };
        Self::hash_file(path).await
    }

    async fn search_by_hashes(&self, volume_id: &str, hashes: &[String]) -> Result<HashMatches> {
        let volumes = self.volumes.read().unwrap_or_else(PoisonError::into_inner);
        let Some(table) = volumes.get(volume_id) else {
            return Ok(HashMatches::new());
        };

        Ok(hashes
            .iter()
            .map(|hash| (hash.clone(), table.get(hash).cloned().unwrap_or_default()))
            .collect())
    }
}

/// Lists regular files under `root`, skipping entries that cannot be read.
fn collect_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping directory entry");
                None
            },
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn io_error(operation: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("{}: {e}", path.display()),
    }
}
