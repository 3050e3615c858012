//! File entries being considered for import.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// A file being considered for import.
///
/// The URL is the entry's identity. Size and modification time are the
/// mutable metadata used to detect that the file may have changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    /// Identity of the entry (e.g. `file:///media/card/IMG_0001.JPG`).
    pub url: String,
    /// Local path, when the entry is backed by a readable file.
    pub path: Option<PathBuf>,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time (Unix epoch milliseconds).
    pub modified_ms: i64,
}

impl FileEntry {
    /// Creates an entry from explicit metadata, without a local path.
    #[must_use]
    pub fn new(url: impl Into<String>, size: u64, modified_ms: i64) -> Self {
        Self {
            url: url.into(),
            path: None,
            size,
            modified_ms,
        }
    }

    /// Sets the local path backing this entry.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Builds an entry from a file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved or is not a regular file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = tokio::fs::canonicalize(path.as_ref())
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "resolve_entry_path".to_string(),
                cause: format!("{}: {e}", path.as_ref().display()),
            })?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "read_entry_metadata".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        let modified_ms = metadata.modified().map_or(0, system_time_to_millis);

        Ok(Self {
            url: path_to_url(&path),
            path: Some(path),
            size: metadata.len(),
            modified_ms,
        })
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Converts an absolute path to a `file://` URL.
#[must_use]
pub fn path_to_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[allow(clippy::cast_possible_truncation)]
fn system_time_to_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
