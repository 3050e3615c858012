//! `hash` command: show fingerprints and content hashes.

use crate::config::DedupConfig;
use crate::models::FileEntry;
use crate::observability::MetricsTelemetry;
use crate::services::deduplication::{ContentHasher, HashCache};
use crate::storage::traits::MetadataFingerprinter;
use crate::storage::{LocalContentIndex, SizeMtimeFingerprinter};
use crate::{Error, Result};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Fingerprint and hash of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashReport {
    /// `file://` URL of the file.
    pub url: String,
    /// Metadata fingerprint.
    pub fingerprint: String,
    /// SHA-256 content hash.
    pub hash: String,
}

/// Hashes each file.
///
/// # Errors
///
/// Returns the first failure to read metadata or content.
pub async fn run_hash(files: &[PathBuf], config: &DedupConfig) -> Result<Vec<HashReport>> {
    config.validate()?;
    let fingerprinter = Arc::new(SizeMtimeFingerprinter::new());
    let hasher = ContentHasher::new(
        Arc::clone(&fingerprinter) as Arc<dyn MetadataFingerprinter>,
        Arc::new(LocalContentIndex::new()),
        Arc::new(HashCache::new(config.cache_capacity)?),
        Arc::new(MetricsTelemetry::new()),
    )
    .with_threshold(config.hash_threshold);

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let entry = FileEntry::from_path(path).await?;
        let fingerprint = fingerprinter.fingerprint(&entry).await?;
        let hash = hasher.hash(&entry).await?;
        reports.push(HashReport {
            url: entry.url,
            fingerprint,
            hash,
        });
    }
    Ok(reports)
}

/// Executes the `hash` command, writing one line per file to stdout.
///
/// # Errors
///
/// Returns an error if hashing or output fails.
pub async fn cmd_hash(files: &[PathBuf], config: &DedupConfig) -> Result<()> {
    let reports = run_hash(files, config).await?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for report in &reports {
        writeln!(handle, "{}  {}  {}", report.hash, report.fingerprint, report.url).map_err(
            |e| Error::OperationFailed {
                operation: "write_output".to_string(),
                cause: e.to_string(),
            },
        )?;
    }
    Ok(())
}
