//! `check` command: classify candidate imports.

use super::output::{CheckReport, OutputFormat, write_json, write_table};
use crate::config::DedupConfig;
use crate::models::{Destination, FileEntry, ScanMode, VolumeType};
use crate::services::deduplication::{DispositionChecker, FinderCollaborators};
use crate::storage::traits::HistoryLoader;
use crate::storage::{
    InMemoryHistoryLoader, JsonHistoryLoader, LocalContentIndex, SizeMtimeFingerprinter,
    StaticVolumeManager,
};
use crate::{Error, Result};
use futures::StreamExt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Volume id under which `--library` is indexed.
pub const LIBRARY_VOLUME_ID: &str = "library";

/// Files checked at once.
const DEFAULT_CONCURRENCY: usize = 8;

/// Inputs to the `check` command.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Candidate files.
    pub files: Vec<PathBuf>,
    /// Directory standing in for the destination volume.
    pub library: Option<PathBuf>,
    /// Import history snapshot.
    pub history: Option<PathBuf>,
    /// History-only or full scan.
    pub mode: ScanMode,
    /// Import destination.
    pub destination: Destination,
    /// Files checked at once.
    pub concurrency: usize,
}

impl CheckOptions {
    /// Creates options for a full scan of `files` to the cloud drive.
    #[must_use]
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            library: None,
            history: None,
            mode: ScanMode::Content,
            destination: Destination::CloudDrive,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the library directory.
    #[must_use]
    pub fn with_library(mut self, library: Option<PathBuf>) -> Self {
        self.library = library;
        self
    }

    /// Sets the history snapshot.
    #[must_use]
    pub fn with_history(mut self, history: Option<PathBuf>) -> Self {
        self.history = history;
        self
    }

    /// Sets the scan mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the destination.
    #[must_use]
    pub const fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }
}

/// Checks every file and returns one report per file, in input order.
///
/// Per-file failures are reported in the row, not returned.
///
/// # Errors
///
/// Returns an error if the config is invalid or the library cannot be
/// indexed.
pub async fn run_check(options: &CheckOptions, config: &DedupConfig) -> Result<Vec<CheckReport>> {
    let index = Arc::new(LocalContentIndex::new());
    if let Some(library) = &options.library {
        let indexed = index.index_directory(LIBRARY_VOLUME_ID, library).await?;
        tracing::info!(library = %library.display(), files = indexed, "Indexed library");
    }

    let history: Arc<dyn HistoryLoader> = match &options.history {
        Some(path) => Arc::new(JsonHistoryLoader::new(path)),
        None => Arc::new(InMemoryHistoryLoader::default()),
    };

    let collaborators = FinderCollaborators::new(
        Arc::new(SizeMtimeFingerprinter::new()),
        index,
        Arc::new(
            StaticVolumeManager::new().with_volume(VolumeType::CloudDrive, LIBRARY_VOLUME_ID),
        ),
    );
    let check = DispositionChecker::create_checker(history, collaborators, config)?;

    let reports = futures::stream::iter(options.files.iter())
        .map(|path| {
            let check = Arc::clone(&check);
            async move {
                let shown = path.display().to_string();
                let entry = match FileEntry::from_path(path).await {
                    Ok(entry) => entry,
                    Err(e) => return CheckReport::failed(shown, e),
                };
                match check(&entry, options.destination, options.mode).await {
                    Ok(disposition) => CheckReport::ok(shown, disposition),
                    Err(e) => CheckReport::failed(shown, e),
                }
            }
        })
        .buffered(options.concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    Ok(reports)
}

/// Executes the `check` command, writing reports to stdout.
///
/// # Errors
///
/// Returns an error if the check cannot start or output fails.
pub async fn cmd_check(
    options: &CheckOptions,
    config: &DedupConfig,
    format: OutputFormat,
) -> Result<Vec<CheckReport>> {
    let reports = run_check(options, config).await?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match format {
        OutputFormat::Table => write_table(&mut handle, &reports),
        OutputFormat::Json => write_json(&mut handle, &reports),
    }
    .map_err(|e| Error::OperationFailed {
        operation: "write_output".to_string(),
        cause: e.to_string(),
    })?;

    Ok(reports)
}
