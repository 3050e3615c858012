//! Observability and telemetry.
//!
//! Structured logging goes through `tracing`. Durations and counters go
//! through the `metrics` facade, optionally rendered by a Prometheus
//! recorder installed at startup.

mod logging;
mod metrics;
mod telemetry;

pub use logging::{LogFormat, LoggingConfig};
pub use metrics::{MetricsConfig, MetricsHandle, install_prometheus};
pub use telemetry::{
    DISPOSITION_CHECK_DURATION, LONG_COMPUTE_HASH, LONG_SEARCH_BY_HASH, MetricsTelemetry,
    NoopTelemetry, TelemetryRecorder,
};

use crate::config::ObservabilitySettings;
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Full observability configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

/// Options for initialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Whether verbose output was requested via CLI.
    pub verbose: bool,
    /// Whether a Prometheus recorder should be installed regardless of config.
    pub metrics: bool,
}

/// Handle for observability runtime components.
#[derive(Debug)]
pub struct ObservabilityHandle {
    metrics_handle: Option<MetricsHandle>,
}

impl ObservabilityHandle {
    /// Renders recorded metrics, if a recorder was installed.
    #[must_use]
    pub fn render_metrics(&self) -> Option<String> {
        self.metrics_handle.as_ref().map(MetricsHandle::render)
    }
}

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes observability from config settings with env overrides.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if any
/// component fails to initialize.
pub fn init_from_config(
    settings: Option<&ObservabilitySettings>,
    options: InitOptions,
) -> Result<ObservabilityHandle> {
    init(build_config(settings, options))
}

fn build_config(
    settings: Option<&ObservabilitySettings>,
    options: InitOptions,
) -> ObservabilityConfig {
    let logging = LoggingConfig::from_settings(
        settings.and_then(|cfg| cfg.logging.as_ref()),
        options.verbose,
    );
    let mut metrics = MetricsConfig::from_settings(settings.and_then(|cfg| cfg.metrics.as_ref()));
    metrics.enabled |= options.metrics;

    ObservabilityConfig { logging, metrics }
}

/// Initializes logging and metrics for the process.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if any
/// component fails to initialize.
pub fn init(config: ObservabilityConfig) -> Result<ObservabilityHandle> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "observability already initialized".to_string(),
        });
    }

    let metrics_handle = install_prometheus(&config.metrics)?;
    let filter = build_filter(&config.logging.filter);

    let (writer, ansi) = match &config.logging.file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    // Exactly one of the two layers is set.
    let (json, pretty) = match config.logging.format {
        LogFormat::Json => (
            Some(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(true)
                    .with_target(true),
            ),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(
                fmt::layer()
                    .pretty()
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .with_target(true),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(init_error)?;

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "failed to mark observability initialized".to_string(),
        })?;

    Ok(ObservabilityHandle { metrics_handle })
}

/// Parses a filter directive, falling back to `warn` when it is malformed.
fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid log filter '{directive}': {e}");
        EnvFilter::new("warn")
    })
}

/// Opens a log file for appending, creating parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_log_dir".to_string(),
            cause: e.to_string(),
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::OperationFailed {
            operation: "open_log_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })
}

fn init_error(err: impl std::fmt::Display) -> Error {
    Error::OperationFailed {
        operation: "observability_init".to_string(),
        cause: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_cli_flag_enables_metrics() {
        let config = build_config(
            None,
            InitOptions {
                verbose: false,
                metrics: true,
            },
        );
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_build_filter_falls_back_on_garbage() {
        // Must not panic.
        let _ = build_filter("import_dedup=[[[");
        let _ = build_filter("import_dedup=debug,info");
    }

    #[test]
    fn test_open_log_file_creates_parents() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dedup.log");
        let mut file = open_log_file(&path).unwrap();
        file.write_all(b"line\n").unwrap();
        drop(file);

        // Appends rather than truncating.
        let mut file = open_log_file(&path).unwrap();
        file.write_all(b"more\n").unwrap();
        drop(file);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line\nmore\n");
    }

    #[test]
    fn test_init_writes_json_lines_to_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("dedup.log");
        let config = ObservabilityConfig {
            logging: LoggingConfig {
                format: LogFormat::Json,
                filter: "info".to_string(),
                file: Some(path.clone()),
            },
            metrics: MetricsConfig::default(),
        };

        let handle = init(config.clone()).unwrap();
        assert!(handle.render_metrics().is_none());

        tracing::info!(volume_id = "drive-1", "json log line");

        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents
            .lines()
            .find(|l| l.contains("json log line"))
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["fields"]["volume_id"], "drive-1");

        assert!(matches!(init(config), Err(Error::OperationFailed { .. })));
    }
}
