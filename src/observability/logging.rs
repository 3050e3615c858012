//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a log format, defaulting to pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive string (e.g. `import_dedup=debug,info`).
    pub filter: String,
    /// Optional log file; logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    ///
    /// Filter precedence: `IMPORT_DEDUP_LOG` > `RUST_LOG` > settings >
    /// `debug` when verbose, `info` otherwise.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        let default_filter = if verbose { "debug" } else { "info" };

        let filter = std::env::var("IMPORT_DEDUP_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .or_else(|| settings.and_then(|s| s.filter.clone()))
            .unwrap_or_else(|| default_filter.to_string());

        let format = std::env::var("IMPORT_DEDUP_LOG_FORMAT")
            .ok()
            .or_else(|| settings.and_then(|s| s.format.clone()))
            .map_or(LogFormat::Pretty, |f| LogFormat::parse(&f));

        let file = std::env::var("IMPORT_DEDUP_LOG_FILE")
            .ok()
            .or_else(|| settings.and_then(|s| s.file.clone()))
            .map(PathBuf::from);

        Self {
            format,
            filter,
            file,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".to_string(),
            file: None,
        }
    }
}
