//! Configuration management.
//!
//! Precedence, highest first: CLI flags, `IMPORT_DEDUP_*` environment
//! variables, the TOML config file, built-in defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of hash results kept in the session cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Hash computations at or above this many milliseconds are reported.
pub const DEFAULT_HASH_THRESHOLD_MS: u64 = 5_000;

/// Search-by-hash calls at or above this many milliseconds are reported.
pub const DEFAULT_SEARCH_THRESHOLD_MS: u64 = 1_000;

/// Duplicate-detection tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupConfig {
    /// Maximum entries in the hash cache.
    pub cache_capacity: usize,
    /// Slow-hash reporting threshold.
    pub hash_threshold: Duration,
    /// Slow-search reporting threshold.
    pub search_threshold: Duration,
    /// Keep failed hash results cached for the rest of the session.
    ///
    /// When false, a failed computation is evicted so the next request for
    /// the same key retries.
    pub retain_failed_hashes: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            hash_threshold: Duration::from_millis(DEFAULT_HASH_THRESHOLD_MS),
            search_threshold: Duration::from_millis(DEFAULT_SEARCH_THRESHOLD_MS),
            retain_failed_hashes: false,
        }
    }
}

impl DedupConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `IMPORT_DEDUP_*` environment overrides.
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = parse_env::<usize>("IMPORT_DEDUP_CACHE_CAPACITY") {
            self.cache_capacity = v;
        }
        if let Some(v) = parse_env::<u64>("IMPORT_DEDUP_HASH_THRESHOLD_MS") {
            self.hash_threshold = Duration::from_millis(v);
        }
        if let Some(v) = parse_env::<u64>("IMPORT_DEDUP_SEARCH_THRESHOLD_MS") {
            self.search_threshold = Duration::from_millis(v);
        }
        if let Ok(v) = std::env::var("IMPORT_DEDUP_RETAIN_FAILED_HASHES") {
            self.retain_failed_hashes = parse_bool(&v);
        }
        self
    }

    /// Sets the cache capacity.
    #[must_use]
    pub const fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Sets the slow-hash threshold.
    #[must_use]
    pub const fn with_hash_threshold(mut self, threshold: Duration) -> Self {
        self.hash_threshold = threshold;
        self
    }

    /// Sets the slow-search threshold.
    #[must_use]
    pub const fn with_search_threshold(mut self, threshold: Duration) -> Self {
        self.search_threshold = threshold;
        self
    }

    /// Sets whether failed hash results stay cached.
    #[must_use]
    pub const fn with_retain_failed_hashes(mut self, retain: bool) -> Self {
        self.retain_failed_hashes = retain;
        self
    }

    /// Checks that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the cache capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::InvalidInput(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_file(&mut self, file: ConfigFileDedup) {
        if let Some(v) = file.cache_capacity {
            self.cache_capacity = v;
        }
        if let Some(v) = file.hash_threshold_ms {
            self.hash_threshold = Duration::from_millis(v);
        }
        if let Some(v) = file.search_threshold_ms {
            self.search_threshold = Duration::from_millis(v);
        }
        if let Some(v) = file.retain_failed_hashes {
            self.retain_failed_hashes = v;
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default)]
pub struct ImportDedupConfig {
    /// Duplicate-detection tuning.
    pub dedup: DedupConfig,
    /// Directory indexed as the destination volume.
    pub library_dir: Option<PathBuf>,
    /// Import history snapshot.
    pub history_file: Option<PathBuf>,
    /// Logging and metrics settings.
    pub observability: ObservabilitySettings,
}

impl ImportDedupConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path, then applies env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `<config dir>/import-dedup/config.toml`, then
    /// `~/.config/import-dedup/config.toml`. Returns defaults with env
    /// overrides when neither exists or parses.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::from_config_file(ConfigFile::default());
        };

        let candidates = [
            base_dirs.config_dir().join("import-dedup").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("import-dedup")
                .join("config.toml"),
        ];

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::from_config_file(ConfigFile::default())
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(dedup) = file.dedup {
            config.dedup.apply_file(dedup);
        }
        if let Some(paths) = file.paths {
            config.library_dir = paths.library.map(PathBuf::from);
            config.history_file = paths.history.map(PathBuf::from);
        }
        if let Some(observability) = file.observability {
            config.observability = observability;
        }

        config.dedup = config.dedup.with_env_overrides();
        config
    }

    /// Sets the library directory.
    #[must_use]
    pub fn with_library_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(path.into());
        self
    }

    /// Sets the history snapshot path.
    #[must_use]
    pub fn with_history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_file = Some(path.into());
        self
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// `[dedup]` section.
    pub dedup: Option<ConfigFileDedup>,
    /// `[paths]` section.
    pub paths: Option<ConfigFilePaths>,
    /// `[observability]` section.
    pub observability: Option<ObservabilitySettings>,
}

/// Dedup section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileDedup {
    /// Cache capacity.
    pub cache_capacity: Option<usize>,
    /// Slow-hash threshold in milliseconds.
    pub hash_threshold_ms: Option<u64>,
    /// Slow-search threshold in milliseconds.
    pub search_threshold_ms: Option<u64>,
    /// Keep failed hash results cached.
    pub retain_failed_hashes: Option<bool>,
}

/// Paths section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFilePaths {
    /// Library directory.
    pub library: Option<String>,
    /// History snapshot.
    pub history: Option<String>,
}

/// Observability section in config file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObservabilitySettings {
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Metrics settings.
    pub metrics: Option<MetricsSettings>,
}

/// Logging settings from config file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// `EnvFilter` directive.
    pub filter: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// Metrics settings from config file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MetricsSettings {
    /// Install the Prometheus recorder.
    pub enabled: Option<bool>,
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    raw.trim().parse().map_or_else(
        |_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        },
        Some,
    )
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DedupConfig::default();
        assert_eq!(config.cache_capacity, 10_000);
        assert_eq!(config.hash_threshold, Duration::from_millis(5_000));
        assert_eq!(config.search_threshold, Duration::from_millis(1_000));
        assert!(!config.retain_failed_hashes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = DedupConfig::new()
            .with_cache_capacity(4)
            .with_hash_threshold(Duration::from_millis(10))
            .with_search_threshold(Duration::from_millis(20))
            .with_retain_failed_hashes(true);
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.hash_threshold, Duration::from_millis(10));
        assert_eq!(config.search_threshold, Duration::from_millis(20));
        assert!(config.retain_failed_hashes);
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let config = DedupConfig::new().with_cache_capacity(0);
        assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" YES "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("nope"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[dedup]
cache_capacity = 64
hash_threshold_ms = 250

[paths]
library = "/srv/library"
history = "/srv/history.json"

[observability.logging]
format = "json"
"#,
        )
        .unwrap();

        let config = ImportDedupConfig::load_from_file(&path).unwrap();
        if std::env::var("IMPORT_DEDUP_CACHE_CAPACITY").is_err() {
            assert_eq!(config.dedup.cache_capacity, 64);
        }
        if std::env::var("IMPORT_DEDUP_HASH_THRESHOLD_MS").is_err() {
            assert_eq!(config.dedup.hash_threshold, Duration::from_millis(250));
        }
        assert_eq!(config.library_dir, Some(PathBuf::from("/srv/library")));
        assert_eq!(config.history_file, Some(PathBuf::from("/srv/history.json")));
        let format = config
            .observability
            .logging
            .and_then(|l| l.format)
            .unwrap();
        assert_eq!(format, "json");
    }

    #[test]
    fn test_load_from_file_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dedup\ncache_capacity = ").unwrap();

        let result = ImportDedupConfig::load_from_file(&path);
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = ImportDedupConfig::load_from_file(Path::new("/no/such/config.toml"));
        assert!(result.is_err());
    }
}
