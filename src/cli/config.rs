//! `config` command: show the effective configuration.

use crate::config::ImportDedupConfig;
use crate::{Error, Result};
use std::io::{self, Write};
use std::path::Path;

/// Writes the effective configuration as `key = value` lines.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_config<W: Write>(writer: &mut W, config: &ImportDedupConfig) -> io::Result<()> {
    let dedup = &config.dedup;
    writeln!(writer, "cache_capacity       = {}", dedup.cache_capacity)?;
    writeln!(
        writer,
        "hash_threshold_ms    = {}",
        dedup.hash_threshold.as_millis()
    )?;
    writeln!(
        writer,
        "search_threshold_ms  = {}",
        dedup.search_threshold.as_millis()
    )?;
    writeln!(writer, "retain_failed_hashes = {}", dedup.retain_failed_hashes)?;
    writeln!(
        writer,
        "library              = {}",
        display_path(config.library_dir.as_deref())
    )?;
    writeln!(
        writer,
        "history              = {}",
        display_path(config.history_file.as_deref())
    )?;
    Ok(())
}

/// Executes the `config` command.
///
/// # Errors
///
/// Returns an error if output fails.
pub fn cmd_config(config: &ImportDedupConfig, show: bool) -> Result<()> {
    if !show {
        println!("Use --show to print the effective configuration.");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_config(&mut handle, config).map_err(|e| Error::OperationFailed {
        operation: "write_output".to_string(),
        cause: e.to_string(),
    })
}

fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(|| "(unset)".to_string(), |p| p.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_config_defaults() {
        let mut out = Vec::new();
        write_config(&mut out, &ImportDedupConfig::new()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("cache_capacity       = 10000"));
        assert!(text.contains("hash_threshold_ms    = 5000"));
        assert!(text.contains("search_threshold_ms  = 1000"));
        assert!(text.contains("retain_failed_hashes = false"));
        assert!(text.contains("library              = (unset)"));
    }

    #[test]
    fn test_write_config_paths() {
        let config = ImportDedupConfig::new()
            .with_library_dir("/srv/library")
            .with_history_file("/srv/history.json");
        let mut out = Vec::new();
        write_config(&mut out, &config).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("library              = /srv/library"));
        assert!(text.contains("history              = /srv/history.json"));
    }
}
