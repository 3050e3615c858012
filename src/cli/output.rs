//! Report rendering for the `check` command.

use crate::models::Disposition;
use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

/// Outcome of checking one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Path as given on the command line.
    pub path: String,
    /// Disposition, when the check succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disposition: Option<Disposition>,
    /// Failure message, when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckReport {
    /// A successful check.
    #[must_use]
    pub fn ok(path: impl Into<String>, disposition: Disposition) -> Self {
        Self {
            path: path.into(),
            disposition: Some(disposition),
            error: None,
        }
    }

    /// A failed check.
    #[must_use]
    pub fn failed(path: impl Into<String>, error: impl ToString) -> Self {
        Self {
            path: path.into(),
            disposition: None,
            error: Some(error.to_string()),
        }
    }

    /// Returns the status column text.
    #[must_use]
    pub fn status(&self) -> &'static str {
        self.disposition.as_ref().map_or("error", Disposition::as_str)
    }
}

/// Output format for check results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format (default).
    #[default]
    Table,
    /// JSON format.
    Json,
}

impl FromStr for OutputFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Table,
        })
    }
}

/// Writes reports as a table to the given writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_table<W: Write>(writer: &mut W, reports: &[CheckReport]) -> io::Result<()> {
    writeln!(writer, "{:<20}PATH", "DISPOSITION")?;
    for report in reports {
        match &report.error {
            Some(error) => writeln!(writer, "{:<20}{} ({error})", report.status(), report.path)?,
            None => writeln!(writer, "{:<20}{}", report.status(), report.path)?,
        }
    }
    Ok(())
}

/// Writes reports as JSON to the given writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, reports: &[CheckReport]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(reports).map_err(io::Error::other)?;
    writeln!(writer, "{json}")
}
