//! Disposition of an import candidate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an import candidate.
///
/// # Variants
///
/// - `Original`: no evidence the file is already at the destination
/// - `HistoryDuplicate`: import history shows it was copied or imported before
/// - `ContentDuplicate`: a file with identical content exists at the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Not a known duplicate.
    Original,
    /// Previously copied or imported, per history.
    HistoryDuplicate,
    /// Content hash matches a file at the destination.
    ContentDuplicate,
}

impl Disposition {
    /// Returns the disposition as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::HistoryDuplicate => "history_duplicate",
            Self::ContentDuplicate => "content_duplicate",
        }
    }

    /// Returns true for either duplicate variant.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        !matches!(self, Self::Original)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_display() {
        assert_eq!(Disposition::Original.to_string(), "original");
        assert_eq!(
            Disposition::HistoryDuplicate.to_string(),
            "history_duplicate"
        );
        assert_eq!(
            Disposition::ContentDuplicate.to_string(),
            "content_duplicate"
        );
    }

    #[test]
    fn test_is_duplicate() {
        assert!(!Disposition::Original.is_duplicate());
        assert!(Disposition::HistoryDuplicate.is_duplicate());
        assert!(Disposition::ContentDuplicate.is_duplicate());
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&Disposition::ContentDuplicate).unwrap();
        assert_eq!(json, "\"content_duplicate\"");
    }
}
