//! Import destinations, scan modes, and volume types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an import is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Destination {
    /// The user's cloud drive.
    #[default]
    CloudDrive,
    /// A folder on local storage.
    LocalFolder,
}

impl Destination {
    /// Returns all destination variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::CloudDrive, Self::LocalFolder]
    }

    /// Returns the destination as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CloudDrive => "cloud-drive",
            Self::LocalFolder => "local-folder",
        }
    }

    /// Returns true if content-duplicate detection is available for this
    /// destination.
    #[must_use]
    pub const fn supports_content_dedup(&self) -> bool {
        matches!(self, Self::CloudDrive)
    }

    /// The volume type holding files for this destination.
    #[must_use]
    pub const fn volume_type(&self) -> VolumeType {
        match self {
            Self::CloudDrive => VolumeType::CloudDrive,
            Self::LocalFolder => VolumeType::Downloads,
        }
    }

    /// Parses a destination from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cloud-drive" | "cloud_drive" | "drive" => Some(Self::CloudDrive),
            "local-folder" | "local_folder" | "local" => Some(Self::LocalFolder),
            _ => None,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How thoroughly a scan checks for duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Check import history only.
    History,
    /// Check import history, then content hashes.
    #[default]
    Content,
}

impl ScanMode {
    /// Returns the scan mode as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::History => "history",
            Self::Content => "content",
        }
    }

    /// Parses a scan mode from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "history" => Some(Self::History),
            "content" | "full" => Some(Self::Content),
            _ => None,
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of storage volume known to the volume manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeType {
    /// Cloud drive volume.
    CloudDrive,
    /// Removable media (SD cards, USB drives).
    Removable,
    /// The local downloads volume.
    Downloads,
}

impl VolumeType {
    /// Returns the volume type as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CloudDrive => "cloud-drive",
            Self::Removable => "removable",
            Self::Downloads => "downloads",
        }
    }

    /// Parses a volume type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cloud-drive" | "cloud_drive" | "drive" => Some(Self::CloudDrive),
            "removable" => Some(Self::Removable),
            "downloads" => Some(Self::Downloads),
            _ => None,
        }
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
