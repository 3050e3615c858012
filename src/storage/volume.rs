//! Fixed volume table.

use crate::models::VolumeType;
use crate::storage::traits::VolumeManager;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// Volume manager backed by a fixed `VolumeType` → id table.
#[derive(Debug, Clone, Default)]
pub struct StaticVolumeManager {
    volumes: HashMap<VolumeType, String>,
}

impl StaticVolumeManager {
    /// Creates an empty volume table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a volume.
    #[must_use]
    pub fn with_volume(mut self, volume_type: VolumeType, volume_id: impl Into<String>) -> Self {
        self.volumes.insert(volume_type, volume_id.into());
        self
    }
}

#[async_trait]
impl VolumeManager for StaticVolumeManager {
    async fn volume_id(&self, volume_type: VolumeType) -> Result<String> {
        self.volumes
            .get(&volume_type)
            .cloned()
            .ok_or_else(|| Error::VolumeUnavailable {
                volume_type,
                cause: "no volume of this type is mounted".to_string(),
            })
    }
}
