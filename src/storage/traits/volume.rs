//! Volume manager trait.

use crate::Result;
use crate::models::VolumeType;
use async_trait::async_trait;

/// Resolves storage volume identifiers.
#[async_trait]
pub trait VolumeManager: Send + Sync {
    /// Returns the id of the current profile's volume of the given type.
    ///
    /// # Errors
    ///
    /// Returns an error if no such volume is mounted.
    async fn volume_id(&self, volume_type: VolumeType) -> Result<String>;
}
