//! Session-scoped destination volume resolution.

use crate::models::VolumeType;
use crate::storage::traits::VolumeManager;
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Resolves the destination volume id once per session.
///
/// Concurrent first callers wait on the same resolution.
///
/// Only a successful resolution is kept for the session. A failure is
/// returned to the callers waiting on that attempt and then dropped, so the
/// volume manager is asked again on the next check (for example once the
/// drive has been mounted). A failing manager is therefore called more than
/// once per session.
pub struct VolumeResolver {
    manager: Arc<dyn VolumeManager>,
    volume_type: VolumeType,
    volume_id: OnceCell<String>,
}

impl VolumeResolver {
    /// Creates a resolver for the given volume type.
    #[must_use]
    pub fn new(manager: Arc<dyn VolumeManager>, volume_type: VolumeType) -> Self {
        Self {
            manager,
            volume_type,
            volume_id: OnceCell::new(),
        }
    }

    /// Returns the volume type being resolved.
    #[must_use]
    pub const fn volume_type(&self) -> VolumeType {
        self.volume_type
    }

    /// Returns the resolved id without resolving, if already known.
    #[must_use]
    pub fn cached(&self) -> Option<&str> {
        self.volume_id.get().map(String::as_str)
    }

    /// Returns the volume id, resolving it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VolumeUnavailable`] if the volume manager fails.
    pub async fn volume_id(&self) -> Result<&str> {
        let id = self
            .volume_id
            .get_or_try_init(|| async {
                let id = self
                    .manager
                    .volume_id(self.volume_type)
                    .await
                    .map_err(|e| self.unavailable(e))?;
                tracing::debug!(volume_type = %self.volume_type, volume_id = %id, "Resolved volume");
                Ok::<_, Error>(id)
            })
            .await?;
        Ok(id.as_str())
    }

    fn unavailable(&self, err: Error) -> Error {
        match err {
            e @ Error::VolumeUnavailable { .. } => e,
            other => Error::VolumeUnavailable {
                volume_type: self.volume_type,
                cause: other.to_string(),
            },
        }
    }
}
