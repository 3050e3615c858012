//! Import history traits.
//!
//! History is loaded once per session into a queryable snapshot. Loading
//! and recording history are the host's concern; this crate only reads it.

use crate::Result;
use crate::models::{Destination, FileEntry};
use async_trait::async_trait;
use std::sync::Arc;

/// Queryable record of previously copied or imported entries.
#[async_trait]
pub trait ImportHistory: Send + Sync {
    /// Returns true if the entry was copied to the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be queried.
    async fn was_copied(&self, entry: &FileEntry, destination: Destination) -> Result<bool>;

    /// Returns true if the entry was imported to the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be queried.
    async fn was_imported(&self, entry: &FileEntry, destination: Destination) -> Result<bool>;
}

/// Provides the current history snapshot.
#[async_trait]
pub trait HistoryLoader: Send + Sync {
    /// Returns the current history snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be loaded.
    async fn history(&self) -> Result<Arc<dyn ImportHistory>>;
}
