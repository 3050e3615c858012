//! Import history backends.
//!
//! # Available Implementations
//!
//! | Backend | Use Case |
//! |---------|----------|
//! | `InMemoryHistoryLoader` | Tests, hosts that already hold history in memory |
//! | `JsonHistoryLoader` | Read-only JSON snapshot on disk |

mod json;
mod memory;

pub use json::{HistoryRecord, HistorySnapshotFile, JsonHistoryLoader};
pub use memory::{InMemoryHistory, InMemoryHistoryLoader};
