//! CLI command implementations.
//!
//! Argument parsing lives in the binary; this module holds the command
//! logic so it can be tested without a process boundary.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `check` | Classify files as original, history duplicate, or content duplicate |
//! | `hash` | Print metadata fingerprints and content hashes |
//! | `config` | Show the effective configuration |
//!
//! # Example Usage
//!
//! ```bash
//! # Check a memory card against a library and an import history
//! import-dedup check /media/card/DCIM/*.JPG --library ~/Pictures --history history.json
//!
//! # History-only scan, JSON output
//! import-dedup check IMG_0001.JPG --history history.json --mode history --format json
//!
//! # Show hashes
//! import-dedup hash IMG_0001.JPG
//! ```

mod check;
mod config;
mod hash;
mod output;

pub use check::{CheckOptions, LIBRARY_VOLUME_ID, cmd_check, run_check};
pub use config::{cmd_config, write_config};
pub use hash::{HashReport, cmd_hash, run_hash};
pub use output::{CheckReport, OutputFormat, write_json, write_table};
