//! Import-time duplicate detection.
//!
//! Two checks, cheapest first:
//! 1. **History**: was the entry previously copied or imported to the
//!    destination? Both lookups run concurrently.
//! 2. **Content**: does the destination volume hold a file with the same
//!    content hash?
//!
//! The content check is skipped on a history hit or in history-only scans.
//!
//! # Architecture
//!
//! ```text
//! entry ──► DispositionChecker
//!             ├─► HistoryLoader ──► was_copied ∥ was_imported ──► HistoryDuplicate
//!             └─► DuplicateFinder (ContentMatcher)
//!                   ├─► ContentHasher ──► HashCache (LRU of pending handles)
//!                   └─► DuplicateSearchClient ──► VolumeResolver (once per session)
//!                                 └──► ContentDuplicate | Original
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use import_dedup::services::deduplication::{DispositionChecker, FinderCollaborators};
//!
//! let check = DispositionChecker::create_checker(history, collaborators, &DedupConfig::default())?;
//! let disposition = check(&entry, Destination::CloudDrive, ScanMode::Content).await?;
//! if disposition.is_duplicate() {
//!     println!("Skipping {entry}: {disposition}");
//! }
//! ```

mod cache;
mod disposition;
mod finder;
mod hasher;
mod search;
mod volume;

pub use cache::{CacheKey, HashCache, HashResult};
pub use disposition::{CheckerFn, DispositionChecker};
pub use finder::{ContentMatcher, DuplicateFinder, FinderCollaborators};
pub use hasher::ContentHasher;
pub use search::DuplicateSearchClient;
pub use volume::VolumeResolver;
