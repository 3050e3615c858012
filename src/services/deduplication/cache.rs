//! Bounded cache of pending and completed hash computations.
//!
//! Entries hold the shared handle to a computation, not its value, so a
//! second request for the same file version joins the computation already
//! in flight.

use crate::config::DEFAULT_CACHE_CAPACITY;
use crate::{Error, Result};
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Clonable handle to one content-hash computation.
///
/// Every clone resolves to the same digest or the same error.
pub type HashResult = Shared<BoxFuture<'static, Result<String>>>;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(DEFAULT_CACHE_CAPACITY) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// Identifies one version of one file: `"{fingerprint}|{url}"`.
///
/// Editing a file changes its fingerprint and therefore its key, so stale
/// entries are orphaned rather than invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Separator between fingerprint and URL.
    pub const SEPARATOR: char = '|';

    /// Builds the key for a fingerprint and URL.
    #[must_use]
    pub fn new(fingerprint: &str, url: &str) -> Self {
        Self(format!("{fingerprint}{}{url}", Self::SEPARATOR))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Slot {
    /// Distinguishes this insertion from later ones under the same key.
    generation: u64,
    result: HashResult,
}

/// LRU map from [`CacheKey`] to [`HashResult`].
///
/// # Thread Safety
///
/// A single `Mutex` guards the map. It is never held across an `.await`;
/// [`HashCache::get_or_insert_with`] runs its constructor inside the lock so
/// the check and the insert are one step.
///
/// # Lock Poisoning
///
/// A poisoned lock is recovered. The map holds only handles, so a panic
/// mid-operation cannot leave it logically inconsistent.
pub struct HashCache {
    entries: Mutex<LruCache<CacheKey, Slot>>,
    next_generation: AtomicU64,
}

impl HashCache {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| Error::InvalidInput("hash cache capacity must be > 0".to_string()))?;
        Ok(Self::with_capacity(capacity))
    }

    /// Creates a cache holding at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Returns true if `key` is cached. Does not touch recency.
    #[must_use]
    pub fn has(&self, key: &CacheKey) -> bool {
        self.lock().contains(key)
    }

    /// Returns the cached handle for `key`, marking it most recently used.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<HashResult> {
        self.lock().get(key).map(|slot| slot.result.clone())
    }

    /// Stores `value` under `key`, evicting the least recently used entry
    /// when full.
    pub fn put(&self, key: CacheKey, value: HashResult) {
        let generation = self.next_generation();
        let len = {
            let mut entries = self.lock();
            entries.put(
                key,
                Slot {
                    generation,
                    result: value,
                },
            );
            entries.len()
        };
        record_len(len);
    }

    /// Returns the handle for `key`, creating it with `make` if absent.
    ///
    /// `make` receives the generation of the new slot and runs under the
    /// cache lock, so it must not block. The boolean is true when `make`
    /// was called.
    pub fn get_or_insert_with<F>(&self, key: CacheKey, make: F) -> (HashResult, bool)
    where
        F: FnOnce(u64) -> HashResult,
    {
        let (result, len) = {
            let mut entries = self.lock();
            if let Some(slot) = entries.get(&key) {
                return (slot.result.clone(), false);
            }

            let generation = self.next_generation();
            let result = make(generation);
            entries.put(
                key,
                Slot {
                    generation,
                    result: result.clone(),
                },
            );
            (result, entries.len())
        };
        record_len(len);
        (result, true)
    }

    /// Removes `key` only if it still holds the insertion `generation`.
    ///
    /// Returns true if an entry was removed.
    pub fn remove_generation(&self, key: &CacheKey, generation: u64) -> bool {
        let (removed, len) = {
            let mut entries = self.lock();
            let matches = entries
                .peek(key)
                .is_some_and(|slot| slot.generation == generation);
            if matches {
                entries.pop(key);
            }
            (matches, entries.len())
        };
        if removed {
            record_len(len);
        }
        removed
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HashCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for HashCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[allow(clippy::cast_precision_loss)]
fn record_len(len: usize) {
    metrics::gauge!("hash_cache_entries").set(len as f64);
}
