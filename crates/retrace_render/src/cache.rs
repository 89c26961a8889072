//! Content-Addressed Cache
//!
//! Generic storage behind the shader and instance caches. Keys are
//! [`ContentHash`]es; values are whatever handle the conversion produced.
//!
//! # Concurrency
//!
//! The table is split into shards, each guarded by its own lock, and every
//! entry is a once-cell. A lookup only holds its shard lock long enough to
//! find or insert the cell; the conversion itself runs inside the cell's
//! initializer, outside any shard lock:
//!
//! ```text
//!  get(key) ─► shard[key % N].lock() ─► Arc<OnceLock<V>> ─► unlock
//!                                         │
//!                                         └─► get_or_init(convert)
//! ```
//!
//! Different keys convert in parallel. Concurrent requests for the same key
//! block on the cell and all observe the single converted value.
//!
//! # Sweeping
//!
//! [`ContentCache::retain`] is not safe to call concurrently with `get`. It
//! is run between edits and renders to drop entries nobody else uses.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use retrace_core::ContentHash;
use rustc_hash::FxHashMap;

const SHARD_COUNT: usize = 32;

type Slot<V> = Arc<OnceLock<V>>;

pub struct ContentCache<V> {
    shards: Box<[Mutex<FxHashMap<ContentHash, Slot<V>>>]>,
}

impl<V: Clone> ContentCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT)
                .map(|_| Mutex::new(FxHashMap::default()))
                .collect(),
        }
    }

    #[inline]
    fn shard(&self, key: ContentHash) -> &Mutex<FxHashMap<ContentHash, Slot<V>>> {
        &self.shards[(key.low() % SHARD_COUNT as u64) as usize]
    }

    /// Returns the value for `key`, running `convert` exactly once per key.
    pub fn get_or_insert_with(&self, key: ContentHash, convert: impl FnOnce() -> V) -> V {
        let slot = self.shard(key).lock().entry(key).or_default().clone();
        slot.get_or_init(convert).clone()
    }

    /// Returns the value for `key` if it has been converted.
    #[must_use]
    pub fn get(&self, key: ContentHash) -> Option<V> {
        let slot = self.shard(key).lock().get(&key).cloned()?;
        slot.get().cloned()
    }

    /// Keeps only the entries for which `keep` returns true. Cells whose
    /// conversion never completed are dropped too.
    pub fn retain(&self, mut keep: impl FnMut(&V) -> bool) {
        for shard in &self.shards {
            shard
                .lock()
                .retain(|_, slot| slot.get().is_some_and(&mut keep));
        }
    }

    /// Visits every converted value.
    pub fn for_each(&self, mut f: impl FnMut(&V)) {
        for shard in &self.shards {
            for slot in shard.lock().values() {
                if let Some(v) = slot.get() {
                    f(v);
                }
            }
        }
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for ContentCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
