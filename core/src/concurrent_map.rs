//! Sharded accumulator used by parallel ranking.
//!
//! Keys are routed to one of a fixed number of shards by hash. Each shard is
//! a plain map behind its own `parking_lot::Mutex`, so writers touching keys
//! in different shards never contend.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHasher};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

pub struct ConcurrentMap<K, V> {
    shards: Vec<Mutex<FxHashMap<K, V>>>,
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Hash + Eq + Ord,
    V: Default,
{
    /// Create a map with `shard_count` independently locked shards (at least one).
    pub fn new(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1)).map(|_| Mutex::new(FxHashMap::default())).collect();
        Self { shards }
    }

    fn shard_index(&self, key: &K) -> usize {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// Lock the shard owning `key` and return a handle to its value.
    ///
    /// A missing key is inserted with `V::default()`. The shard stays locked
    /// until the handle is dropped, so read-modify-write through it is atomic.
    pub fn access(&self, key: K) -> MappedMutexGuard<'_, V> {
        let shard = self.shards[self.shard_index(&key)].lock();
        MutexGuard::map(shard, |entries| entries.entry(key).or_default())
    }

    /// Move every entry out into an ordered map, locking one shard at a time.
    ///
    /// The result is consistent per shard but not a global snapshot.
    pub fn drain(&self) -> BTreeMap<K, V> {
        let mut result = BTreeMap::new();
        for shard in &self.shards {
            let entries = std::mem::take(&mut *shard.lock());
            result.extend(entries);
        }
        result
    }
}
