//! Generic bounded plan cache with a pluggable eviction policy.
//!
//! A bounded associative container parameterized by key/value types and a
//! pluggable eviction policy (`EvictionPolicy::Lru` or `EvictionPolicy::Gdfs`).
//! Concurrency is handled by serializing every access behind a
//! `parking_lot::Mutex` — cheap here since the critical section is just a
//! hash-map operation, not statement execution.
//!
//! `try_get` clones the stored value out rather than handing back a
//! reference, which is what makes every cache hit a deep copy, not a shared
//! reference into cached state: every value type this crate caches
//! (`columnardb_ir::LogicalPlan`, `columnardb_operators::PhysicalOperator`)
//! derives `Clone` over owned trees, so cloning the stored value already
//! detaches it from any execution state the caller's copy might accumulate.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use xxhash_rust::xxh3::xxh3_64;

/// The physical plan cache's key: a 64-bit digest of the raw SQL string.
/// Grounded on the reference plan cache's `SqlHash` key type.
pub type SqlHash = u64;

pub fn hash_sql(sql: &str) -> SqlHash {
    xxh3_64(sql.as_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    Lru,
    /// Greedy-Dual-Size-Frequency: every entry carries a priority
    /// `inflation + frequency / cost`; eviction removes the lowest-priority
    /// entry and raises `inflation` to that entry's priority, so an old
    /// entry that was merely unlucky (not cold) isn't evicted before a
    /// genuinely cold one is. This cache has no notion of per-entry cost
    /// (a `LogicalPlan` and a `PhysicalOperator` tree aren't commensurable),
    /// so cost is fixed at `1.0`, which degenerates GDFS to a frequency-
    /// weighted LRU: recency still matters (via `inflation`), but a
    /// frequently-reused template survives a sweep a plain LRU would evict.
    Gdfs,
}

struct GdfsEntry<V> {
    value: V,
    frequency: f64,
    priority: f64,
}

struct GdfsCache<K, V> {
    capacity: usize,
    inflation: f64,
    entries: FxHashMap<K, GdfsEntry<V>>,
}

impl<K: Clone + Eq + Hash, V: Clone> GdfsCache<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inflation: 0.0,
            entries: FxHashMap::default(),
        }
    }

    fn get(&mut self, key: &K) -> Option<V> {
        let inflation = self.inflation;
        let entry = self.entries.get_mut(key)?;
        entry.frequency += 1.0;
        entry.priority = inflation + entry.frequency;
        Some(entry.value.clone())
    }

    fn put(&mut self, key: K, value: V) {
        if self.entries.contains_key(&key) {
            let inflation = self.inflation;
            let entry = self.entries.get_mut(&key).unwrap();
            entry.value = value;
            entry.frequency += 1.0;
            entry.priority = inflation + entry.frequency;
            return;
        }
        while self.entries.len() >= self.capacity {
            if !self.evict_one() {
                break;
            }
        }
        let priority = self.inflation + 1.0;
        self.entries.insert(
            key,
            GdfsEntry {
                value,
                frequency: 1.0,
                priority,
            },
        );
    }

    fn evict_one(&mut self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by(|a, b| a.1.priority.partial_cmp(&b.1.priority).unwrap())
            .map(|(k, v)| (k.clone(), v.priority));
        match victim {
            Some((key, priority)) => {
                self.inflation = priority;
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.inflation = 0.0;
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

enum Backing<K: Hash + Eq, V> {
    Lru(LruCache<K, V>),
    Gdfs(GdfsCache<K, V>),
}

/// `try_get`, `set`, `clear`, bounded by `capacity` with eviction per
/// `EvictionPolicy`.
///
/// Also tracks, per cache entry, which named objects (tables, views,
/// prepared plans) it referenced, in a reverse index from object name to
/// the set of cache keys that touched it — grounded on the reference plan
/// cache's object-to-hash reverse index. This is what lets a DDL statement
/// invalidate every plan that referenced the table/view it just dropped or
/// recreated, without scanning the whole cache.
pub struct PlanCache<K: Hash + Eq + Clone, V: Clone> {
    backing: Mutex<Backing<K, V>>,
    object_to_keys: Mutex<FxHashMap<String, FxHashSet<K>>>,
}

impl<K: Hash + Eq + Clone, V: Clone> PlanCache<K, V> {
    pub fn new(capacity: NonZeroUsize, policy: EvictionPolicy) -> Self {
        let backing = match policy {
            EvictionPolicy::Lru => Backing::Lru(LruCache::new(capacity)),
            EvictionPolicy::Gdfs => Backing::Gdfs(GdfsCache::new(capacity.get())),
        };
        Self {
            backing: Mutex::new(backing),
            object_to_keys: Mutex::new(FxHashMap::default()),
        }
    }

    /// Pure with respect to logical cache state except for policy
    /// bookkeeping (recency/frequency updates); returns a detached clone.
    pub fn try_get(&self, key: &K) -> Option<V> {
        let mut backing = self.backing.lock();
        match &mut *backing {
            Backing::Lru(cache) => cache.get(key).cloned(),
            Backing::Gdfs(cache) => cache.get(key),
        }
    }

    /// Inserts or refreshes `key`, evicting per policy when at capacity.
    pub fn set(&self, key: K, value: V) {
        let mut backing = self.backing.lock();
        match &mut *backing {
            Backing::Lru(cache) => {
                cache.put(key, value);
            }
            Backing::Gdfs(cache) => cache.put(key, value),
        }
    }

    /// Like `set`, but also records that `key`'s entry references every
    /// name in `objects`, so a later `invalidate_objects` call covering one
    /// of them evicts this entry too.
    pub fn set_with_objects(&self, key: K, value: V, objects: &[String]) {
        self.set(key.clone(), value);
        if !objects.is_empty() {
            let mut index = self.object_to_keys.lock();
            for object in objects {
                index.entry(object.clone()).or_default().insert(key.clone());
            }
        }
    }

    /// Evicts `key` without waiting for the policy to select it, used by
    /// DDL-triggered invalidation.
    pub fn invalidate(&self, key: &K) {
        let mut backing = self.backing.lock();
        match &mut *backing {
            Backing::Lru(cache) => {
                cache.pop(key);
            }
            Backing::Gdfs(cache) => {
                cache.remove(key);
            }
        }
    }

    /// Evicts every entry that was ever `set_with_objects`-tagged with any
    /// name in `objects` — used after a DDL statement that mutates a
    /// table/view/prepared-plan name commits.
    pub fn invalidate_objects(&self, objects: &[String]) {
        let mut index = self.object_to_keys.lock();
        for object in objects {
            if let Some(keys) = index.remove(object) {
                for key in keys {
                    self.invalidate(&key);
                }
            }
        }
    }

    pub fn clear(&self) {
        let mut backing = self.backing.lock();
        match &mut *backing {
            Backing::Lru(cache) => cache.clear(),
            Backing::Gdfs(cache) => cache.clear(),
        }
        self.object_to_keys.lock().clear();
    }

    pub fn len(&self) -> usize {
        let backing = self.backing.lock();
        match &*backing {
            Backing::Lru(cache) => cache.len(),
            Backing::Gdfs(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn set_then_try_get_returns_the_stored_value_lru() {
        let cache: PlanCache<String, i32> = PlanCache::new(cap(4), EvictionPolicy::Lru);
        cache.set("a".to_string(), 1);
        assert_eq!(cache.try_get(&"a".to_string()), Some(1));
    }

    #[test]
    fn set_then_try_get_returns_the_stored_value_gdfs() {
        let cache: PlanCache<String, i32> = PlanCache::new(cap(4), EvictionPolicy::Gdfs);
        cache.set("a".to_string(), 1);
        assert_eq!(cache.try_get(&"a".to_string()), Some(1));
    }

    #[test]
    fn miss_returns_none() {
        let cache: PlanCache<String, i32> = PlanCache::new(cap(4), EvictionPolicy::Lru);
        assert_eq!(cache.try_get(&"missing".to_string()), None);
    }

    #[test]
    fn lru_evicts_least_recently_used_when_full() {
        let cache: PlanCache<i32, i32> = PlanCache::new(cap(2), EvictionPolicy::Lru);
        cache.set(1, 1);
        cache.set(2, 2);
        cache.try_get(&1); // touch 1, making 2 the LRU victim
        cache.set(3, 3);
        assert_eq!(cache.try_get(&2), None);
        assert_eq!(cache.try_get(&1), Some(1));
        assert_eq!(cache.try_get(&3), Some(3));
    }

    #[test]
    fn gdfs_prefers_evicting_the_cold_entry_over_a_reused_one() {
        let cache: PlanCache<i32, i32> = PlanCache::new(cap(2), EvictionPolicy::Gdfs);
        cache.set(1, 1);
        cache.set(2, 2);
        // entry 1 gets reused repeatedly; entry 2 never does.
        for _ in 0..5 {
            cache.try_get(&1);
        }
        cache.set(3, 3);
        assert_eq!(cache.try_get(&1), Some(1));
        assert_eq!(cache.try_get(&2), None);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache: PlanCache<String, i32> = PlanCache::new(cap(4), EvictionPolicy::Lru);
        cache.set("a".to_string(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn hash_sql_is_deterministic_and_distinguishes_statements() {
        assert_eq!(hash_sql("SELECT 1"), hash_sql("SELECT 1"));
        assert_ne!(hash_sql("SELECT 1"), hash_sql("SELECT 2"));
    }

    #[test]
    fn invalidate_removes_a_single_key() {
        let cache: PlanCache<String, i32> = PlanCache::new(cap(4), EvictionPolicy::Lru);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.invalidate(&"a".to_string());
        assert_eq!(cache.try_get(&"a".to_string()), None);
        assert_eq!(cache.try_get(&"b".to_string()), Some(2));
    }

    #[test]
    fn invalidate_objects_evicts_every_entry_tagged_with_that_name() {
        let cache: PlanCache<String, i32> = PlanCache::new(cap(4), EvictionPolicy::Lru);
        cache.set_with_objects("select * from t".to_string(), 1, &["t".to_string()]);
        cache.set_with_objects("select a from t".to_string(), 2, &["t".to_string()]);
        cache.set_with_objects("select * from other".to_string(), 3, &["other".to_string()]);
        cache.invalidate_objects(&["t".to_string()]);
        assert_eq!(cache.try_get(&"select * from t".to_string()), None);
        assert_eq!(cache.try_get(&"select a from t".to_string()), None);
        assert_eq!(cache.try_get(&"select * from other".to_string()), Some(3));
    }
}
