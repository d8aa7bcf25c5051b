//! Bounded in-memory cache with per-entry expiry.
//!
//! One instance is owned by each service that needs memoization (FX
//! reconciliation, PPP lookup); nothing is global. Expired entries are
//! treated as absent on read and swept when an insert would push the map
//! past its capacity, so long-lived processes do not accumulate dead
//! entries without bound.
//!
//! Concurrent requests for the same key may both miss and both fetch;
//! the second store wins. Duplicate work is an accepted cost, no per-key
//! mutual exclusion is attempted.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::warn;

/// Default maximum number of live entries.
const DEFAULT_CAPACITY: usize = 512;

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe TTL cache.
///
/// Reads never return an entry whose expiry has passed.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    capacity: usize,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Lock the entry map, recovering from poison if necessary.
    ///
    /// Worst case after recovery is a stale or missing cache entry, which
    /// only costs an extra provider fetch.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("TTL cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Look up an unexpired entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.lock_entries();
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Store a value, overwriting any previous entry for the key.
    ///
    /// When the map is at capacity and the key is new, expired entries are
    /// swept first. The insert always proceeds; capacity bounds the number
    /// of live entries, it is not a hard limit on the map.
    pub fn insert(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.lock_entries();

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let now = Instant::now();
            entries.retain(|_, entry| entry.expires_at > now);
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
