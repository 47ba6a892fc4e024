//! In-memory TTL cache with a pluggable eviction policy.
//!
//! Entries carry their own expiry. Expired entries are never returned and
//! are dropped when touched or on `purge_expired`. When the cache is full,
//! the `EvictionPolicy` picks which live key to drop.
//!
//! Every time-dependent method has an `_at(now)` twin so tests can drive
//! the clock explicitly.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

// ═══════════════════════════════════════════════════════════
// Eviction policies
// ═══════════════════════════════════════════════════════════

/// Decides which key leaves a full cache.
pub trait EvictionPolicy<K>: Send {
    /// A key was inserted (new or overwritten).
    fn on_insert(&mut self, key: &K);
    /// A key was read.
    fn on_access(&mut self, key: &K);
    /// A key left the cache for any reason.
    fn on_remove(&mut self, key: &K);
    /// Next key to evict, if any.
    fn victim(&mut self) -> Option<K>;
}

/// Evicts the key read or written longest ago.
#[derive(Debug)]
pub struct LeastRecentlyUsed<K> {
    order: VecDeque<K>,
}

impl<K> Default for LeastRecentlyUsed<K> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }
}

impl<K: Clone + Eq + Send> LeastRecentlyUsed<K> {
    fn touch(&mut self, key: &K) {
        self.order.retain(|k| k != key);
        self.order.push_back(key.clone());
    }
}

impl<K: Clone + Eq + Send> EvictionPolicy<K> for LeastRecentlyUsed<K> {
    fn on_insert(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_access(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_remove(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }

    fn victim(&mut self) -> Option<K> {
        self.order.front().cloned()
    }
}

/// Evicts the key inserted longest ago; reads do not refresh position.
#[derive(Debug)]
pub struct FirstInFirstOut<K> {
    order: VecDeque<K>,
}

impl<K> Default for FirstInFirstOut<K> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }
}

impl<K: Clone + Eq + Send> EvictionPolicy<K> for FirstInFirstOut<K> {
    fn on_insert(&mut self, key: &K) {
        if !self.order.contains(key) {
            self.order.push_back(key.clone());
        }
    }

    fn on_access(&mut self, _key: &K) {}

    fn on_remove(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }

    fn victim(&mut self) -> Option<K> {
        self.order.front().cloned()
    }
}

// ═══════════════════════════════════════════════════════════
// TtlCache
// ═══════════════════════════════════════════════════════════

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    /// `None` when `now + ttl` is past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Key → value map where every entry expires `ttl` after insertion.
pub struct TtlCache<K, V, P = LeastRecentlyUsed<K>> {
    entries: HashMap<K, CacheEntry<V>>,
    policy: P,
    ttl: Duration,
    capacity: usize,
}

impl<K, V, P> TtlCache<K, V, P>
where
    K: Clone + Eq + Hash,
    V: Clone,
    P: EvictionPolicy<K>,
{
    /// `capacity` is clamped to at least one entry.
    pub fn with_policy(ttl: Duration, capacity: usize, policy: P) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) => entry.is_expired(now),
        };
        if expired {
            self.remove_entry(key);
            return None;
        }
        self.policy.on_access(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&mut self, key: K, value: V, now: Instant) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.purge_expired_at(now);
            while self.entries.len() >= self.capacity {
                match self.policy.victim() {
                    Some(victim) => self.remove_entry(&victim),
                    None => break,
                }
            }
        }

        self.policy.on_insert(&key);
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now.checked_add(self.ttl),
            },
        );
    }

    /// Drop one key; returns whether it was present.
    pub fn invalidate(&mut self, key: &K) -> bool {
        let present = self.entries.contains_key(key);
        if present {
            self.remove_entry(key);
        }
        present
    }

    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Remove every expired entry; returns how many were dropped.
    pub fn purge_expired_at(&mut self, now: Instant) -> usize {
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove_entry(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &K) {
        self.entries.remove(key);
        self.policy.on_remove(key);
    }
}

impl<K, V> TtlCache<K, V, LeastRecentlyUsed<K>>
where
    K: Clone + Eq + Hash + Send,
    V: Clone,
{
    /// LRU-evicting cache.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_policy(ttl, capacity, LeastRecentlyUsed::default())
    }
}
