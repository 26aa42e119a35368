//! Fixed-capacity cache shared by thumbnails and theme entries.
//!
//! Entries are kept in an unbounded [`LruCache`] whose recency list doubles
//! as the eviction order. With [`EvictionOrder::LastAccessed`] a hit moves
//! the entry to the back of the queue; with [`EvictionOrder::Inserted`] only
//! (re-)insertion does. Eviction happens on insertion only, never on a read.

use crate::events::{EventBus, Subscription};
use lru::LruCache;
use std::hash::Hash;
use tracing::debug;

/// Which timestamp drives eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionOrder {
    /// Oldest `last_accessed` goes first (thumbnails)
    LastAccessed,
    /// Oldest insertion `timestamp` goes first (theme entries)
    Inserted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent<K> {
    Inserted(K),
    Evicted(Vec<K>),
    Cleared,
}

pub struct BoundedCache<K: Hash + Eq + Clone, V> {
    entries: LruCache<K, V>,
    order: EvictionOrder,
    capacity: usize,
    events: EventBus<CacheEvent<K>>,
}

impl<K: Hash + Eq + Clone, V> BoundedCache<K, V> {
    pub fn new(capacity: usize, order: EvictionOrder) -> Self {
        Self {
            entries: LruCache::unbounded(),
            order,
            capacity,
            events: EventBus::new(),
        }
    }

    /// Look up an entry. Under `LastAccessed` this counts as a use.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.order {
            EvictionOrder::LastAccessed => self.entries.get(key),
            EvictionOrder::Inserted => self.entries.peek(key),
        }
    }

    /// Mutable lookup with the same recency rules as [`BoundedCache::get`].
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.order {
            EvictionOrder::LastAccessed => self.entries.get_mut(key),
            EvictionOrder::Inserted => self.entries.peek_mut(key),
        }
    }

    /// Look up without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.peek(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Insert or replace an entry, then evict the oldest entries until the
    /// cache is back at capacity. Returns the evicted keys.
    pub fn put(&mut self, key: K, value: V) -> Vec<K> {
        self.entries.put(key.clone(), value);
        self.events.emit(CacheEvent::Inserted(key));

        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            match self.entries.pop_lru() {
                Some((old_key, _)) => evicted.push(old_key),
                None => break,
            }
        }

        if !evicted.is_empty() {
            debug!(
                "Evicted {} cache entries (capacity {})",
                evicted.len(),
                self.capacity
            );
            self.events.emit(CacheEvent::Evicted(evicted.clone()));
        }
        evicted
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.pop(key)
    }

    /// Takes effect on the next insertion; nothing is evicted here.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.events.emit(CacheEvent::Cleared);
    }

    /// Entries from next-to-evict to most recent.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().rev()
    }

    pub fn subscribe(&self) -> Subscription<CacheEvent<K>> {
        self.events.subscribe()
    }
}
