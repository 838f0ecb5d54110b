//! Bounded in-memory cache with per-entry TTL and LRU eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use regex::Regex;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug)]
struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU order: front is the eviction candidate, back is most recent.
    access_order: VecDeque<String>,
}

impl<V> CacheInner<V> {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        self.access_order.push_back(key.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self.access_order.pop_front() {
            self.entries.remove(&key);
        }
    }
}

/// Cache statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub default_ttl: Duration,
}

/// TTL cache with LRU eviction and pattern-based invalidation.
///
/// One cache-wide mutex guards both the entry map and the LRU order; readers
/// take it too so the two can never disagree.
#[derive(Debug)]
pub struct TtlCache<V> {
    default_ttl: Duration,
    max_size: usize,
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration, max_size: usize) -> Self {
        Self {
            default_ttl,
            max_size,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                access_order: VecDeque::new(),
            }),
        }
    }

    /// Value for `key` if present and unexpired; a hit becomes most-recent.
    /// Expired entries are removed on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let expired = match inner.entries.get(key) {
            None => return None,
            Some(entry) => entry.is_expired(Instant::now()),
        };
        if expired {
            inner.remove(key);
            return None;
        }

        inner.touch(key);
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or overwrite, stamping expiry at `now + ttl` (default TTL when
    /// `ttl` is `None`). A brand-new key at capacity evicts the LRU entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_size {
            inner.evict_lru();
        }

        inner.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        inner.touch(&key);
    }

    pub fn delete(&self, key: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.remove(key);
    }

    /// Remove every key the pattern matches.
    pub fn invalidate_pattern(&self, pattern: &Regex) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let doomed: Vec<String> = inner
            .entries
            .keys()
            .filter(|key| pattern.is_match(key))
            .cloned()
            .collect();
        for key in doomed {
            inner.remove(&key);
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.clear();
        inner.access_order.clear();
    }

    /// Sweep expired entries.
    pub fn cleanup_expired(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let doomed: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in doomed {
            inner.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            max_size: self.max_size,
            default_ttl: self.default_ttl,
        }
    }
}
