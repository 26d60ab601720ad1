//! Local (L1) tier: in-process TTL map bounded by entry count.
//!
//! ## Eviction
//!
//! Entries are kept in insertion order. When an insert pushes the map over its
//! bound, the oldest-inserted entries are dropped first (FIFO). Overwriting a
//! key keeps its original position.
//!
//! Expired entries are removed lazily: on the `get` that finds them, and in a
//! sweep that runs before every insert.

use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;

/// A cached serialized value with its expiry.
///
/// The value is the same string stored in Redis, wrapped in `Arc` so hits
/// are a pointer clone.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub value: Arc<str>,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn new(value: Arc<str>, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Check if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    #[inline]
    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of a [`LocalTier::set`], used for metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Entries removed by the pre-insert sweep.
    pub expired: usize,
    /// Entries removed to honour the size bound.
    pub evicted: usize,
}

/// In-process cache tier.
#[derive(Debug, Default)]
pub struct LocalTier {
    entries: Mutex<IndexMap<String, CacheEntry>>,
}

impl LocalTier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a live value. An expired entry is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        let mut entries = self.entries.lock();
        let index = entries.get_index_of(key)?;
        if entries[index].is_expired() {
            // shift_remove keeps the insertion order of the remaining entries
            entries.shift_remove_index(index);
            return None;
        }
        Some(Arc::clone(&entries[index].value))
    }

    /// Insert or overwrite `key`, then trim the map to `max_entries`.
    pub fn set(
        &self,
        key: &str,
        value: Arc<str>,
        ttl: Duration,
        max_entries: usize,
    ) -> InsertOutcome {
        let mut entries = self.entries.lock();

        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        let expired = before - entries.len();

        entries.insert(key.to_string(), CacheEntry::new(value, ttl));

        let max_entries = max_entries.max(1);
        let mut evicted = 0;
        while entries.len() > max_entries {
            entries.shift_remove_index(0);
            evicted += 1;
        }

        InsertOutcome { expired, evicted }
    }

    /// Remove `key`. Returns `true` if an entry (live or expired) was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().shift_remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Keys in eviction order (oldest first).
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_get_set() {
        let tier = LocalTier::new();
        tier.set("ns:a", value(r#"{"x":1}"#), MINUTE, 10);

        assert_eq!(tier.get("ns:a").as_deref(), Some(r#"{"x":1}"#));
        assert!(tier.get("ns:missing").is_none());
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_removed_on_get() {
        let tier = LocalTier::new();
        tier.set("ns:a", value("1"), Duration::from_millis(20), 10);

        std::thread::sleep(Duration::from_millis(40));

        assert!(tier.get("ns:a").is_none());
        assert!(tier.is_empty());
    }

    #[test]
    fn test_sweep_before_insert() {
        let tier = LocalTier::new();
        tier.set("ns:a", value("1"), Duration::from_millis(20), 10);
        tier.set("ns:b", value("2"), Duration::from_millis(20), 10);

        std::thread::sleep(Duration::from_millis(40));

        let outcome = tier.set("ns:c", value("3"), MINUTE, 10);
        assert_eq!(outcome, InsertOutcome { expired: 2, evicted: 0 });
        assert_eq!(tier.keys(), vec!["ns:c".to_string()]);
    }

    #[test]
    fn test_fifo_eviction() {
        let tier = LocalTier::new();
        tier.set("ns:a", value("a"), MINUTE, 2);
        tier.set("ns:b", value("b"), MINUTE, 2);
        let outcome = tier.set("ns:c", value("c"), MINUTE, 2);

        assert_eq!(outcome.evicted, 1);
        assert_eq!(tier.len(), 2);
        assert!(tier.get("ns:a").is_none());
        assert_eq!(tier.get("ns:b").as_deref(), Some("b"));
        assert_eq!(tier.get("ns:c").as_deref(), Some("c"));
    }

    #[test]
    fn test_eviction_ignores_access_recency() {
        let tier = LocalTier::new();
        tier.set("ns:a", value("a"), MINUTE, 2);
        tier.set("ns:b", value("b"), MINUTE, 2);

        // Reading "a" does not protect it
        assert!(tier.get("ns:a").is_some());
        tier.set("ns:c", value("c"), MINUTE, 2);

        assert_eq!(tier.keys(), vec!["ns:b".to_string(), "ns:c".to_string()]);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let tier = LocalTier::new();
        tier.set("ns:a", value("a1"), MINUTE, 2);
        tier.set("ns:b", value("b"), MINUTE, 2);
        tier.set("ns:a", value("a2"), MINUTE, 2);
        assert_eq!(tier.len(), 2);
        assert_eq!(tier.get("ns:a").as_deref(), Some("a2"));

        tier.set("ns:c", value("c"), MINUTE, 2);
        assert!(tier.get("ns:a").is_none());
        assert_eq!(tier.keys(), vec!["ns:b".to_string(), "ns:c".to_string()]);
    }

    #[test]
    fn test_smaller_bound_trims_many() {
        let tier = LocalTier::new();
        for i in 0..10 {
            tier.set(&format!("ns:{i}"), value("v"), MINUTE, 100);
        }
        let outcome = tier.set("ns:last", value("v"), MINUTE, 3);

        assert_eq!(outcome.evicted, 8);
        assert_eq!(
            tier.keys(),
            vec!["ns:8".to_string(), "ns:9".to_string(), "ns:last".to_string()]
        );
    }

    #[test]
    fn test_size_never_exceeds_bound() {
        let tier = LocalTier::new();
        for i in 0..200 {
            let bound = 1 + (i % 7);
            tier.set(&format!("ns:{}", i % 13), value("v"), MINUTE, bound);
            assert!(tier.len() <= bound);
        }
    }

    #[test]
    fn test_zero_bound_keeps_latest_write() {
        let tier = LocalTier::new();
        tier.set("ns:a", value("a"), MINUTE, 0);
        assert_eq!(tier.get("ns:a").as_deref(), Some("a"));
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let tier = LocalTier::new();
        tier.set("ns:a", value("a"), MINUTE, 10);
        tier.set("ns:b", value("b"), MINUTE, 10);

        assert!(tier.remove("ns:a"));
        assert!(!tier.remove("ns:a"));
        assert!(tier.get("ns:a").is_none());

        tier.clear();
        assert!(tier.is_empty());
    }

    #[test]
    fn test_concurrent_writers_respect_bound() {
        let tier = Arc::new(LocalTier::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let tier = Arc::clone(&tier);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        tier.set(&format!("ns:{t}:{i}"), value("v"), MINUTE, 50);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tier.len(), 50);
    }
}
