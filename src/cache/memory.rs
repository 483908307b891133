use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};

use lru::LruCache;
use serde_json::Value;
use time::OffsetDateTime;

use super::backend::{CacheBackend, CacheEntry};
use super::clock::{Clock, SystemClock};
use super::error::CacheError;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::memory";

/// In-process LRU backend. Expired entries are dropped when read.
pub struct MemoryCache {
    entries: RwLock<LruCache<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    /// A zero capacity is clamped to one entry.
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            clock,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(capacity, Arc::new(SystemClock))
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryCache {
    fn retrieve(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let now = self.clock.now();
        let mut entries = rw_write(&self.entries, SOURCE, "retrieve");
        let fresh = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.clone()),
            Some(_) => None,
            None => return Ok(None),
        };
        if fresh.is_none() {
            entries.pop(key);
        }
        Ok(fresh)
    }

    fn set(
        &self,
        key: &str,
        value: Value,
        expires: Option<OffsetDateTime>,
    ) -> Result<bool, CacheError> {
        let entry = CacheEntry::new(value, self.clock.now(), expires);
        rw_write(&self.entries, SOURCE, "set").put(key.to_string(), entry);
        Ok(true)
    }

    fn remove(&self, key: &str) -> Result<bool, CacheError> {
        Ok(rw_write(&self.entries, SOURCE, "remove").pop(key).is_some())
    }

    fn flush(&self) -> Result<bool, CacheError> {
        rw_write(&self.entries, SOURCE, "flush").clear();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::Duration;
    use time::macros::datetime;

    use super::*;
    use crate::cache::clock::ManualClock;

    #[test]
    fn expired_entries_are_evicted_on_read() {
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 0:00 UTC)));
        let cache = MemoryCache::new(4, clock.clone());

        cache
            .set("a", json!("v"), Some(datetime!(2024-01-01 0:10 UTC)))
            .expect("set");
        assert_eq!(cache.get("a").expect("get"), Some(json!("v")));

        clock.advance(Duration::minutes(10));
        assert_eq!(cache.get("a").expect("get"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn least_recently_used_entries_are_evicted() {
        let cache = MemoryCache::with_capacity(2);
        cache.set("a", json!(1), None).expect("set");
        cache.set("b", json!(2), None).expect("set");
        cache.get("a").expect("touch a");
        cache.set("c", json!(3), None).expect("set");

        assert_eq!(cache.get("a").expect("get"), Some(json!(1)));
        assert_eq!(cache.get("b").expect("get"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn remove_reports_presence() {
        let cache = MemoryCache::with_capacity(0);
        cache.set("a", json!(1), None).expect("set");
        assert!(cache.remove("a").expect("remove"));
        assert!(!cache.remove("a").expect("remove again"));
    }
}
