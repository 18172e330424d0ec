//! Time-limited cache over a host key-value store.
//!
//! Entries are stored as JSON objects `{"ts": <ms>, "value": ...}`. An entry
//! that cannot be parsed, or that is older than the TTL, reads as a miss and
//! is removed.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};

/// Abstraction over the host's persistent string store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String) -> Result<()>;

    fn remove(&self, key: &str);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

#[derive(Serialize, Deserialize)]
struct Entry<V> {
    ts: u64,
    value: V,
}

#[derive(Serialize)]
struct EntryRef<'a, V> {
    ts: u64,
    value: &'a V,
}

/// Cache of JSON values with a time-to-live.
#[derive(Debug, Clone)]
pub struct TtlCache<S> {
    store: S,
    ttl_ms: u64,
    prefix: String,
}

impl<S: KeyValueStore> TtlCache<S> {
    pub fn new(store: S, ttl_ms: u64) -> Self {
        TtlCache {
            store,
            ttl_ms,
            prefix: String::new(),
        }
    }

    /// Namespaces every key, e.g. `"vitrine:editions:"`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// Reads a fresh entry.
    pub fn get<V: DeserializeOwned>(&self, key: &str, now: u64) -> Option<V> {
        let full = self.full_key(key);
        let raw = self.store.get(&full)?;
        match serde_json::from_str::<Entry<V>>(&raw) {
            Ok(entry) if now.saturating_sub(entry.ts) < self.ttl_ms => Some(entry.value),
            Ok(_) => {
                debug!(key = %full, "cache entry expired");
                self.store.remove(&full);
                None
            }
            Err(err) => {
                warn!(key = %full, error = %err, "discarding unreadable cache entry");
                self.store.remove(&full);
                None
            }
        }
    }

    /// Writes an entry stamped with `now`.
    pub fn put<V: Serialize>(&self, key: &str, value: &V, now: u64) -> Result<()> {
        let full = self.full_key(key);
        let raw = serde_json::to_string(&EntryRef { ts: now, value })
            .map_err(|source| BridgeError::Encode {
                key: full.clone(),
                source,
            })?;
        self.store.set(&full, raw)
    }

    pub fn invalidate(&self, key: &str) {
        self.store.remove(&self.full_key(key));
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: u64 = 3_600_000;

    #[test]
    fn round_trips_within_ttl() {
        let cache = TtlCache::new(MemoryStore::new(), HOUR);
        cache.put("editions", &vec!["Alpha", "Beta"], 1_000).unwrap();
        let names: Option<Vec<String>> = cache.get("editions", 1_000 + HOUR - 1);
        assert_eq!(names, Some(vec!["Alpha".to_string(), "Beta".to_string()]));
    }

    #[test]
    fn stored_shape_has_timestamp() {
        let store = MemoryStore::new();
        let cache = TtlCache::new(store.clone(), HOUR).with_prefix("v:");
        cache.put("k", &42, 7).unwrap();
        assert_eq!(store.get("v:k").as_deref(), Some(r#"{"ts":7,"value":42}"#));
    }

    #[test]
    fn expired_entries_are_misses() {
        let store = MemoryStore::new();
        let cache = TtlCache::new(store.clone(), HOUR);
        cache.put("k", &1, 0).unwrap();
        assert_eq!(cache.get::<i32>("k", HOUR), None);
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_entries_are_misses() {
        let store = MemoryStore::new();
        store.set("k", "{not json".to_string()).unwrap();
        store.set("shape", r#"{"value":1}"#.to_string()).unwrap();
        let cache = TtlCache::new(store.clone(), HOUR);
        assert_eq!(cache.get::<i32>("k", 0), None);
        assert_eq!(cache.get::<i32>("shape", 0), None);
        assert!(store.is_empty());
    }

    #[test]
    fn invalidate_removes() {
        let cache = TtlCache::new(MemoryStore::new(), HOUR);
        cache.put("k", &"v", 0).unwrap();
        cache.invalidate("k");
        assert_eq!(cache.get::<String>("k", 0), None);
    }
}
