//! Keyed auxiliary lookups with last-writer-wins resolution.
//!
//! The host performs the actual fetch. The cache hands out a [`Ticket`] per
//! request and accepts a result only if no newer request for the same key has
//! already resolved. Nothing is cancelled; stale results are dropped.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::cache::{KeyValueStore, TtlCache};

/// Proof of an issued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: String,
    seq: u64,
}

impl Ticket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// What the panel shows for one key.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupState<'a, V> {
    Idle,
    Pending,
    Ready(&'a V),
    Failed(&'a str),
}

#[derive(Debug)]
enum Slot<V> {
    Pending,
    Ready(V),
    Failed(String),
}

#[derive(Debug)]
struct Entry<V> {
    issued: u64,
    resolved: u64,
    slot: Slot<V>,
}

/// Lookup results keyed by string, persisted through a [`TtlCache`].
#[derive(Debug)]
pub struct LookupCache<V, S> {
    cache: TtlCache<S>,
    seq: u64,
    entries: HashMap<String, Entry<V>>,
}

impl<V, S> LookupCache<V, S>
where
    V: Serialize + DeserializeOwned,
    S: KeyValueStore,
{
    pub fn new(cache: TtlCache<S>) -> Self {
        LookupCache {
            cache,
            seq: 0,
            entries: HashMap::new(),
        }
    }

    /// Starts a lookup for `key` unless a fresh value is already known.
    ///
    /// Returns `None` on a hit; the value is then available through
    /// [`get`](Self::get).
    pub fn request(&mut self, key: &str, now: u64) -> Option<Ticket> {
        if let Some(Entry {
            slot: Slot::Ready(_),
            ..
        }) = self.entries.get(key)
        {
            return None;
        }
        if let Some(value) = self.cache.get::<V>(key, now) {
            trace!(key, "lookup served from cache");
            self.entries.insert(
                key.to_string(),
                Entry {
                    issued: 0,
                    resolved: 0,
                    slot: Slot::Ready(value),
                },
            );
            return None;
        }

        self.seq += 1;
        let seq = self.seq;
        let entry = self.entries.entry(key.to_string()).or_insert(Entry {
            issued: 0,
            resolved: 0,
            slot: Slot::Pending,
        });
        entry.issued = seq;
        entry.slot = Slot::Pending;
        Some(Ticket {
            key: key.to_string(),
            seq,
        })
    }

    /// Records the outcome of a lookup.
    ///
    /// Returns `false` if a newer request for the key already resolved and
    /// this result was dropped.
    pub fn complete(&mut self, ticket: Ticket, result: Result<V, String>, now: u64) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            debug!(key = %ticket.key, "dropping result for forgotten lookup");
            return false;
        };
        if entry.resolved > ticket.seq {
            debug!(key = %ticket.key, seq = ticket.seq, "dropping stale lookup result");
            return false;
        }
        entry.resolved = ticket.seq;
        match result {
            Ok(value) => {
                if let Err(err) = self.cache.put(&ticket.key, &value, now) {
                    warn!(key = %ticket.key, error = %err, "could not persist lookup result");
                }
                entry.slot = Slot::Ready(value);
            }
            Err(reason) => {
                warn!(key = %ticket.key, %reason, "lookup failed");
                if !matches!(entry.slot, Slot::Ready(_)) {
                    entry.slot = Slot::Failed(reason);
                }
            }
        }
        true
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        match self.entries.get(key).map(|e| &e.slot) {
            Some(Slot::Ready(value)) => Some(value),
            _ => None,
        }
    }

    pub fn state(&self, key: &str) -> LookupState<'_, V> {
        match self.entries.get(key).map(|e| &e.slot) {
            None => LookupState::Idle,
            Some(Slot::Pending) => LookupState::Pending,
            Some(Slot::Ready(value)) => LookupState::Ready(value),
            Some(Slot::Failed(reason)) => LookupState::Failed(reason),
        }
    }

    /// Forgets a failed lookup so the next demand retries it.
    pub fn reset(&mut self, key: &str) {
        if let Some(Entry {
            slot: Slot::Failed(_),
            ..
        }) = self.entries.get(key)
        {
            self.entries.remove(key);
        }
    }

    /// Iterates over resolved values.
    pub fn ready(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().filter_map(|(key, entry)| match &entry.slot {
            Slot::Ready(value) => Some((key.as_str(), value)),
            _ => None,
        })
    }
}
