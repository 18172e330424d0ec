//! Keyed trailing-edge debouncing.
//!
//! A value pushed under a key fires once the key has been quiet for the delay.
//! A later push under the same key supersedes the pending one.

use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Debouncer<K, V> {
    delay_ms: u64,
    pending: BTreeMap<K, (u64, V)>,
}

impl<K: Ord + Clone, V> Debouncer<K, V> {
    pub fn new(delay_ms: u64) -> Self {
        Debouncer {
            delay_ms,
            pending: BTreeMap::new(),
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Schedules `value` for `key`, replacing anything pending for it.
    pub fn push(&mut self, key: K, value: V, now: u64) {
        let deadline = now.saturating_add(self.delay_ms);
        self.pending.insert(key, (deadline, value));
    }

    /// Removes and returns every entry whose deadline has passed.
    pub fn due(&mut self, now: u64) -> Vec<(K, V)> {
        let ready: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, (deadline, _))| *deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        ready
            .into_iter()
            .filter_map(|key| self.pending.remove(&key).map(|(_, value)| (key, value)))
            .collect()
    }

    /// Drops the pending entry for `key`.
    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|(_, value)| value)
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Earliest pending deadline, for hosts that schedule a single timer.
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.values().map(|(deadline, _)| *deadline).min()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
