//! Concurrent map with per-entry time-to-live.
//!
//! Expired entries are invisible to readers and are physically removed either
//! lazily on access or by [`TtlMap::purge_expired`].

use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as Slot;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> Entry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.stored_at.elapsed() >= ttl)
    }
}

#[derive(Debug)]
pub struct TtlMap<V> {
    entries: DashMap<String, Entry<V>>,
    /// `None` keeps entries until explicitly removed
    ttl: Option<Duration>,
}

impl<V: Clone> TtlMap<V> {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Insert or overwrite, returning the previous live value
    pub fn put(&self, key: &str, value: V) -> Option<V> {
        let ttl = self.ttl;
        self.entries
            .insert(key.to_string(), Entry::new(value))
            .filter(|old| !old.is_expired(ttl))
            .map(|old| old.value)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        // guard from `get` is dropped before touching the shard again
        if expired {
            let ttl = self.ttl;
            self.entries.remove_if(key, |_, e| e.is_expired(ttl));
        }
        None
    }

    /// Atomic read-and-delete
    pub fn take(&self, key: &str) -> Option<V> {
        let ttl = self.ttl;
        self.entries
            .remove(key)
            .filter(|(_, e)| !e.is_expired(ttl))
            .map(|(_, e)| e.value)
    }

    /// Apply `f` to the entry under the shard lock, inserting `init()` first
    /// when absent or expired. Refreshes the entry's age.
    pub fn upsert<I, F>(&self, key: &str, init: I, f: F) -> V
    where
        I: FnOnce() -> V,
        F: FnOnce(&mut V),
    {
        let ttl = self.ttl;
        match self.entries.entry(key.to_string()) {
            Slot::Occupied(mut occupied) => {
                if occupied.get().is_expired(ttl) {
                    occupied.insert(Entry::new(init()));
                }
                let entry = occupied.get_mut();
                f(&mut entry.value);
                entry.stored_at = Instant::now();
                entry.value.clone()
            }
            Slot::Vacant(vacant) => {
                let mut value = init();
                f(&mut value);
                vacant.insert(Entry::new(value.clone()));
                value
            }
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(ttl));
        before.saturating_sub(self.entries.len())
    }

    /// Live and not-yet-purged entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
