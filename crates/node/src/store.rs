//! The per-node in-memory store (`spec.md` §4.2).
//!
//! Backed by `DashMap`, which shards its internal table and locks only the
//! shard a key hashes into - concurrent callers touching different keys
//! never contend, and callers touching the same key serialize through that
//! shard's lock, exactly matching "for a single key, operations are
//! serialized" (`spec.md` §4.2). No TTL, no eviction, no local persistence:
//! all out of scope by `spec.md` §1.

use bytes::Bytes;
use dashmap::DashMap;

#[derive(Default)]
pub struct LocalStore {
    entries: DashMap<String, Bytes>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn set(&self, key: &str, value: Bytes) {
        self.entries.insert(key.to_string(), value);
    }

    /// Removes the key. Returns whether it had been present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
