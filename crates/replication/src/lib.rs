//! Pluggable replication strategies for the cache cluster.
//!
//! Determines, for a given key, which nodes besides the owner should
//! receive a best-effort replica of its value (`spec.md` §4.3 step 2c).

pub mod strategy;

pub use strategy::{ReplicationStrategy, SimpleStrategy};
