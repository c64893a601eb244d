//! The spec's replication strategy: N replicas placed sequentially
//! clockwise around the ring from the key's primary owner (`spec.md` §3,
//! §4.1 "successor list").

use crate::strategy::ReplicationStrategy;
use corelib::{HashRing, NodeId};

/// `N` replicas (the owner plus `N - 1` successors), in ring order.
#[derive(Debug, Clone)]
pub struct SimpleStrategy {
    replication_factor: usize,
}

impl SimpleStrategy {
    pub fn new(replication_factor: usize) -> Self {
        Self { replication_factor }
    }
}

impl Default for SimpleStrategy {
    /// `REPLICATION_N` defaults to 3 per `spec.md` §6.
    fn default() -> Self {
        Self::new(3)
    }
}

impl ReplicationStrategy for SimpleStrategy {
    fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    fn replicas_for_key(&self, ring: &HashRing, key: &str) -> Vec<NodeId> {
        ring.successors(key, self.replication_factor)
    }

    fn name(&self) -> &'static str {
        "SimpleStrategy"
    }
}
