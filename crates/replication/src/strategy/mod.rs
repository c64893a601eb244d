//! Replication strategy abstraction.
//!
//! A strategy picks the successor list a key's writes fan out to. The spec
//! calls for exactly one (`spec.md` §3: "sequential... clockwise"), but the
//! trait seam is kept so a future topology-aware strategy (rack/DC-aware
//! placement) can be dropped in without touching the coordinator.

pub mod simple;

pub use simple::SimpleStrategy;

use corelib::{HashRing, NodeId};

/// Determines which nodes hold replicas of a given key.
pub trait ReplicationStrategy: Send + Sync + 'static {
    /// Number of replicas (including the primary/owner) this strategy
    /// targets.
    fn replication_factor(&self) -> usize;

    /// The ordered list of nodes responsible for `key`, primary first.
    fn replicas_for_key(&self, ring: &HashRing, key: &str) -> Vec<NodeId>;

    fn name(&self) -> &'static str;
}
