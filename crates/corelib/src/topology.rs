//! Read-only diagnostic view over a [`HashRing`].
//!
//! Never consulted by the request path; exists for the operator CLI's ring
//! inspection command and for tests that want a human-readable summary.

use crate::node::NodeId;
use crate::ring::HashRing;
use std::collections::HashMap;

/// Ownership and descriptive views over an already-built ring.
pub struct Topology<'a> {
    ring: &'a HashRing,
}

impl<'a> Topology<'a> {
    pub fn new(ring: &'a HashRing) -> Self {
        Self { ring }
    }

    /// Share of the ring's vnodes owned by each member, as a percentage.
    ///
    /// `HashRing::build` gives every member the same vnode count, so this
    /// is uniform by construction; it's still useful as a sanity check that
    /// the ring was built the way the caller expected.
    pub fn ownership_percentages(&self) -> HashMap<NodeId, f64> {
        let total = self.ring.vnode_count() as f64;
        if total == 0.0 {
            return HashMap::new();
        }
        let per_node = self.ring.vnodes_per_node() as f64;
        self.ring
            .members()
            .iter()
            .map(|node| (node.clone(), per_node / total * 100.0))
            .collect()
    }

    /// Human-readable summary, e.g. for `cache-cluster-cli ring describe`.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "Ring: {} member(s), {} vnode(s) ({} per member)\n",
            self.ring.members().len(),
            self.ring.vnode_count(),
            self.ring.vnodes_per_node(),
        );
        let mut shares: Vec<_> = self.ownership_percentages().into_iter().collect();
        shares.sort_by(|a, b| a.0.cmp(&b.0));
        for (node, pct) in shares {
            out.push_str(&format!("  {node}: {pct:.2}%\n"));
        }
        out
    }
}
