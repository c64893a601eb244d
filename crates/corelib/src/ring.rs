//! Consistent-hash ring: the cluster's sole agreement mechanism.
//!
//! Every node builds a `HashRing` from the same ordered membership list at
//! boot. Because construction is a pure function of that list, every node's
//! ring is byte-identical, and `successors(key, _)` returns the same answer
//! everywhere without any gossip or consensus round (`spec.md` §3, §4.1,
//! invariant 1).

use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::token::Token;
use crate::vnode::VirtualNode;
use std::collections::{BTreeMap, HashSet};

/// An immutable mapping from token-space positions to physical nodes.
///
/// Internally a `BTreeMap` keyed by `(Token, seed)` so that two virtual
/// nodes that hash to the same token are ordered deterministically by their
/// pre-hash seed string rather than by map insertion order.
#[derive(Clone, Debug)]
pub struct HashRing {
    positions: BTreeMap<(Token, Box<str>), NodeId>,
    members: Vec<NodeId>,
    vnodes_per_node: usize,
}

impl HashRing {
    /// Builds a ring from an ordered, non-empty membership list.
    ///
    /// Every member contributes `vnodes` virtual nodes. Fails if `members`
    /// is empty or `vnodes` is zero.
    pub fn build(members: &[NodeId], vnodes: usize) -> Result<Self> {
        if members.is_empty() {
            return Err(Error::EmptyMembership);
        }
        if vnodes == 0 {
            return Err(Error::InvalidVnodeCount);
        }

        let mut positions = BTreeMap::new();
        for node in members {
            for i in 0..vnodes {
                let vnode = VirtualNode::from_index(node, i);
                positions.insert((vnode.token, vnode.seed), vnode.node);
            }
        }

        Ok(Self {
            positions,
            members: members.to_vec(),
            vnodes_per_node: vnodes,
        })
    }

    /// Returns up to `min(count, members.len())` distinct physical nodes
    /// responsible for `key`: the primary owner first, then successors
    /// continuing clockwise around the ring, wrapping at the top of the
    /// token space (`spec.md` §4.1).
    pub fn successors(&self, key: &str, count: usize) -> Vec<NodeId> {
        let count = count.min(self.members.len());
        if count == 0 {
            return Vec::new();
        }

        let target = Token::of_str(key);
        // The empty seed sorts before every real seed, so this lower bound
        // includes a vnode whose token exactly equals `target` regardless
        // of its seed.
        let lower = (target, Box::<str>::default());

        let mut seen = HashSet::with_capacity(count);
        let mut owners = Vec::with_capacity(count);
        // Walk clockwise from `target`, then wrap by re-walking from the
        // start; nodes already collected are skipped via `seen`.
        for (_, node) in self.positions.range(lower..).chain(self.positions.iter()) {
            if seen.insert(node.clone()) {
                owners.push(node.clone());
                if owners.len() == count {
                    break;
                }
            }
        }
        owners
    }

    /// The primary owner of `key`, equivalent to `successors(key, 1)[0]`.
    pub fn owner(&self, key: &str) -> NodeId {
        self.successors(key, 1)
            .into_iter()
            .next()
            .expect("a ring built via HashRing::build is never empty")
    }

    /// The ordered membership list the ring was built from.
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Total number of virtual node positions on the ring.
    pub fn vnode_count(&self) -> usize {
        self.positions.len()
    }

    /// Virtual nodes contributed per physical member.
    pub fn vnodes_per_node(&self) -> usize {
        self.vnodes_per_node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(n: usize) -> Vec<NodeId> {
        (0..n).map(|i| NodeId::from(format!("node{i}:50051"))).collect()
    }

    #[test]
    fn empty_membership_fails() {
        assert_eq!(HashRing::build(&[], 64).unwrap_err(), Error::EmptyMembership);
    }

    #[test]
    fn zero_vnodes_fails() {
        assert_eq!(
            HashRing::build(&members(1), 0).unwrap_err(),
            Error::InvalidVnodeCount
        );
    }

    #[test]
    fn successors_are_distinct_and_deterministic() {
        let ring = HashRing::build(&members(5), 64).unwrap();
        let a = ring.successors("alpha", 3);
        let b = ring.successors("alpha", 3);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        let unique: HashSet<_> = a.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn count_exceeding_membership_clamps() {
        let ring = HashRing::build(&members(2), 16).unwrap();
        assert_eq!(ring.successors("k", 10).len(), 2);
    }

    #[test]
    fn owner_is_first_successor() {
        let ring = HashRing::build(&members(4), 32).unwrap();
        assert_eq!(ring.owner("k"), ring.successors("k", 1)[0]);
    }

    #[test]
    fn two_rings_from_same_membership_agree_on_every_key() {
        let a = HashRing::build(&members(3), 64).unwrap();
        let b = HashRing::build(&members(3), 64).unwrap();
        for key in ["a", "bb", "ccc", "durable", "legacy-only", ""] {
            if key.is_empty() {
                continue;
            }
            assert_eq!(a.successors(key, 3), b.successors(key, 3));
        }
    }
}
