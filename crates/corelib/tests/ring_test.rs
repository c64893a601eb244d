//! Integration tests for `HashRing` against the invariants and round-trip
//! laws in `spec.md` §8.

use corelib::node::NodeId;
use corelib::ring::HashRing;
use proptest::prelude::*;
use std::collections::HashSet;

fn members(names: &[&str]) -> Vec<NodeId> {
    names.iter().map(|n| NodeId::from(*n)).collect()
}

#[test]
fn empty_membership_fails_to_build() {
    assert!(HashRing::build(&[], 64).is_err());
}

#[test]
fn single_node_owns_every_key() {
    let ring = HashRing::build(&members(&["only:50051"]), 64).unwrap();
    for key in ["a", "bb", "ccc", "very-long-key-name"] {
        assert_eq!(ring.owner(key), NodeId::from("only:50051"));
    }
}

#[test]
fn successors_are_distinct_physical_nodes() {
    let ring = HashRing::build(&members(&["a:1", "b:1", "c:1"]), 64).unwrap();
    for key in ["alpha", "beta", "durable", "legacy-only"] {
        let successors = ring.successors(key, 3);
        assert_eq!(successors.len(), 3);
        let unique: HashSet<_> = successors.iter().collect();
        assert_eq!(unique.len(), 3, "successors must be distinct nodes");
    }
}

#[test]
fn replication_factor_clamps_to_cluster_size() {
    let ring = HashRing::build(&members(&["a:1", "b:1"]), 32).unwrap();
    assert_eq!(ring.successors("k", 3).len(), 2);
}

// spec.md §8 invariant 1: all honest nodes building from the same ordered
// membership list agree on successors for every key.
#[test]
fn two_independently_built_rings_agree_on_every_key() {
    let node_list = members(&["A:50051", "B:50051", "C:50051"]);
    let ring_a = HashRing::build(&node_list, 128).unwrap();
    let ring_b = HashRing::build(&node_list, 128).unwrap();

    for key in ["alpha", "beta", "gamma", "durable", "legacy-only", "x"] {
        assert_eq!(ring_a.successors(key, 3), ring_b.successors(key, 3));
    }
}

proptest! {
    /// For any non-empty membership list and any key, building the ring
    /// twice from the same list must yield identical successor lists -
    /// the ring's sole agreement mechanism in lieu of gossip.
    #[test]
    fn ring_construction_is_deterministic(
        n in 1usize..8,
        key in "[a-zA-Z0-9_-]{1,32}",
    ) {
        let node_list: Vec<NodeId> = (0..n)
            .map(|i| NodeId::from(format!("node{i}:50051")))
            .collect();
        let ring_a = HashRing::build(&node_list, 64).unwrap();
        let ring_b = HashRing::build(&node_list, 64).unwrap();
        prop_assert_eq!(ring_a.successors(&key, 3), ring_b.successors(&key, 3));
    }

    /// successors(key, count) never returns more than min(count, |members|)
    /// entries, and never a duplicate node.
    #[test]
    fn successors_respect_the_requested_bound(
        n in 1usize..8,
        count in 0usize..10,
        key in "[a-zA-Z0-9_-]{1,32}",
    ) {
        let node_list: Vec<NodeId> = (0..n)
            .map(|i| NodeId::from(format!("node{i}:50051")))
            .collect();
        let ring = HashRing::build(&node_list, 64).unwrap();
        let successors = ring.successors(&key, count);
        prop_assert!(successors.len() <= count.min(n));
        let unique: HashSet<_> = successors.iter().collect();
        prop_assert_eq!(unique.len(), successors.len());
    }
}
