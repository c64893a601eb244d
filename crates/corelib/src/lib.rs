//! Core ring library: the cluster's consistent-hashing partitioner.
//!
//! This crate provides the fundamental abstractions of the data plane's
//! partitioning layer:
//! - [`node::NodeId`]: a node's stable `host:port` identity
//! - [`token::Token`]: a 64-bit position in the hash ring's token space
//! - [`vnode::VirtualNode`]: one of a node's `V` ring positions
//! - [`ring::HashRing`]: the immutable, deterministic key -> successors map
//! - [`topology::Topology`]: a read-only diagnostic view over a ring
//!
//! Everything here is pure and synchronous: no I/O, no async runtime. The
//! networked, stateful parts of the cluster (the local store, the RPC
//! server, the coordinator) live in the `node` crate and depend on this one.

pub mod error;
pub mod node;
pub mod ring;
pub mod token;
pub mod topology;
pub mod vnode;

pub use error::{Error, Result};
pub use node::NodeId;
pub use ring::HashRing;
pub use token::Token;
pub use topology::Topology;
pub use vnode::VirtualNode;
