//! Node identity for the consistent hash ring.
//!
//! A node's identity is its stable `host:port` RPC endpoint, assigned once
//! at process start and never changed for the lifetime of the process
//! (`spec.md` §3: "Node identity"). We wrap it in an `Arc<str>` rather than
//! a plain `String` so cloning an id - which happens on every ring lookup -
//! doesn't allocate.

use std::fmt;
use std::sync::Arc;

/// Stable identifier for a node in the cluster, conventionally `host:port`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Wraps an owned or borrowed string as a node id.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Borrows the identifier as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_the_endpoint() {
        let id = NodeId::from("10.0.0.1:50051");
        assert_eq!(id.to_string(), "10.0.0.1:50051");
        assert_eq!(id.as_str(), "10.0.0.1:50051");
    }

    #[test]
    fn equal_endpoints_compare_equal() {
        assert_eq!(NodeId::from("a:1"), NodeId::from("a:1"));
        assert_ne!(NodeId::from("a:1"), NodeId::from("a:2"));
    }
}
