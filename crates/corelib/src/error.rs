//! Error types for the core ring library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying a [`crate::HashRing`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// `HashRing::build` was called with an empty membership list.
    #[error("ring cannot be built from an empty membership list")]
    EmptyMembership,
    /// `HashRing::build` was called with zero virtual nodes per member.
    #[error("vnodes per node must be at least 1")]
    InvalidVnodeCount,
}
