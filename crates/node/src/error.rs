//! The node-level error taxonomy (`spec.md` §7).
//!
//! `ReplicationDegraded` is deliberately absent: it is never surfaced to a
//! caller of the coordinator (`spec.md` §4.3 step 2d: "replica failures are
//! logged but do not fail the client call"), only recorded via `tracing`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// GET miss after the legacy fallback also missed.
    #[error("key not found")]
    NotFound,
    /// Owner (or a specific peer) was unreachable within its deadline.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// The durable store rejected or failed a write; the local store was
    /// left unchanged.
    #[error("durability failure: {0}")]
    DurabilityFailure(String),
    /// Empty key, oversize value, or a malformed/misrouted RPC.
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl Error {
    /// Reconstructs a node error from a wire-level [`rpc::Status`] and
    /// message, used when unpacking the reply to a forwarded call.
    pub fn from_status(status: rpc::Status, message: String) -> Self {
        match status {
            rpc::Status::NotFound => Error::NotFound,
            rpc::Status::Unavailable => Error::Unavailable(message),
            rpc::Status::DurabilityFailure => Error::DurabilityFailure(message),
            rpc::Status::ReplicationDegraded => Error::Invalid(message),
            rpc::Status::Invalid => Error::Invalid(message),
        }
    }
}

impl From<&Error> for rpc::Status {
    fn from(err: &Error) -> Self {
        match err {
            Error::NotFound => rpc::Status::NotFound,
            Error::Unavailable(_) => rpc::Status::Unavailable,
            Error::DurabilityFailure(_) => rpc::Status::DurabilityFailure,
            Error::Invalid(_) => rpc::Status::Invalid,
        }
    }
}

impl From<rpc::Error> for Error {
    fn from(err: rpc::Error) -> Self {
        Error::Unavailable(err.to_string())
    }
}

/// Any durable-store failure is a durability fault to the coordinator
/// (`spec.md` §7), regardless of whether it was a connection, constraint,
/// or protocol error at the `sqlx` level.
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::DurabilityFailure(err.to_string())
    }
}

/// A transport-level failure talking to the legacy source is never fatal
/// to a GET (`spec.md` §4.7: "transport errors are treated as absent").
/// This conversion exists so callers can use `?` against a `reqwest`
/// result and then discard the error into a miss rather than propagate it;
/// `HttpLegacySource` does exactly that after logging.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Invalid(err.to_string())
    }
}
