//! Wire protocol for the cache cluster's client and peer RPC surfaces.
//!
//! This crate owns only the message schema and the framing codec
//! (`spec.md` §6); the server loop, the coordinator, and the per-peer
//! connection pool that use them live in the `node` crate.

pub mod codec;
pub mod error;
pub mod protocol;

pub use codec::MessageCodec;
pub use error::{Error, Result};
pub use protocol::{Message, Op, Status, PROTOCOL_VERSION};
