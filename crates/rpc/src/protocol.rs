//! The wire schema (`spec.md` §6): client and peer RPC messages.
//!
//! Client and peer calls use disjoint message variants (`Get` vs.
//! `InternalGet`, etc.) precisely so the server can enforce the anti-loop
//! rule in `spec.md` §4.3 by pattern-matching on which surface a request
//! arrived on, without any extra envelope field.

use serde::{Deserialize, Serialize};

/// Bumped whenever the wire schema changes incompatibly. Frames carrying a
/// different version are rejected before their payload is even decoded.
pub const PROTOCOL_VERSION: u8 = 1;

/// The mutation an entry in a `Replicate` message is undergoing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Set,
    Delete,
}

/// Coarse error classification mirroring the taxonomy in `spec.md` §7.
///
/// Carried on the wire inside a generic [`Message::Error`] reply for calls
/// whose happy-path reply shape has no room for an error detail (forwarded
/// calls, anti-loop violations); calls that have one (`SetReply.err`,
/// `GetReply.found`) encode failure in-band instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    NotFound,
    Unavailable,
    DurabilityFailure,
    ReplicationDegraded,
    Invalid,
}

/// A single RPC request or reply frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    // ---- Client surface ----
    Get { key: String },
    GetReply { found: bool, value: Vec<u8> },
    Set { key: String, value: Vec<u8> },
    SetReply { ok: bool, err: Option<String> },
    Delete { key: String },
    DeleteReply { ok: bool },

    // ---- Peer surface ----
    /// Forwarded client GET: only valid when the receiver is the owner.
    InternalGet { key: String },
    /// Forwarded client SET: only valid when the receiver is the owner.
    InternalSet { key: String, value: Vec<u8> },
    /// Forwarded client DELETE: only valid when the receiver is the owner.
    InternalDelete { key: String },
    /// Best-effort replication of an owner's write to a successor.
    Replicate { key: String, op: Op, value: Vec<u8> },
    Ack { ok: bool },

    /// Generic failure reply, carrying a [`Status`] and a human-readable
    /// message, for calls with no in-band error shape of their own.
    Error { status: Status, message: String },
}

impl Message {
    /// True for messages that may only legally arrive on the peer surface.
    pub fn is_peer_only(&self) -> bool {
        matches!(
            self,
            Message::InternalGet { .. }
                | Message::InternalSet { .. }
                | Message::InternalDelete { .. }
                | Message::Replicate { .. }
        )
    }
}
