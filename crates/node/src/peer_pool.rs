//! Outbound connections to sibling nodes (`spec.md` §4.4, §4.5).
//!
//! One lazily-established TCP connection per peer, reconnected on the next
//! call after any failure. There is no connection supervisor and no retry
//! inside a single `call`: a failed call returns `Error::Unavailable` and it
//! is up to the caller (the coordinator) to decide whether that is fatal.

use futures::SinkExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::Framed;

use corelib::NodeId;
use rpc::{Message, MessageCodec};

use crate::error::{Error, Result};

type PeerConn = Framed<TcpStream, MessageCodec>;

struct Slot {
    addr: String,
    conn: Mutex<Option<PeerConn>>,
}

/// Connection pool keyed by peer [`NodeId`]. `NodeId`'s string form is also
/// its dial address (`spec.md` GLOSSARY: "Node identifier ... typically
/// `host:port`").
pub struct PeerPool {
    slots: HashMap<NodeId, Slot>,
}

impl PeerPool {
    pub fn new(peers: impl IntoIterator<Item = NodeId>) -> Self {
        let slots = peers
            .into_iter()
            .map(|id| {
                let addr = id.as_str().to_string();
                (id, Slot { addr, conn: Mutex::new(None) })
            })
            .collect();
        Self { slots }
    }

    /// Sends `message` to `peer` and awaits one reply, bounded by `deadline`.
    pub async fn call(&self, peer: &NodeId, message: Message, deadline: Duration) -> Result<Message> {
        let slot = self
            .slots
            .get(peer)
            .ok_or_else(|| Error::Invalid(format!("unknown peer {peer}")))?;

        tokio::time::timeout(deadline, self.call_inner(slot, message))
            .await
            .map_err(|_| Error::Unavailable(format!("{peer} timed out")))?
    }

    async fn call_inner(&self, slot: &Slot, message: Message) -> Result<Message> {
        let mut guard = slot.conn.lock().await;

        if guard.is_none() {
            *guard = Some(Self::dial(&slot.addr).await?);
        }

        match Self::round_trip(guard.as_mut().unwrap(), message.clone()).await {
            Ok(reply) => Ok(reply),
            Err(_) => {
                // stale connection, reconnect once and retry the single call
                let mut fresh = Self::dial(&slot.addr).await?;
                let reply = Self::round_trip(&mut fresh, message).await?;
                *guard = Some(fresh);
                Ok(reply)
            }
        }
    }

    async fn dial(addr: &str) -> Result<PeerConn> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::Unavailable(format!("connect to {addr} failed: {e}")))?;
        Ok(Framed::new(stream, MessageCodec::new()))
    }

    async fn round_trip(conn: &mut PeerConn, message: Message) -> Result<Message> {
        use futures::StreamExt;

        conn.send(message)
            .await
            .map_err(|e| Error::Unavailable(e.to_string()))?;
        match conn.next().await {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(Error::Unavailable(e.to_string())),
            None => Err(Error::Unavailable("peer closed connection".into())),
        }
    }

    pub fn peers(&self) -> impl Iterator<Item = &NodeId> {
        self.slots.keys()
    }
}
