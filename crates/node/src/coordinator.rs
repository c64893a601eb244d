//! The coordinator: per-request orchestration (`spec.md` §4.3).
//!
//! Every inbound request, whether from a client or forwarded by a peer,
//! passes through one of [`Coordinator::get`], [`Coordinator::set`], or
//! [`Coordinator::delete`]. `origin` distinguishes the two surfaces so the
//! anti-loop rule can be enforced without a second code path.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rpc::{Message, Op};

use corelib::{HashRing, NodeId};
use replication::ReplicationStrategy;

use crate::durable::DurableStore;
use crate::error::{Error, Result};
use crate::legacy::LegacySource;
use crate::peer_pool::PeerPool;
use crate::store::LocalStore;

/// Bound on a single replication fan-out RPC (`spec.md` §4.3 step 2c).
pub const REPLICATION_DEADLINE: Duration = Duration::from_millis(250);

/// Overall deadline for a client-facing operation (`spec.md` §5).
pub const CLIENT_DEADLINE: Duration = Duration::from_secs(2);

/// Where a request entered the cluster from.
///
/// `Peer` requests have already been routed once; if this node is not the
/// owner, receiving one is a stale-ring condition and must fail rather than
/// be forwarded again (`spec.md` §4.3 "Forwarding anti-loop").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Client,
    Peer,
}

pub struct Coordinator {
    self_id: NodeId,
    ring: HashRing,
    strategy: Arc<dyn ReplicationStrategy>,
    store: Arc<LocalStore>,
    durable: Arc<dyn DurableStore>,
    legacy: Arc<dyn LegacySource>,
    peers: Arc<PeerPool>,
}

impl Coordinator {
    pub fn new(
        self_id: NodeId,
        ring: HashRing,
        strategy: Arc<dyn ReplicationStrategy>,
        store: Arc<LocalStore>,
        durable: Arc<dyn DurableStore>,
        legacy: Arc<dyn LegacySource>,
        peers: Arc<PeerPool>,
    ) -> Self {
        Self { self_id, ring, strategy, store, durable, legacy, peers }
    }

    pub fn self_id(&self) -> &NodeId {
        &self.self_id
    }

    /// `spec.md` §4.3 GET.
    pub async fn get(&self, key: &str, origin: Origin) -> Result<Option<Bytes>> {
        if key.is_empty() {
            return Err(Error::Invalid("empty key".into()));
        }

        let owner = self.ring.owner(key);
        if owner != self.self_id {
            return match origin {
                Origin::Peer => Err(Error::Invalid(format!(
                    "received InternalGet for {key} but owner is {owner}, not self"
                ))),
                Origin::Client => {
                    let reply = self
                        .peers
                        .call(&owner, Message::InternalGet { key: key.to_string() }, CLIENT_DEADLINE)
                        .await?;
                    match reply {
                        Message::GetReply { found: true, value } => Ok(Some(Bytes::from(value))),
                        Message::GetReply { found: false, .. } => Ok(None),
                        Message::Error { status, message } => Err(Error::from_status(status, message)),
                        other => Err(Error::Invalid(format!("unexpected reply to InternalGet: {other:?}"))),
                    }
                }
            };
        }

        if let Some(value) = self.store.get(key) {
            return Ok(Some(value));
        }

        // Open question (a), spec.md §9: an owner that restarted with an
        // empty Local Store but a populated durable store lazy-loads from
        // it on miss, chained ahead of the legacy source.
        if let Some(value) = self.durable.get(key).await? {
            let value = Bytes::from(value);
            self.store.set(key, value.clone());
            return Ok(Some(value));
        }

        match self.legacy.fetch(key).await? {
            Some(value) => {
                let value = Bytes::from(value);
                self.owning_set(key, value.clone()).await?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// `spec.md` §4.3 SET.
    pub async fn set(&self, key: &str, value: Bytes, origin: Origin) -> Result<()> {
        if key.is_empty() {
            return Err(Error::Invalid("empty key".into()));
        }

        let successors = self.strategy.replicas_for_key(&self.ring, key);
        let owner = successors[0].clone();

        if owner != self.self_id {
            return match origin {
                Origin::Peer => Err(Error::Invalid(format!(
                    "received InternalSet for {key} but owner is {owner}, not self"
                ))),
                Origin::Client => {
                    let reply = self
                        .peers
                        .call(
                            &owner,
                            Message::InternalSet { key: key.to_string(), value: value.to_vec() },
                            CLIENT_DEADLINE,
                        )
                        .await?;
                    match reply {
                        Message::SetReply { ok: true, .. } => Ok(()),
                        Message::SetReply { ok: false, err } => {
                            Err(Error::DurabilityFailure(err.unwrap_or_default()))
                        }
                        Message::Error { status, message } => Err(Error::from_status(status, message)),
                        other => Err(Error::Invalid(format!("unexpected reply to InternalSet: {other:?}"))),
                    }
                }
            };
        }

        self.owning_set_with_successors(key, value, &successors).await
    }

    /// `spec.md` §4.3 DELETE.
    pub async fn delete(&self, key: &str, origin: Origin) -> Result<()> {
        if key.is_empty() {
            return Err(Error::Invalid("empty key".into()));
        }

        let successors = self.strategy.replicas_for_key(&self.ring, key);
        let owner = successors[0].clone();

        if owner != self.self_id {
            return match origin {
                Origin::Peer => Err(Error::Invalid(format!(
                    "received InternalDelete for {key} but owner is {owner}, not self"
                ))),
                Origin::Client => {
                    let reply = self
                        .peers
                        .call(&owner, Message::InternalDelete { key: key.to_string() }, CLIENT_DEADLINE)
                        .await?;
                    match reply {
                        Message::DeleteReply { ok: true } => Ok(()),
                        Message::DeleteReply { ok: false } => {
                            Err(Error::DurabilityFailure("owner refused delete".into()))
                        }
                        Message::Error { status, message } => Err(Error::from_status(status, message)),
                        other => Err(Error::Invalid(format!("unexpected reply to InternalDelete: {other:?}"))),
                    }
                }
            };
        }

        self.durable.delete(key).await?;
        self.store.delete(key);
        self.replicate(key, Op::Delete, Bytes::new(), &successors[1..]).await;
        Ok(())
    }

    /// Called by the GET path's legacy-source hydration (`spec.md` §4.7:
    /// "written through the SET path"). `self` is always the owner here
    /// because this is only reached after `get` has already routed to it.
    async fn owning_set(&self, key: &str, value: Bytes) -> Result<()> {
        let successors = self.strategy.replicas_for_key(&self.ring, key);
        self.owning_set_with_successors(key, value, &successors).await
    }

    async fn owning_set_with_successors(
        &self,
        key: &str,
        value: Bytes,
        successors: &[NodeId],
    ) -> Result<()> {
        // Step 3a: durable write is synchronous and gates everything else.
        self.durable.put(key, &value).await?;
        // Step 3b: only after the durable store accepts does Local Store change.
        self.store.set(key, value.clone());
        // Step 3c/3d: best-effort, parallel, deadline-bounded, non-fatal.
        self.replicate(key, Op::Set, value, &successors[1..]).await;
        Ok(())
    }

    async fn replicate(&self, key: &str, op: Op, value: Bytes, replicas: &[NodeId]) {
        if replicas.is_empty() {
            return;
        }

        let calls = replicas.iter().map(|peer| {
            let message = Message::Replicate { key: key.to_string(), op, value: value.to_vec() };
            async move {
                let result = self.peers.call(peer, message, REPLICATION_DEADLINE).await;
                (peer.clone(), result)
            }
        });

        let results = futures::future::join_all(calls).await;
        for (peer, result) in results {
            match result {
                Ok(Message::Ack { ok: true }) => {}
                Ok(other) => {
                    tracing::warn!(%peer, %key, reply = ?other, "replication rejected, continuing best-effort");
                }
                Err(err) => {
                    tracing::warn!(%peer, %key, error = %err, "replication failed, continuing best-effort");
                }
            }
        }
    }

    /// Applies an inbound [`Message::Replicate`] to this node's Local Store
    /// only; the durable store is never touched by a replica (`spec.md`
    /// §4.3 step 2c).
    pub fn apply_replica(&self, key: &str, op: Op, value: Bytes) {
        match op {
            Op::Set => self.store.set(key, value),
            Op::Delete => {
                self.store.delete(key);
            }
        }
    }
}
