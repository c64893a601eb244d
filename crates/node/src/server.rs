//! RPC Server: accepts client and peer connections on one endpoint
//! (`spec.md` §4.4).
//!
//! Each inbound connection gets its own task; each request read off that
//! connection is dispatched and answered without blocking the read side, so
//! a slow request does not stall pipelined requests behind it on the same
//! socket.

use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use rpc::{Message, MessageCodec, Status};

use crate::coordinator::{Coordinator, Origin};
use crate::error::Error;

pub struct Server {
    coordinator: Arc<Coordinator>,
}

impl Server {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Binds `addr`, failing fast so a port-bind error is observable as a
    /// fatal boot error (`spec.md` §6) before the caller starts accepting
    /// signals.
    pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "rpc server listening");
        Ok(listener)
    }

    /// Serves connections off an already-bound listener until the process
    /// is signalled to stop (`spec.md` §6: SIGTERM drains outstanding
    /// requests).
    pub async fn serve(&self, listener: TcpListener, mut shutdown: tokio::sync::watch::Receiver<bool>) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr) = accepted?;
                    let coordinator = self.coordinator.clone();
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, coordinator, shutdown).await {
                            tracing::debug!(%peer_addr, error = %err, "connection closed");
                        }
                    });
                }
                _ = shutdown.changed() => {
                    tracing::info!("rpc server draining, no longer accepting connections");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    coordinator: Arc<Coordinator>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> rpc::Result<()> {
    let framed = Framed::new(stream, MessageCodec::new());
    let (mut sink, mut source) = framed.split();

    let (reply_tx, mut reply_rx) = mpsc::channel::<Message>(64);

    let writer = tokio::spawn(async move {
        while let Some(message) = reply_rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            frame = source.next() => {
                let Some(frame) = frame else { break };
                let request = frame?;
                let coordinator = coordinator.clone();
                let reply_tx = reply_tx.clone();
                tokio::spawn(async move {
                    let reply = dispatch(&coordinator, request).await;
                    let _ = reply_tx.send(reply).await;
                });
            }
        }
    }

    drop(reply_tx);
    let _ = writer.await;
    Ok(())
}

/// Maps one inbound [`Message`] to a coordinator call and its reply,
/// enforcing the client/peer surface split (`spec.md` §4.4).
async fn dispatch(coordinator: &Coordinator, request: Message) -> Message {
    match request {
        Message::Get { key } => match coordinator.get(&key, Origin::Client).await {
            Ok(Some(value)) => Message::GetReply { found: true, value: value.to_vec() },
            Ok(None) => Message::GetReply { found: false, value: Vec::new() },
            Err(err) => error_reply(&err),
        },
        Message::Set { key, value } => match coordinator.set(&key, Bytes::from(value), Origin::Client).await {
            Ok(()) => Message::SetReply { ok: true, err: None },
            Err(err) => Message::SetReply { ok: false, err: Some(err.to_string()) },
        },
        Message::Delete { key } => match coordinator.delete(&key, Origin::Client).await {
            Ok(()) => Message::DeleteReply { ok: true },
            Err(_) => Message::DeleteReply { ok: false },
        },

        Message::InternalGet { key } => match coordinator.get(&key, Origin::Peer).await {
            Ok(Some(value)) => Message::GetReply { found: true, value: value.to_vec() },
            Ok(None) => Message::GetReply { found: false, value: Vec::new() },
            Err(err) => error_reply(&err),
        },
        Message::InternalSet { key, value } => {
            match coordinator.set(&key, Bytes::from(value), Origin::Peer).await {
                Ok(()) => Message::SetReply { ok: true, err: None },
                Err(err) => Message::SetReply { ok: false, err: Some(err.to_string()) },
            }
        }
        Message::InternalDelete { key } => match coordinator.delete(&key, Origin::Peer).await {
            Ok(()) => Message::DeleteReply { ok: true },
            Err(_) => Message::DeleteReply { ok: false },
        },
        Message::Replicate { key, op, value } => {
            coordinator.apply_replica(&key, op, Bytes::from(value));
            Message::Ack { ok: true }
        }

        // Reply shapes arriving as a request is a protocol violation.
        Message::GetReply { .. }
        | Message::SetReply { .. }
        | Message::DeleteReply { .. }
        | Message::Ack { .. }
        | Message::Error { .. } => Message::Error {
            status: Status::Invalid,
            message: "unexpected reply-shaped message on request path".into(),
        },
    }
}

fn error_reply(err: &Error) -> Message {
    Message::Error { status: err.into(), message: err.to_string() }
}
