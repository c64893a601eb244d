//! Command definitions and dispatch.

use clap::{Parser, Subcommand};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use corelib::{HashRing, NodeId, Topology};
use rpc::{Message, MessageCodec};

#[derive(Parser)]
#[command(name = "cache-cluster-cli", about = "Talk to one node of a cache cluster")]
pub struct Cli {
    /// Address of the node to connect to, e.g. 127.0.0.1:50051.
    #[arg(long, short = 'H', default_value = "127.0.0.1:50051")]
    pub host: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch a key's value.
    Get { key: String },
    /// Set a key to a value.
    Set { key: String, value: String },
    /// Delete a key.
    Delete { key: String },
    /// Build a ring from a membership list and print its ownership layout.
    ///
    /// Ring construction is a pure function of the membership list
    /// (`spec.md` §3), so this is computed locally and never talks to a
    /// running node.
    RingDescribe {
        /// Comma-separated host:port membership list, e.g. a:1,b:1,c:1.
        #[arg(long, value_delimiter = ',')]
        peers: Vec<String>,
        #[arg(long, default_value_t = 64)]
        vnodes: usize,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        if let Command::RingDescribe { peers, vnodes } = &self.command {
            let members: Vec<NodeId> = peers.iter().map(|p| NodeId::from(p.as_str())).collect();
            let ring = HashRing::build(&members, *vnodes)?;
            print!("{}", Topology::new(&ring).describe());
            return Ok(());
        }

        let stream = TcpStream::connect(&self.host).await?;
        let mut conn = Framed::new(stream, MessageCodec::new());

        let request = match &self.command {
            Command::Get { key } => Message::Get { key: key.clone() },
            Command::Set { key, value } => {
                Message::Set { key: key.clone(), value: value.clone().into_bytes() }
            }
            Command::Delete { key } => Message::Delete { key: key.clone() },
            Command::RingDescribe { .. } => unreachable!("handled before connecting"),
        };

        conn.send(request).await?;
        let reply = conn
            .next()
            .await
            .ok_or_else(|| anyhow::anyhow!("connection closed before a reply arrived"))??;

        match reply {
            Message::GetReply { found: true, value } => {
                println!("{}", String::from_utf8_lossy(&value));
            }
            Message::GetReply { found: false, .. } => {
                println!("(not found)");
            }
            Message::SetReply { ok: true, .. } => println!("ok"),
            Message::SetReply { ok: false, err } => {
                anyhow::bail!("set failed: {}", err.unwrap_or_default());
            }
            Message::DeleteReply { ok } => println!("ok={ok}"),
            Message::Error { status, message } => {
                anyhow::bail!("{status:?}: {message}");
            }
            other => anyhow::bail!("unexpected reply: {other:?}"),
        }

        Ok(())
    }
}
