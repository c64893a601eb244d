//! Boot-time configuration (`spec.md` §6): environment variables only, no
//! config file format, matching the source's minimal footprint.

use corelib::NodeId;

pub const DEFAULT_PORT: u16 = 50051;

pub struct Config {
    pub node_id: NodeId,
    pub peers: Vec<NodeId>,
    pub replication_factor: usize,
    pub vnodes: usize,
    pub postgres_url: Option<String>,
    pub legacy_api_url: Option<String>,
    pub bind_addr: String,
}

impl Config {
    /// Reads `NODE_ID`, `CACHE_PEERS`, `REPLICATION_N`, `POSTGRES_URL`, and
    /// `LEGACY_API_URL` (`spec.md` §6). `CACHE_PEERS` must include `NODE_ID`
    /// itself; membership order is the literal order peers appear in it, so
    /// every node in the cluster must be started with the same value.
    pub fn from_env() -> anyhow::Result<Self> {
        let node_id_raw = std::env::var("NODE_ID")
            .map_err(|_| anyhow::anyhow!("NODE_ID is required, e.g. 10.0.0.1:50051"))?;
        let node_id = NodeId::from(node_id_raw.clone());

        let peers_raw = std::env::var("CACHE_PEERS")
            .map_err(|_| anyhow::anyhow!("CACHE_PEERS is required, a comma-separated host:port list including self"))?;
        let peers: Vec<NodeId> = peers_raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(NodeId::from)
            .collect();
        if peers.is_empty() {
            anyhow::bail!("CACHE_PEERS must name at least one member");
        }
        if !peers.contains(&node_id) {
            anyhow::bail!("CACHE_PEERS must include this node's own NODE_ID ({node_id_raw})");
        }

        let replication_factor: usize = std::env::var("REPLICATION_N")
            .ok()
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(3);
        if replication_factor == 0 {
            anyhow::bail!("REPLICATION_N must be at least 1");
        }
        if replication_factor > peers.len() {
            anyhow::bail!(
                "REPLICATION_N ({replication_factor}) must not exceed cluster size ({})",
                peers.len()
            );
        }

        let vnodes: usize = std::env::var("CACHE_VNODES")
            .ok()
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(64);

        let bind_addr = std::env::var("CACHE_BIND_ADDR").unwrap_or_else(|_| node_id_raw.clone());

        Ok(Self {
            node_id,
            peers,
            replication_factor,
            vnodes,
            postgres_url: std::env::var("POSTGRES_URL").ok(),
            legacy_api_url: std::env::var("LEGACY_API_URL").ok(),
            bind_addr,
        })
    }
}
