//! The cache cluster node: wires the ring, the local store, the replica
//! pool, the durable and legacy adapters, and the coordinator into a single
//! process (`spec.md` §2, §9 "Module-level state" - an explicit context
//! built at boot, not process-wide singletons).

pub mod config;
pub mod coordinator;
pub mod durable;
pub mod error;
pub mod legacy;
pub mod peer_pool;
pub mod server;
pub mod store;

use std::sync::Arc;

use corelib::HashRing;
use replication::SimpleStrategy;

use config::Config;
use coordinator::Coordinator;
use durable::{DurableStore, PostgresStore};
use legacy::{HttpLegacySource, LegacySource, NoLegacySource};
use peer_pool::PeerPool;
use server::Server;
use store::LocalStore;

pub use error::{Error, Result};

/// Everything a running node needs, constructed once at boot and shared by
/// every request task via `Arc` (`spec.md` §9).
pub struct NodeContext {
    pub coordinator: Arc<Coordinator>,
    pub server: Server,
}

impl NodeContext {
    pub async fn bootstrap(config: &Config) -> anyhow::Result<Self> {
        let ring = HashRing::build(&config.peers, config.vnodes)?;
        tracing::info!(
            members = config.peers.len(),
            vnodes = config.vnodes,
            "ring constructed"
        );

        let strategy = Arc::new(SimpleStrategy::new(config.replication_factor));
        let store = Arc::new(LocalStore::new());
        let peers = Arc::new(PeerPool::new(
            config.peers.iter().filter(|p| **p != config.node_id).cloned(),
        ));

        let durable: Arc<dyn DurableStore> = match &config.postgres_url {
            Some(url) => {
                let pg = PostgresStore::connect(url).await?;
                pg.ensure_schema().await?;
                Arc::new(pg)
            }
            None => {
                tracing::warn!("POSTGRES_URL not set, durable store is in-process only");
                Arc::new(durable::InMemoryDurableStore::default())
            }
        };

        let legacy: Arc<dyn LegacySource> = match &config.legacy_api_url {
            Some(url) => Arc::new(HttpLegacySource::new(url.clone())),
            None => Arc::new(NoLegacySource),
        };

        let coordinator = Arc::new(Coordinator::new(
            config.node_id.clone(),
            ring,
            strategy,
            store,
            durable,
            legacy,
            peers,
        ));

        let server = Server::new(coordinator.clone());

        Ok(Self { coordinator, server })
    }
}
