//! Durable-Store Adapter (`spec.md` §4.6): write-through persistence of
//! SET/DELETE, invoked synchronously on the owner only.
//!
//! The reference collaborator is a single shared PostgreSQL database, so
//! durability is cluster-wide regardless of which node happens to own a
//! given key (`spec.md` §9, "Shared durable store vs per-node").

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};

/// Deadline for a single durable-store round trip. The spec names a
/// deadline requirement without a concrete number for this adapter (only
/// replication's 250ms and the legacy fetch's 500ms are given); we reuse
/// the legacy fetch's 500ms as a reasonable bound for a local write.
pub const DURABLE_DEADLINE: Duration = Duration::from_millis(500);

/// Schema: `kv_store(key TEXT PRIMARY KEY, value BYTEA NOT NULL,
/// created_at TIMESTAMPTZ NOT NULL DEFAULT now())` (`spec.md` §6).
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// PostgreSQL-backed adapter.
pub struct PostgresStore {
    pool: sqlx::PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Creates `kv_store` if it does not already exist. Run once at boot.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value BYTEA NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DurableStore for PostgresStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let query = sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, created_at = now()",
        )
        .bind(key)
        .bind(value);

        tokio::time::timeout(DURABLE_DEADLINE, query.execute(&self.pool))
            .await
            .map_err(|_| Error::DurabilityFailure(format!("put({key}) timed out")))??;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let query = sqlx::query("DELETE FROM kv_store WHERE key = $1").bind(key);

        tokio::time::timeout(DURABLE_DEADLINE, query.execute(&self.pool))
            .await
            .map_err(|_| Error::DurabilityFailure(format!("delete({key}) timed out")))??;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let query = sqlx::query_as::<_, (Vec<u8>,)>("SELECT value FROM kv_store WHERE key = $1")
            .bind(key);

        let row = tokio::time::timeout(DURABLE_DEADLINE, query.fetch_optional(&self.pool))
            .await
            .map_err(|_| Error::DurabilityFailure(format!("get({key}) timed out")))??;
        Ok(row.map(|(value,)| value))
    }
}

/// In-memory stand-in for tests and for running a node without a real
/// Postgres instance reachable.
#[derive(Default)]
pub struct InMemoryDurableStore {
    rows: dashmap::DashMap<String, Vec<u8>>,
    pub fail_writes: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::DurabilityFailure("durable store disabled".into()));
        }
        self.rows.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::DurabilityFailure("durable store disabled".into()));
        }
        self.rows.remove(key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.rows.get(key).map(|v| v.clone()))
    }
}
