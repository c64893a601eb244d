//! Legacy-Source Adapter (`spec.md` §4.7): read-through fallback invoked
//! only on an owner's GET miss, hydrating the cluster on a hit.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::time::Duration;

use crate::error::Result;

/// `spec.md` §4.7 recommends 500ms for the legacy fetch.
pub const LEGACY_FETCH_DEADLINE: Duration = Duration::from_millis(500);

/// `fetch(key) -> value | absent`. Transport errors and non-2xx/404
/// statuses are both treated as absent - they never fail the enclosing
/// GET, they just mean the cluster has nothing to offer for this key.
#[async_trait]
pub trait LegacySource: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

#[derive(serde::Deserialize)]
struct LegacyRecord {
    #[allow(dead_code)]
    key: String,
    value: String,
}

/// HTTP/JSON collaborator: `GET {base}/{url-encoded key}` -> 200 with
/// `{"key", "value"}` is a hit, 404 is a miss, anything else is logged and
/// treated as a miss (`spec.md` §6).
pub struct HttpLegacySource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLegacySource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl LegacySource for HttpLegacySource {
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let encoded_key = utf8_percent_encode(key, NON_ALPHANUMERIC);
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), encoded_key);

        let response = match tokio::time::timeout(
            LEGACY_FETCH_DEADLINE,
            self.client.get(&url).send(),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::warn!(%key, error = %err, "legacy source request failed, treating as miss");
                return Ok(None);
            }
            Err(_) => {
                tracing::warn!(%key, "legacy source fetch timed out, treating as miss");
                return Ok(None);
            }
        };

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            tracing::warn!(%key, status = %response.status(), "legacy source returned non-success status, treating as miss");
            return Ok(None);
        }

        match response.json::<LegacyRecord>().await {
            Ok(record) => Ok(Some(record.value.into_bytes())),
            Err(err) => {
                tracing::warn!(%key, error = %err, "legacy source returned malformed JSON, treating as miss");
                Ok(None)
            }
        }
    }
}

/// In-memory stand-in for tests: a fixed set of legacy-only keys.
#[derive(Default)]
pub struct InMemoryLegacySource {
    records: dashmap::DashMap<String, Vec<u8>>,
}

impl InMemoryLegacySource {
    pub fn with_record(self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.records.insert(key.into(), value.into());
        self
    }

    pub fn remove(&self, key: &str) {
        self.records.remove(key);
    }
}

#[async_trait]
impl LegacySource for InMemoryLegacySource {
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.records.get(key).map(|v| v.clone()))
    }
}

/// Always-absent source, for nodes run without `LEGACY_API_URL` configured.
#[derive(Default)]
pub struct NoLegacySource;

#[async_trait]
impl LegacySource for NoLegacySource {
    async fn fetch(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}
