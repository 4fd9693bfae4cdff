//! Pinecone vector store backend.
//!
//! Talks to the Pinecone REST API with `reqwest`:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | list | `GET {controller}/indexes` |
//! | create | `POST {controller}/indexes` |
//! | describe | `GET {controller}/indexes/{name}` |
//! | upsert | `POST https://{host}/vectors/upsert` |
//!
//! The data-plane `host` of an index is learned from describe and cached
//! per index name. Requires the `PINECONE_API_KEY` environment variable.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::IndexConfig;
use crate::models::{IndexEntry, IndexSpec, IndexStatus};

use super::VectorStore;

const API_VERSION: &str = "2024-07";

/// A [`VectorStore`] backed by Pinecone serverless indexes.
pub struct PineconeStore {
    client: reqwest::Client,
    api_key: String,
    controller_url: String,
    hosts: RwLock<HashMap<String, String>>,
}

impl PineconeStore {
    /// Create a client for the given controller URL.
    pub fn new(api_key: impl Into<String>, controller_url: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            bail!("Pinecone API key must not be empty");
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Pinecone HTTP client")?;
        Ok(Self {
            client,
            api_key,
            controller_url: controller_url.trim_end_matches('/').to_string(),
            hosts: RwLock::new(HashMap::new()),
        })
    }

    /// Create a client using `PINECONE_API_KEY` and the `[index]` config.
    pub fn from_env(config: &IndexConfig) -> Result<Self> {
        let api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| anyhow::anyhow!("PINECONE_API_KEY environment variable not set"))?;
        Self::new(
            api_key,
            &config.controller_url,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    fn cached_host(&self, index: &str) -> Result<Option<String>> {
        let hosts = self.hosts.read().map_err(|_| poisoned())?;
        Ok(hosts.get(index).cloned())
    }

    async fn host_for(&self, index: &str) -> Result<String> {
        if let Some(host) = self.cached_host(index)? {
            return Ok(host);
        }
        self.describe(index).await?;
        self.cached_host(index)?
            .ok_or_else(|| anyhow::anyhow!("Pinecone index '{}' has no host yet", index))
    }

    async fn describe(&self, name: &str) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{}", self.controller_url, name);
        let response = self.request(reqwest::Method::GET, &url).send().await?;
        let description: IndexDescription = check(response).await?.json().await?;
        if let Some(host) = description.host.as_deref().filter(|h| !h.is_empty()) {
            self.hosts
                .write()
                .map_err(|_| poisoned())?
                .insert(name.to_string(), host.to_string());
        }
        Ok(description)
    }
}

fn poisoned() -> anyhow::Error {
    anyhow::anyhow!("Pinecone host cache lock poisoned")
}

// ── Pinecone API request/response types ────────────────────────────

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexSummary>,
}

#[derive(Deserialize)]
struct IndexSummary {
    name: String,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: CreateIndexSpec<'a>,
}

#[derive(Serialize)]
struct CreateIndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Deserialize)]
struct IndexDescription {
    #[serde(default)]
    host: Option<String>,
    status: IndexDescriptionStatus,
}

#[derive(Deserialize)]
struct IndexDescriptionStatus {
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexEntry],
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Turn a non-success response into an error carrying Pinecone's message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    bail!("Pinecone API error {}: {}", status, detail)
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn backend_name(&self) -> &str {
        "pinecone"
    }

    async fn list_index_names(&self) -> Result<Vec<String>> {
        let url = format!("{}/indexes", self.controller_url);
        let response = self.request(reqwest::Method::GET, &url).send().await?;
        let list: IndexList = check(response).await?.json().await?;
        debug!(count = list.indexes.len(), "listed pinecone indexes");
        Ok(list.indexes.into_iter().map(|i| i.name).collect())
    }

    async fn create_index(&self, name: &str, spec: &IndexSpec) -> Result<()> {
        let url = format!("{}/indexes", self.controller_url);
        let body = CreateIndexRequest {
            name,
            dimension: spec.dimension,
            metric: &spec.metric,
            spec: CreateIndexSpec {
                serverless: ServerlessSpec {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        };
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&body)
            .send()
            .await?;
        check(response).await?;
        debug!(index = name, dimension = spec.dimension, "created pinecone index");
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> Result<IndexStatus> {
        let description = self.describe(name).await?;
        Ok(IndexStatus {
            ready: description.status.ready,
            state: description.status.state,
        })
    }

    async fn upsert(&self, index: &str, entries: &[IndexEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let host = self.host_for(index).await?;
        let url = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/vectors/upsert", host.trim_end_matches('/'))
        } else {
            format!("https://{}/vectors/upsert", host)
        };
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&UpsertRequest { vectors: entries })
            .send()
            .await?;
        check(response).await?;
        debug!(index, count = entries.len(), "upserted vectors to pinecone");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryMetadata;

    #[test]
    fn create_request_uses_serverless_spec() {
        let spec = IndexSpec::default();
        let body = CreateIndexRequest {
            name: "codebase",
            dimension: spec.dimension,
            metric: &spec.metric,
            spec: CreateIndexSpec {
                serverless: ServerlessSpec {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "codebase",
                "dimension": 1536,
                "metric": "cosine",
                "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } }
            })
        );
    }

    #[test]
    fn upsert_request_carries_metadata() {
        let entries = vec![IndexEntry {
            id: "/repo/a.ts".to_string(),
            values: vec![0.5],
            metadata: EntryMetadata {
                path: "/repo/a.ts".to_string(),
                text: "File path: /repo/a.ts\n\nx".to_string(),
            },
        }];
        let json = serde_json::to_value(UpsertRequest { vectors: &entries }).unwrap();
        assert_eq!(json["vectors"][0]["id"], "/repo/a.ts");
        assert_eq!(json["vectors"][0]["metadata"]["path"], "/repo/a.ts");
        assert_eq!(json["vectors"][0]["values"][0], 0.5);
    }

    #[test]
    fn describe_response_parses_status_and_host() {
        let body = r#"{"name":"codebase","dimension":1536,"host":"codebase-abc.svc.pinecone.io",
            "status":{"ready":false,"state":"Initializing"}}"#;
        let description: IndexDescription = serde_json::from_str(body).unwrap();
        assert!(!description.status.ready);
        assert_eq!(description.status.state, "Initializing");
        assert_eq!(description.host.as_deref(), Some("codebase-abc.svc.pinecone.io"));
    }

    #[tokio::test]
    async fn poisoned_host_cache_is_an_error_not_a_panic() {
        let store =
            PineconeStore::new("key", "https://api.pinecone.io", Duration::from_secs(5)).unwrap();
        store
            .hosts
            .write()
            .unwrap()
            .insert("idx".to_string(), "idx-abc.svc.pinecone.io".to_string());
        assert_eq!(
            store.host_for("idx").await.unwrap(),
            "idx-abc.svc.pinecone.io"
        );

        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = store.hosts.write().unwrap();
                    panic!("writer died holding the lock");
                })
                .join();
        });

        let err = store.host_for("idx").await.unwrap_err();
        assert!(err.to_string().contains("poisoned"));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let result = PineconeStore::new("  ", "https://api.pinecone.io", Duration::from_secs(5));
        assert!(result.is_err());
    }
}
