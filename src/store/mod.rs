//! Vector store abstraction.
//!
//! The [`VectorStore`] trait covers the index lifecycle queries the
//! provisioner needs and the upsert the ingestion driver needs, so the
//! pipeline runs unchanged against Pinecone, the in-memory store used in
//! tests, or the disabled store used for dry runs.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`list_index_names`](VectorStore::list_index_names) | Names of all existing indexes |
//! | [`create_index`](VectorStore::create_index) | Create a serverless index |
//! | [`describe_index`](VectorStore::describe_index) | Readiness of one index |
//! | [`upsert`](VectorStore::upsert) | Insert-or-replace entries by id |

pub mod memory;
pub mod pinecone;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::IndexConfig;
use crate::models::{IndexEntry, IndexSpec, IndexStatus};

pub use memory::InMemoryVectorStore;
pub use pinecone::PineconeStore;

/// Remote vector index backend.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns the backend identifier used in logs (e.g. `"pinecone"`).
    fn backend_name(&self) -> &str;

    /// List the names of all indexes visible to this client.
    async fn list_index_names(&self) -> Result<Vec<String>>;

    /// Create a named index with the given shape and placement.
    async fn create_index(&self, name: &str, spec: &IndexSpec) -> Result<()>;

    /// Report whether the named index is ready for writes.
    async fn describe_index(&self, name: &str) -> Result<IndexStatus>;

    /// Insert or replace entries keyed by [`IndexEntry::id`].
    async fn upsert(&self, index: &str, entries: &[IndexEntry]) -> Result<()>;
}

/// A store that refuses every call.
///
/// Used for dry runs, where the pipeline must not reach the remote store.
pub struct DisabledStore;

#[async_trait]
impl VectorStore for DisabledStore {
    fn backend_name(&self) -> &str {
        "disabled"
    }

    async fn list_index_names(&self) -> Result<Vec<String>> {
        bail!("Vector store is disabled")
    }

    async fn create_index(&self, _name: &str, _spec: &IndexSpec) -> Result<()> {
        bail!("Vector store is disabled")
    }

    async fn describe_index(&self, _name: &str) -> Result<IndexStatus> {
        bail!("Vector store is disabled")
    }

    async fn upsert(&self, _index: &str, _entries: &[IndexEntry]) -> Result<()> {
        bail!("Vector store is disabled")
    }
}

/// Create the [`VectorStore`] selected by `index.provider`.
///
/// | Config Value | Store |
/// |-------------|-------|
/// | `"pinecone"` | [`PineconeStore`] |
/// | `"disabled"` | [`DisabledStore`] |
pub fn create_store(config: &IndexConfig) -> Result<Box<dyn VectorStore>> {
    match config.provider.as_str() {
        "pinecone" => Ok(Box::new(PineconeStore::from_env(config)?)),
        "disabled" => Ok(Box::new(DisabledStore)),
        other => bail!("Unknown vector store provider: {}", other),
    }
}
