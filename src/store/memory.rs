//! In-memory [`VectorStore`] implementation for testing and dry wiring.
//!
//! Uses `HashMap`s behind `std::sync::RwLock` for thread safety. Newly
//! created indexes can be configured to report "initializing" for a number
//! of describe calls before turning ready, which lets provisioning loops be
//! exercised without a network.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{IndexEntry, IndexSpec, IndexStatus};

use super::VectorStore;

struct StoredIndex {
    spec: IndexSpec,
    /// Describe calls remaining before the index reports ready.
    pending_describes: u32,
    entries: HashMap<String, IndexEntry>,
}

#[derive(Default)]
struct CallCounts {
    list: usize,
    create: usize,
    describe: usize,
    upsert: usize,
}

/// In-memory store with call accounting.
pub struct InMemoryVectorStore {
    indexes: RwLock<HashMap<String, StoredIndex>>,
    calls: RwLock<CallCounts>,
    ready_after: u32,
    failing_ids: HashSet<String>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
            calls: RwLock::new(CallCounts::default()),
            ready_after: 0,
            failing_ids: HashSet::new(),
        }
    }

    /// Indexes created through [`VectorStore::create_index`] report not
    /// ready for the first `describes` describe calls.
    pub fn with_ready_after(mut self, describes: u32) -> Self {
        self.ready_after = describes;
        self
    }

    /// Seed an index that already exists and is ready.
    pub fn with_index(self, name: &str, dimension: usize) -> Self {
        let spec = IndexSpec {
            dimension,
            ..IndexSpec::default()
        };
        self.indexes.write().unwrap().insert(
            name.to_string(),
            StoredIndex {
                spec,
                pending_describes: 0,
                entries: HashMap::new(),
            },
        );
        self
    }

    /// Reject any upsert batch containing this entry id.
    pub fn with_failing_id(mut self, id: impl Into<String>) -> Self {
        self.failing_ids.insert(id.into());
        self
    }

    /// Snapshot of an index's entries, sorted by id.
    pub fn entries(&self, index: &str) -> Vec<IndexEntry> {
        let indexes = self.indexes.read().unwrap();
        let mut entries: Vec<IndexEntry> = indexes
            .get(index)
            .map(|stored| stored.entries.values().cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    /// The spec an index was created (or seeded) with.
    pub fn index_spec(&self, index: &str) -> Option<IndexSpec> {
        let indexes = self.indexes.read().unwrap();
        indexes.get(index).map(|stored| stored.spec.clone())
    }

    pub fn list_calls(&self) -> usize {
        self.calls.read().unwrap().list
    }

    pub fn create_calls(&self) -> usize {
        self.calls.read().unwrap().create
    }

    pub fn describe_calls(&self) -> usize {
        self.calls.read().unwrap().describe
    }

    pub fn upsert_calls(&self) -> usize {
        self.calls.read().unwrap().upsert
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn list_index_names(&self) -> Result<Vec<String>> {
        self.calls.write().unwrap().list += 1;
        let indexes = self.indexes.read().unwrap();
        let mut names: Vec<String> = indexes.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_index(&self, name: &str, spec: &IndexSpec) -> Result<()> {
        self.calls.write().unwrap().create += 1;
        let mut indexes = self.indexes.write().unwrap();
        if indexes.contains_key(name) {
            bail!("index '{}' already exists", name);
        }
        indexes.insert(
            name.to_string(),
            StoredIndex {
                spec: spec.clone(),
                pending_describes: self.ready_after,
                entries: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> Result<IndexStatus> {
        self.calls.write().unwrap().describe += 1;
        let mut indexes = self.indexes.write().unwrap();
        let stored = match indexes.get_mut(name) {
            Some(s) => s,
            None => bail!("index '{}' not found", name),
        };
        if stored.pending_describes > 0 {
            stored.pending_describes -= 1;
            return Ok(IndexStatus {
                ready: false,
                state: "Initializing".to_string(),
            });
        }
        Ok(IndexStatus {
            ready: true,
            state: "Ready".to_string(),
        })
    }

    async fn upsert(&self, index: &str, entries: &[IndexEntry]) -> Result<()> {
        self.calls.write().unwrap().upsert += 1;
        if let Some(entry) = entries.iter().find(|e| self.failing_ids.contains(&e.id)) {
            bail!("upsert rejected for '{}'", entry.id);
        }
        let mut indexes = self.indexes.write().unwrap();
        let stored = match indexes.get_mut(index) {
            Some(s) => s,
            None => bail!("index '{}' not found", index),
        };
        for entry in entries {
            if entry.values.len() != stored.spec.dimension {
                bail!(
                    "vector dimension {} does not match index dimension {}",
                    entry.values.len(),
                    stored.spec.dimension
                );
            }
        }
        for entry in entries {
            stored.entries.insert(entry.id.clone(), entry.clone());
        }
        Ok(())
    }
}
