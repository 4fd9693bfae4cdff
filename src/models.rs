//! Core data models used throughout vecsync.
//!
//! These types represent the files, documents, and index entries that flow
//! through the selection and ingestion pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FileError;

/// Absolute, canonicalized path of a selected source file.
///
/// Doubles as the id of the file's index entry, so two different files
/// never share a `FilePath`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilePath(PathBuf);

impl FilePath {
    /// Wrap an already-absolute path. The selector is the only producer
    /// in normal operation; tests may build these directly.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// String form used as the index entry id and in metadata.
    pub fn as_id(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A file's content ready for embedding.
///
/// `text` is the raw file content prefixed with a `File path:` annotation
/// so the embedding carries path context.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: FilePath,
    pub text: String,
}

impl Document {
    pub fn new(path: FilePath, content: &str) -> Self {
        let text = format!("File path: {}\n\n{}", path, content);
        Self { path, text }
    }
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub path: String,
    pub text: String,
}

/// A record in the remote index. One per [`FilePath`]; upserting an
/// existing `id` replaces the previous entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    pub fn from_document(doc: Document, values: Vec<f32>) -> Self {
        let id = doc.path.as_id();
        Self {
            id: id.clone(),
            values,
            metadata: EntryMetadata {
                path: id,
                text: doc.text,
            },
        }
    }
}

/// Placement and shape of a serverless index, sent on create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub dimension: usize,
    pub metric: String,
    pub cloud: String,
    pub region: String,
}

impl Default for IndexSpec {
    fn default() -> Self {
        Self {
            dimension: 1536,
            metric: "cosine".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// Readiness reported by describe-index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStatus {
    pub ready: bool,
    pub state: String,
}

/// A file that could not be ingested, with the reason.
#[derive(Debug)]
pub struct FileFailure {
    pub path: FilePath,
    pub error: FileError,
}

/// Outcome of one ingestion invocation. Never persisted.
#[derive(Debug)]
pub struct IngestionRun {
    pub index_name: String,
    pub total: usize,
    pub successful: usize,
    pub dry_run: bool,
    pub failures: Vec<FileFailure>,
}

impl IngestionRun {
    pub fn failed(&self) -> usize {
        self.total - self.successful
    }

    pub fn is_complete(&self) -> bool {
        self.successful == self.total
    }
}
