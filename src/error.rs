//! Error types for vecsync.
//!
//! Two tiers: [`SyncError`] aborts the operation that raised it (file
//! selection, index provisioning), while [`FileError`] is recorded against a
//! single file and absorbed by the ingestion driver.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort selection or provisioning.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing a directory or resolving a path failed during traversal.
    #[error("filesystem error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An exclude glob could not be compiled.
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// A list, create, or describe call against the vector store failed.
    #[error("failed to provision index '{index}': {message}")]
    Provisioning { index: String, message: String },

    /// The index never reported ready within the allowed status checks.
    #[error("index '{index}' not ready after {attempts} status checks")]
    Timeout { index: String, attempts: u32 },
}

impl SyncError {
    pub(crate) fn provisioning(index: &str, err: anyhow::Error) -> Self {
        SyncError::Provisioning {
            index: index.to_string(),
            message: format!("{:#}", err),
        }
    }
}

/// Per-file failure recorded by the ingestion driver.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("upsert failed: {0}")]
    Upsert(String),
}
