//! # vecsync
//!
//! Walks a source tree, selects text-like files by extension, and syncs
//! them into a vector-search index: one embedding per file, upserted under
//! the file's absolute path.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ FileSelector │──▶│  Provisioner │──▶│ Ingestor         │
//! │ walk + allow │   │ ensure_ready │   │ read→embed→upsert│
//! └──────────────┘   └──────┬───────┘   └────────┬─────────┘
//!                           │                    │
//!                           ▼                    ▼
//!                     ┌───────────┐       ┌─────────────┐
//!                     │VectorStore│       │  Embedding  │
//!                     │ Pinecone  │       │   OpenAI    │
//!                     └───────────┘       └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! vecsync scan ./repo                  # list files that would be synced
//! vecsync sync ./repo --dry-run        # read everything, call nothing remote
//! vecsync provision --index codebase   # create the index and wait for it
//! vecsync sync ./repo --index codebase
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Aborting and per-file error types |
//! | [`selector`] | File selection |
//! | [`provision`] | Index provisioning |
//! | [`ingest`] | Ingestion driver and sync orchestration |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Vector store abstraction |
//! | [`progress`] | Progress reporting |

pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod models;
pub mod progress;
pub mod provision;
pub mod selector;
pub mod store;
