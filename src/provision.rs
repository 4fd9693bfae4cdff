//! Index provisioning.
//!
//! [`ensure_ready`] makes sure a named index exists and accepts writes
//! before ingestion starts: it creates the index when it is missing, then
//! polls describe-index on a fixed interval until the store reports ready.
//! The wait is bounded by [`PollPolicy::max_attempts`]; running out of
//! attempts is a [`SyncError::Timeout`], distinct from store failures.
//!
//! Provisioning is idempotent. An index that already exists is never
//! re-created, and a partially created index is left in place on error.

use std::time::Duration;

use tracing::info;

use crate::config::Config;
use crate::error::SyncError;
use crate::models::IndexSpec;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::{create_store, VectorStore};

/// How often and how many times to check index readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 150,
        }
    }
}

/// Ensure `index` exists with `spec` and is ready for writes.
///
/// # Errors
///
/// - [`SyncError::Provisioning`] if listing, creating, or describing fails.
/// - [`SyncError::Timeout`] if the index is not ready after
///   `poll.max_attempts` describe calls.
pub async fn ensure_ready(
    store: &dyn VectorStore,
    index: &str,
    spec: &IndexSpec,
    poll: &PollPolicy,
    progress: &dyn ProgressReporter,
) -> Result<(), SyncError> {
    let names = store
        .list_index_names()
        .await
        .map_err(|e| SyncError::provisioning(index, e))?;

    if names.iter().any(|name| name == index) {
        info!(index, backend = store.backend_name(), "index already exists");
    } else {
        info!(
            index,
            backend = store.backend_name(),
            dimension = spec.dimension,
            cloud = %spec.cloud,
            region = %spec.region,
            "creating index"
        );
        store
            .create_index(index, spec)
            .await
            .map_err(|e| SyncError::provisioning(index, e))?;
    }

    for attempt in 1..=poll.max_attempts {
        let status = store
            .describe_index(index)
            .await
            .map_err(|e| SyncError::provisioning(index, e))?;
        if status.ready {
            info!(index, "index is ready");
            return Ok(());
        }

        info!(index, state = %status.state, attempt, "waiting for index to be ready");
        progress.report(ProgressEvent::WaitingForIndex {
            index: index.to_string(),
            attempt,
            max_attempts: poll.max_attempts,
        });
        if attempt < poll.max_attempts {
            tokio::time::sleep(poll.interval).await;
        }
    }

    Err(SyncError::Timeout {
        index: index.to_string(),
        attempts: poll.max_attempts,
    })
}

/// Run `vecsync provision`: make the configured (or overridden) index ready.
pub async fn run_provision(
    config: &Config,
    index: Option<String>,
    progress: &dyn ProgressReporter,
) -> anyhow::Result<()> {
    let index = index.unwrap_or_else(|| config.index.name.clone());
    let store = create_store(&config.index)?;
    ensure_ready(
        store.as_ref(),
        &index,
        &config.index.spec(config.embedding.dims),
        &config.index.poll_policy(),
        progress,
    )
    .await?;
    println!("index {} ready", index);
    Ok(())
}
