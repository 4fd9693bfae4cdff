//! Ingestion pipeline orchestration.
//!
//! Coordinates the full sync flow: file selection → index provisioning →
//! per-file read, embed, and upsert. Per-file failures are recorded and
//! skipped; they never abort a run. Selection and provisioning failures do.

use std::path::PathBuf;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::embedding::{create_provider, DisabledProvider, EmbeddingProvider};
use crate::error::FileError;
use crate::models::{Document, FileFailure, FilePath, IndexEntry, IngestionRun};
use crate::progress::{NoProgress, ProgressEvent, ProgressReporter};
use crate::provision::ensure_ready;
use crate::selector::FileSelector;
use crate::store::{create_store, DisabledStore, VectorStore};

/// Per-run settings for [`Ingestor::run`].
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Read and annotate files but never call the embedder or the store.
    pub dry_run: bool,
    /// Expected embedding width; other lengths count as embedding failures.
    pub dimension: usize,
    /// Files in flight at once. `1` processes strictly in order.
    pub concurrency: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            dimension: 1536,
            concurrency: 1,
        }
    }
}

/// Embeds files and upserts them into one index.
pub struct Ingestor<'a> {
    embedder: &'a dyn EmbeddingProvider,
    store: &'a dyn VectorStore,
    progress: &'a dyn ProgressReporter,
}

impl<'a> Ingestor<'a> {
    pub fn new(embedder: &'a dyn EmbeddingProvider, store: &'a dyn VectorStore) -> Self {
        Self {
            embedder,
            store,
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Ingest `files` into `index`.
    ///
    /// Always returns a summary; callers detect partial failure through
    /// [`IngestionRun::successful`] and [`IngestionRun::failures`].
    pub async fn run(
        &self,
        files: &[FilePath],
        index: &str,
        options: &IngestOptions,
    ) -> IngestionRun {
        let total = files.len();
        info!(
            index,
            total,
            dry_run = options.dry_run,
            model = self.embedder.model_name(),
            "starting ingestion"
        );

        let mut outcomes = stream::iter(files.iter().map(move |path| async move {
            (path, self.ingest_file(path, index, options).await)
        }))
        .buffered(options.concurrency.max(1));

        let mut successful = 0;
        let mut failures = Vec::new();
        let mut n = 0u64;
        while let Some((path, outcome)) = outcomes.next().await {
            n += 1;
            match outcome {
                Ok(()) => successful += 1,
                Err(error) => {
                    warn!(path = %path, error = %error, "failed to ingest file");
                    failures.push(FileFailure {
                        path: path.clone(),
                        error,
                    });
                }
            }
            self.progress.report(ProgressEvent::Ingesting {
                index: index.to_string(),
                n,
                total: total as u64,
            });
        }

        let run = IngestionRun {
            index_name: index.to_string(),
            total,
            successful,
            dry_run: options.dry_run,
            failures,
        };
        info!(
            index,
            successful = run.successful,
            total = run.total,
            dry_run = run.dry_run,
            complete = run.is_complete(),
            "ingestion finished"
        );
        run
    }

    async fn ingest_file(
        &self,
        path: &FilePath,
        index: &str,
        options: &IngestOptions,
    ) -> Result<(), FileError> {
        let content = tokio::fs::read_to_string(path.as_path()).await?;
        let doc = Document::new(path.clone(), &content);

        if options.dry_run {
            debug!(path = %path, bytes = doc.text.len(), "dry run, skipping embed and upsert");
            return Ok(());
        }

        let values = self
            .embedder
            .embed(&doc.text)
            .await
            .map_err(|e| FileError::Embedding(format!("{:#}", e)))?;
        if values.len() != options.dimension {
            return Err(FileError::Embedding(format!(
                "expected {} dimensions, got {}",
                options.dimension,
                values.len()
            )));
        }

        let entry = IndexEntry::from_document(doc, values);
        self.store
            .upsert(index, std::slice::from_ref(&entry))
            .await
            .map_err(|e| FileError::Upsert(format!("{:#}", e)))?;

        debug!(path = %path, index, "upserted file");
        Ok(())
    }
}

/// Command-line overrides for a sync.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub root: PathBuf,
    pub index: Option<String>,
    pub dry_run: bool,
    pub concurrency: Option<usize>,
    pub limit: Option<usize>,
}

/// Run `vecsync sync`: build collaborators from config and sync `opts.root`.
///
/// Dry runs use the disabled embedder and store, so no request can leave
/// the process. A real run with `embedding.provider = "disabled"` is
/// rejected up front, since every file would fail to embed.
pub async fn run_sync(
    config: &Config,
    opts: SyncOptions,
    progress: &dyn ProgressReporter,
) -> Result<IngestionRun> {
    let run = if opts.dry_run {
        let embedder = DisabledProvider::new(config.embedding.dims);
        sync_with(config, opts, &embedder, &DisabledStore, progress).await?
    } else {
        if !config.embedding.is_enabled() {
            anyhow::bail!(
                "embedding provider is disabled; set [embedding].provider or use --dry-run"
            );
        }
        let embedder = create_provider(&config.embedding)?;
        let store = create_store(&config.index)?;
        sync_with(config, opts, embedder.as_ref(), store.as_ref(), progress).await?
    };

    print_summary(&run);
    Ok(run)
}

/// Select, provision once, then ingest, using the given collaborators.
///
/// Provisioning is skipped in dry-run mode since it may create an index.
pub async fn sync_with(
    config: &Config,
    opts: SyncOptions,
    embedder: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    progress: &dyn ProgressReporter,
) -> Result<IngestionRun> {
    let index = opts.index.unwrap_or_else(|| config.index.name.clone());
    let dimension = config.embedding.dims;
    if embedder.dims() != dimension {
        anyhow::bail!(
            "embedding model '{}' produces {} dimensions but embedding.dims is {}",
            embedder.model_name(),
            embedder.dims(),
            dimension
        );
    }

    progress.report(ProgressEvent::Discovering {
        root: opts.root.display().to_string(),
    });
    let selector = FileSelector::new(config.selector.clone())?;
    let mut files = selector.select(&opts.root)?;
    if let Some(limit) = opts.limit {
        files.truncate(limit);
    }
    info!(root = %opts.root.display(), count = files.len(), "selected files");

    if !opts.dry_run {
        ensure_ready(
            store,
            &index,
            &config.index.spec(dimension),
            &config.index.poll_policy(),
            progress,
        )
        .await?;
    }

    let options = IngestOptions {
        dry_run: opts.dry_run,
        dimension,
        concurrency: opts.concurrency.unwrap_or(config.ingest.concurrency),
    };
    let run = Ingestor::new(embedder, store)
        .with_progress(progress)
        .run(&files, &index, &options)
        .await;
    Ok(run)
}

fn print_summary(run: &IngestionRun) {
    if run.dry_run {
        println!("sync {} (dry-run)", run.index_name);
    } else {
        println!("sync {}", run.index_name);
    }
    println!("  files: {}", run.total);
    println!("  successful: {}", run.successful);
    println!("  failed: {}", run.failed());
    for failure in &run.failures {
        println!("    {}: {}", failure.path, failure.error);
    }
}
