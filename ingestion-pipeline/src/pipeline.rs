use std::sync::Arc;

use futures::future::join_all;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::{error, info, instrument, warn};

use common::error::AppError;
use common::model::RunbookChunk;
use common::storage::store::StorageManager;
use common::storage::vector::VectorStore;
use common::utils::config::RunbooksConfig;
use common::utils::embedding::Embedder;

use crate::chunker::MarkdownChunker;
use crate::frontmatter::split_front_matter;

/// Outcome of a best-effort batch ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionReport {
    pub ingested: usize,
    pub failed: usize,
    pub chunks: usize,
}

/// Turns markdown runbooks from the object store into indexed chunks:
/// fetch, parse front-matter, chunk, embed, delete-then-insert.
pub struct IngestionPipeline {
    storage: StorageManager,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunker: MarkdownChunker,
    prefix: String,
}

impl IngestionPipeline {
    pub fn new(
        storage: StorageManager,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        config: &RunbooksConfig,
    ) -> Result<Self, AppError> {
        Ok(Self {
            storage,
            embedder,
            store,
            chunker: MarkdownChunker::new(config.min_chunk_chars, config.max_chunk_chars)?,
            prefix: config.prefix.clone(),
        })
    }

    /// Ingest one runbook. Idempotent: prior chunks for the path are
    /// replaced, and chunk ids depend only on path and position.
    #[instrument(skip(self))]
    pub async fn ingest(&self, path: &str) -> Result<usize, AppError> {
        let bytes = self.storage.get(path).await?;
        let document = String::from_utf8(bytes.to_vec())
            .map_err(|e| AppError::Parse(format!("Runbook {path} is not valid UTF-8: {e}")))?;

        let (front, body) = split_front_matter(&document)?;
        let fallback_title = front
            .title
            .clone()
            .unwrap_or_else(|| file_stem(path).to_string());

        let sections = self.chunker.chunk(&fallback_title, body);
        if sections.is_empty() {
            warn!(%path, "Runbook has no content; removing any indexed chunks");
            self.store.delete_by_runbook(path).await?;
            return Ok(0);
        }

        let texts: Vec<String> = sections.iter().map(|s| s.content.clone()).collect();
        let retry_strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);
        let embeddings =
            Retry::spawn(retry_strategy, || self.embedder.embed_batch(&texts)).await?;

        let chunks: Vec<RunbookChunk> = sections
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(ordinal, (section, embedding))| RunbookChunk {
                id: RunbookChunk::derive_id(path, ordinal),
                runbook_path: path.to_string(),
                section_title: section.title,
                content: section.content,
                tags: front.tags.clone(),
                applicable_shapes: front.applicable_shapes.clone(),
                embedding,
            })
            .collect();

        let count = chunks.len();

        // Replace, don't accumulate: stale chunks from a previous revision
        // of this runbook must not survive.
        self.store.delete_by_runbook(path).await?;
        self.store.store_batch(chunks).await?;

        info!(%path, chunks = count, "Runbook indexed");

        Ok(count)
    }

    /// Ingest every `.md` object under the configured prefix. Individual
    /// failures are logged and counted; the batch always completes.
    #[instrument(skip(self))]
    pub async fn ingest_all(&self) -> Result<IngestionReport, AppError> {
        let objects = self.storage.list(Some(&self.prefix)).await?;
        let paths: Vec<String> = objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .filter(|path| path.ends_with(".md"))
            .collect();

        info!(runbooks = paths.len(), prefix = %self.prefix, "Starting runbook sync");

        let outcomes = join_all(paths.into_iter().map(|path| async move {
            let result = self.ingest(&path).await;
            (path, result)
        }))
        .await;

        let mut report = IngestionReport::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(chunks) => {
                    report.ingested += 1;
                    report.chunks += chunks;
                }
                Err(err) => {
                    error!(%path, error = %err, "Runbook ingestion failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            ingested = report.ingested,
            failed = report.failed,
            chunks = report.chunks,
            "Runbook sync finished"
        );

        Ok(report)
    }
}

fn file_stem(path: &str) -> &str {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .trim_end_matches(".md")
}
