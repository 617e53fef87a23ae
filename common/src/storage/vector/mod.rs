pub mod local;
pub mod surreal;

use async_trait::async_trait;

use crate::error::AppError;
use crate::model::{RunbookChunk, ScoredChunk};

pub use local::LocalVectorStore;
pub use surreal::SurrealVectorStore;

/// Persistent storage of runbook chunks keyed by chunk id, with top-K
/// cosine similarity search and delete-by-source-path.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or upsert a batch of chunks. Idempotent on `chunk.id`.
    async fn store_batch(&self, chunks: Vec<RunbookChunk>) -> Result<(), AppError>;

    /// Insert or upsert a single chunk.
    async fn store(&self, chunk: RunbookChunk) -> Result<(), AppError> {
        self.store_batch(vec![chunk]).await
    }

    /// Top-K similarity search. Returns at most `k` results ordered by
    /// similarity descending with ties broken by chunk id ascending.
    /// An empty store yields an empty list, never an error.
    async fn search(&self, query_embedding: &[f32], k: usize)
        -> Result<Vec<ScoredChunk>, AppError>;

    /// Remove every chunk whose `runbook_path` equals the argument.
    async fn delete_by_runbook(&self, runbook_path: &str) -> Result<(), AppError>;

    fn provider_type(&self) -> &'static str;
}

/// Deterministic result ordering shared by the backends: similarity
/// descending, chunk id ascending on ties.
pub(crate) fn sort_scored(results: &mut [ScoredChunk]) {
    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });
}

/// Cosine similarity between two equal-length vectors. Zero-norm input
/// yields 0.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator <= f32::EPSILON {
        0.0
    } else {
        dot / denominator
    }
}
