use std::sync::Arc;

use tracing::{debug, instrument};

use common::error::AppError;
use common::model::{EnrichedContext, RetrievedChunk};
use common::storage::vector::VectorStore;
use common::utils::embedding::Embedder;

use crate::query::build_query_text;
use crate::scoring::{metadata_boost, sort_retrieved};

/// Converts an enriched context into a ranked list of runbook chunks.
///
/// Retrieval is atomic: embedding or store errors propagate, there is no
/// partial-failure mode here.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    #[instrument(skip_all, fields(alert_id = %ctx.alert.id, top_k))]
    pub async fn retrieve(
        &self,
        ctx: &EnrichedContext,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, AppError> {
        let top_k = if top_k == 0 { 1 } else { top_k };
        // Over-fetch so the metadata re-ranking has candidates to promote.
        let fetch_k = top_k.saturating_mul(2).max(top_k);

        let query_text = build_query_text(ctx);
        let query_embedding = self.embedder.embed(&query_text).await?;

        let scored = self.store.search(&query_embedding, fetch_k).await?;

        let shape = ctx.resource.as_ref().and_then(|r| r.shape.as_deref());
        let mut retrieved: Vec<RetrievedChunk> = scored
            .into_iter()
            .map(|scored| {
                let boost = metadata_boost(&scored.chunk, &ctx.alert, shape);
                RetrievedChunk {
                    similarity: scored.similarity,
                    metadata_boost: boost,
                    final_score: scored.similarity + boost,
                    chunk: scored.chunk,
                }
            })
            .collect();

        sort_retrieved(&mut retrieved);
        retrieved.truncate(top_k);

        debug!(
            results = retrieved.len(),
            store = self.store.provider_type(),
            "Retrieval complete"
        );

        Ok(retrieved)
    }
}
