use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{cosine_similarity, sort_scored, VectorStore};
use crate::error::AppError;
use crate::model::{RunbookChunk, ScoredChunk};

/// In-memory vector store computing cosine similarity against every stored
/// chunk. Adequate for corpora up to roughly 10^4 chunks.
///
/// Readers always observe a consistent snapshot of each chunk; the embedding
/// dimension is learned from the first insert and enforced afterwards.
pub struct LocalVectorStore {
    inner: RwLock<Index>,
}

#[derive(Default)]
struct Index {
    chunks: HashMap<String, RunbookChunk>,
    dimension: Option<usize>,
}

impl LocalVectorStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Index::default()),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.chunks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.chunks.is_empty()
    }
}

impl Default for LocalVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn store_batch(&self, chunks: Vec<RunbookChunk>) -> Result<(), AppError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut index = self.inner.write().await;

        for chunk in chunks {
            let dimension = *index.dimension.get_or_insert(chunk.embedding.len());
            if chunk.embedding.len() != dimension {
                return Err(AppError::Validation(format!(
                    "Chunk {} has embedding dimension {}, store expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    dimension
                )));
            }
            index.chunks.insert(chunk.id.clone(), chunk);
        }

        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, AppError> {
        let index = self.inner.read().await;

        if index.chunks.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(dimension) = index.dimension {
            if query_embedding.len() != dimension {
                return Err(AppError::Validation(format!(
                    "Query embedding dimension {} does not match store dimension {dimension}",
                    query_embedding.len()
                )));
            }
        }

        let mut results: Vec<ScoredChunk> = index
            .chunks
            .values()
            .map(|chunk| ScoredChunk {
                similarity: cosine_similarity(query_embedding, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .collect();

        sort_scored(&mut results);
        results.truncate(k);

        Ok(results)
    }

    async fn delete_by_runbook(&self, runbook_path: &str) -> Result<(), AppError> {
        let mut index = self.inner.write().await;
        index
            .chunks
            .retain(|_, chunk| chunk.runbook_path != runbook_path);
        Ok(())
    }

    fn provider_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn chunk(id: &str, path: &str, embedding: Vec<f32>) -> RunbookChunk {
        RunbookChunk {
            id: id.to_string(),
            runbook_path: path.to_string(),
            section_title: "section".to_string(),
            content: "content".to_string(),
            tags: Vec::new(),
            applicable_shapes: Vec::new(),
            embedding,
        }
    }

    #[tokio::test]
    async fn search_on_empty_store_returns_empty() {
        let store = LocalVectorStore::new();
        let results = store.search(&[1.0, 0.0], 5).await.expect("search");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let store = LocalVectorStore::new();
        store
            .store_batch(vec![
                chunk("one", "runbooks/a.md", vec![1.0, 0.0]),
                chunk("two", "runbooks/b.md", vec![0.0, 1.0]),
            ])
            .await
            .expect("store");

        let results = store.search(&[0.0, 1.0], 2).await.expect("search");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, "two");
        assert!(results[0].similarity > results[1].similarity);
    }

    #[tokio::test]
    async fn equal_scores_break_ties_on_id_ascending() {
        let store = LocalVectorStore::new();
        store
            .store_batch(vec![
                chunk("b", "runbooks/b.md", vec![1.0, 0.0]),
                chunk("a", "runbooks/a.md", vec![1.0, 0.0]),
            ])
            .await
            .expect("store");

        let results = store.search(&[1.0, 0.0], 2).await.expect("search");

        assert_eq!(results[0].chunk.id, "a");
        assert_eq!(results[1].chunk.id, "b");
    }

    #[tokio::test]
    async fn store_is_idempotent_on_chunk_id() {
        let store = LocalVectorStore::new();
        store
            .store(chunk("a", "runbooks/a.md", vec![1.0, 0.0]))
            .await
            .expect("store");
        store
            .store(chunk("a", "runbooks/a.md", vec![0.0, 1.0]))
            .await
            .expect("store again");

        assert_eq!(store.len().await, 1);

        let results = store.search(&[0.0, 1.0], 1).await.expect("search");
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn delete_by_runbook_removes_only_matching_chunks() {
        let store = LocalVectorStore::new();
        store
            .store_batch(vec![
                chunk("a1", "runbooks/a.md", vec![1.0, 0.0]),
                chunk("a2", "runbooks/a.md", vec![0.5, 0.5]),
                chunk("b1", "runbooks/b.md", vec![0.0, 1.0]),
            ])
            .await
            .expect("store");

        store
            .delete_by_runbook("runbooks/a.md")
            .await
            .expect("delete");

        assert_eq!(store.len().await, 1);
        let results = store.search(&[0.0, 1.0], 10).await.expect("search");
        assert_eq!(results[0].chunk.id, "b1");
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let store = LocalVectorStore::new();
        store
            .store(chunk("a", "runbooks/a.md", vec![1.0, 0.0]))
            .await
            .expect("store");

        let err = store
            .search(&[1.0, 0.0, 0.0], 1)
            .await
            .expect_err("dimension mismatch");
        assert!(matches!(err, AppError::Validation(_)));

        let err = store
            .store(chunk("c", "runbooks/c.md", vec![1.0, 0.0, 0.0]))
            .await
            .expect_err("store mismatch");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_store_and_search_is_safe() {
        let store = Arc::new(LocalVectorStore::new());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let id = format!("chunk-{i}");
                store
                    .store(chunk(&id, "runbooks/conc.md", vec![1.0, 0.0]))
                    .await
                    .expect("store");
                store.search(&[1.0, 0.0], 4).await.expect("search");
            }));
        }

        for handle in handles {
            handle.await.expect("task");
        }

        assert_eq!(store.len().await, 16);
    }
}
