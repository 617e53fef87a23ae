use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{sort_scored, VectorStore};
use crate::error::AppError;
use crate::model::{RunbookChunk, ScoredChunk};
use crate::storage::db::SurrealDbClient;

const TABLE: &str = "runbook_chunk";

/// Managed vector backend on SurrealDB: chunks live in a table with an HNSW
/// index and search delegates to `vector::similarity::cosine`, whose scores
/// are already on the `[-1, 1]` cosine scale.
pub struct SurrealVectorStore {
    db: Arc<SurrealDbClient>,
    dimension: usize,
}

/// Row shape stored in SurrealDB. The record key is the chunk id; the
/// `chunk_id` field carries it back out without record-id deserialization
/// gymnastics.
#[derive(Debug, Serialize, Deserialize)]
struct ChunkRow {
    chunk_id: String,
    runbook_path: String,
    section_title: String,
    content: String,
    tags: Vec<String>,
    applicable_shapes: Vec<String>,
    embedding: Vec<f32>,
}

impl From<RunbookChunk> for ChunkRow {
    fn from(chunk: RunbookChunk) -> Self {
        Self {
            chunk_id: chunk.id,
            runbook_path: chunk.runbook_path,
            section_title: chunk.section_title,
            content: chunk.content,
            tags: chunk.tags,
            applicable_shapes: chunk.applicable_shapes,
            embedding: chunk.embedding,
        }
    }
}

impl From<ChunkRow> for RunbookChunk {
    fn from(row: ChunkRow) -> Self {
        Self {
            id: row.chunk_id,
            runbook_path: row.runbook_path,
            section_title: row.section_title,
            content: row.content,
            tags: row.tags,
            applicable_shapes: row.applicable_shapes,
            embedding: row.embedding,
        }
    }
}

impl SurrealVectorStore {
    /// Bind to the database and (re)define the HNSW index for the configured
    /// embedding dimension.
    pub async fn new(db: Arc<SurrealDbClient>, dimension: usize) -> Result<Self, AppError> {
        if dimension == 0 {
            return Err(AppError::Validation(
                "Embedding dimension must be positive".into(),
            ));
        }

        db.client
            .query(format!(
                "DEFINE INDEX OVERWRITE idx_embedding_{TABLE} ON TABLE {TABLE} \
                 FIELDS embedding HNSW DIMENSION {dimension};"
            ))
            .await
            .map_err(AppError::Database)?
            .check()
            .map_err(AppError::Database)?;

        info!(dimension, "Runbook chunk vector index ready");

        Ok(Self { db, dimension })
    }

    fn check_dimension(&self, len: usize, what: &str) -> Result<(), AppError> {
        if len != self.dimension {
            return Err(AppError::Validation(format!(
                "{what} has dimension {len}, store expects {}",
                self.dimension
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SurrealVectorStore {
    async fn store_batch(&self, chunks: Vec<RunbookChunk>) -> Result<(), AppError> {
        for chunk in chunks {
            self.check_dimension(chunk.embedding.len(), &format!("Chunk {}", chunk.id))?;

            let row = ChunkRow::from(chunk);
            self.db
                .client
                .query(format!(
                    "UPSERT type::thing('{TABLE}', $id) CONTENT $row;"
                ))
                .bind(("id", row.chunk_id.clone()))
                .bind(("row", row))
                .await
                .map_err(AppError::Database)?
                .check()
                .map_err(AppError::Database)?;
        }

        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, AppError> {
        self.check_dimension(query_embedding.len(), "Query embedding")?;

        #[derive(Deserialize)]
        struct Row {
            chunk_id: String,
            runbook_path: String,
            section_title: String,
            content: String,
            tags: Vec<String>,
            applicable_shapes: Vec<String>,
            embedding: Vec<f32>,
            score: f32,
        }

        let sql = format!(
            r#"
            SELECT
                chunk_id,
                runbook_path,
                section_title,
                content,
                tags,
                applicable_shapes,
                embedding,
                vector::similarity::cosine(embedding, $embedding) AS score
            FROM {TABLE}
            WHERE embedding <|{k},100|> $embedding
            ORDER BY score DESC
            LIMIT {k};
            "#
        );

        let mut response = self
            .db
            .client
            .query(&sql)
            .bind(("embedding", query_embedding.to_vec()))
            .await
            .map_err(AppError::Database)?;

        let rows: Vec<Row> = response.take::<Vec<Row>>(0).unwrap_or_default();

        let mut results: Vec<ScoredChunk> = rows
            .into_iter()
            .map(|row| ScoredChunk {
                similarity: row.score,
                chunk: RunbookChunk {
                    id: row.chunk_id,
                    runbook_path: row.runbook_path,
                    section_title: row.section_title,
                    content: row.content,
                    tags: row.tags,
                    applicable_shapes: row.applicable_shapes,
                    embedding: row.embedding,
                },
            })
            .collect();

        // The database orders by score only; re-sort for the id tie-break.
        sort_scored(&mut results);

        Ok(results)
    }

    async fn delete_by_runbook(&self, runbook_path: &str) -> Result<(), AppError> {
        self.db
            .client
            .query(format!("DELETE {TABLE} WHERE runbook_path = $path;"))
            .bind(("path", runbook_path.to_string()))
            .await
            .map_err(AppError::Database)?
            .check()
            .map_err(AppError::Database)?;

        Ok(())
    }

    fn provider_type(&self) -> &'static str {
        "surreal"
    }
}
