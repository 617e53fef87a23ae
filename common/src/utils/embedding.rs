use async_openai::config::OpenAIConfig;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

use crate::error::AppError;

/// Produces dense embedding vectors for text.
///
/// Every vector produced by one embedder has the same dimension, and vectors
/// are L2-unit-normalized so that dot product equals cosine similarity.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;

    /// Batch embedding. The output preserves input order:
    /// `embed_batch(texts)[i]` corresponds to `texts[i]`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError>;

    fn dimension(&self) -> usize;

    fn backend_label(&self) -> &'static str;
}

/// Scale a vector to unit L2 norm. A zero vector is returned unchanged.
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

/// Embeddings from an OpenAI-compatible endpoint (OpenAI, Ollama, ...).
pub struct OpenAiEmbedder {
    client: Arc<async_openai::Client<OpenAIConfig>>,
    model: String,
    dimensions: u32,
}

impl OpenAiEmbedder {
    pub fn new(
        client: Arc<async_openai::Client<OpenAIConfig>>,
        model: impl Into<String>,
        dimensions: u32,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .dimensions(self.dimensions)
            .input([text])
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Provider("No embedding data received".into()))?
            .embedding;

        debug!(dimensions = embedding.len(), "Embedding created");

        Ok(l2_normalize(embedding))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .dimensions(self.dimensions)
            .input(texts.to_vec())
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        if response.data.len() != texts.len() {
            return Err(AppError::Provider(format!(
                "Embedding batch size mismatch: sent {}, received {}",
                texts.len(),
                response.data.len()
            )));
        }

        // The API reports an index per item; order by it rather than
        // trusting response ordering.
        let mut data = response.data;
        data.sort_by_key(|d| d.index);

        Ok(data
            .into_iter()
            .map(|d| l2_normalize(d.embedding))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimensions as usize
    }

    fn backend_label(&self) -> &'static str {
        "openai-compatible"
    }
}

/// Deterministic embeddings from token hashing. No network, stable across
/// runs; suitable for offline operation and tests.
pub struct HashedEmbedder {
    dimension: usize,
}

impl HashedEmbedder {
    pub fn new(dimension: usize) -> Result<Self, AppError> {
        if dimension == 0 {
            return Err(AppError::Validation(
                "Embedding dimension must be positive".into(),
            ));
        }
        Ok(Self { dimension })
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text.split_whitespace() {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            if let Some(slot) = vector.get_mut(bucket) {
                *slot += sign;
            }
        }

        l2_normalize(vector)
    }
}

#[async_trait]
impl Embedder for HashedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn backend_label(&self) -> &'static str {
        "hashed"
    }
}
