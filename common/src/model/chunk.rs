use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A semantically coherent fragment of a runbook, the unit of indexing and
/// retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunbookChunk {
    pub id: String,
    pub runbook_path: String,
    pub section_title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Shape patterns (globs or simple regexes) this chunk applies to.
    /// Empty means the chunk applies to any shape.
    #[serde(default)]
    pub applicable_shapes: Vec<String>,
    pub embedding: Vec<f32>,
}

impl RunbookChunk {
    /// Deterministic chunk id derived from the runbook path and the chunk's
    /// ordinal position within the document.
    pub fn derive_id(runbook_path: &str, ordinal: usize) -> String {
        let digest = Sha256::digest(format!("{runbook_path}:{ordinal}").as_bytes());
        let mut id = String::with_capacity(16);
        for byte in digest.iter().take(8) {
            id.push_str(&format!("{byte:02x}"));
        }
        id
    }
}

/// A chunk paired with its raw similarity score, as returned by a vector
/// store backend. Similarity is cosine, in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    pub chunk: RunbookChunk,
    pub similarity: f32,
}

/// A chunk after metadata re-ranking, carrying the additive boost and the
/// final ordering score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedChunk {
    pub chunk: RunbookChunk,
    pub similarity: f32,
    pub metadata_boost: f32,
    pub final_score: f32,
}
