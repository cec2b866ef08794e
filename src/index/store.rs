//! VectorStore trait — abstract interface for the persisted chunk index.
//!
//! The engine only ever needs three operations, so any KNN backend can
//! slot in behind this trait without touching the retrieval pipeline.
//! The shipping implementation is `SqliteVectorIndex` in the `sqlite`
//! module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::EngineError;

/// A chunk as persisted in the index: a bounded span of source text plus
/// provenance. Immutable once written; retired only by rebuilding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Source document identifier (relative file path).
    pub source: String,
    /// Character offset of the chunk within the source document.
    pub start_offset: usize,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: ChunkRecord,
    /// Cosine similarity (higher = more relevant).
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks with their embedding vectors.
    async fn insert_batch(
        &self,
        items: Vec<(ChunkRecord, Vec<f32>)>,
    ) -> Result<(), EngineError>;

    /// Top-k chunks by similarity to the query embedding, most similar
    /// first. Returns fewer than `limit` when the index is small.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, EngineError>;

    /// Total number of chunks in the index.
    async fn count(&self) -> Result<usize, EngineError>;
}
