//! Similarity retrieval over the vector index.

use std::sync::Arc;

use crate::core::errors::EngineError;
use crate::index::store::{ScoredChunk, VectorStore};
use crate::llm::LlmProvider;

pub struct Retriever {
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn VectorStore>,
    embedding_model: String,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStore>,
        embedding_model: String,
    ) -> Self {
        Self {
            provider,
            store,
            embedding_model,
        }
    }

    /// Top-k chunks for `query`, most relevant first. A small index may
    /// return fewer than k; that is not an error.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, EngineError> {
        if k == 0 {
            return Err(EngineError::InvalidQuery(
                "retrieval k must be at least 1".to_string(),
            ));
        }

        let embeddings = self
            .provider
            .embed(&[query.to_string()], &self.embedding_model)
            .await
            .map_err(|e| EngineError::EmbeddingUnavailable(e.to_string()))?;

        let query_embedding = embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                EngineError::EmbeddingUnavailable(
                    "embedding service returned no vector for the query".to_string(),
                )
            })?;

        self.store.search(&query_embedding, k).await
    }
}
