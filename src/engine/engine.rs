//! The conversation engine: rewrite, retrieve, compose.
//!
//! Initialization is eager and fails fast — the persisted index is opened
//! exactly once, and a missing index is a startup error, never a lazy
//! build. After that, `answer` is a pure function of its inputs plus the
//! immutable loaded index, so concurrent calls need no coordination.

use std::sync::Arc;

use super::composer::{AnswerComposer, AnswerResponse};
use super::retriever::Retriever;
use super::rewriter::QueryRewriter;
use crate::core::config::{AppPaths, Settings};
use crate::core::errors::EngineError;
use crate::history::{window_turns, ConversationTurn};
use crate::index::sqlite::SqliteVectorIndex;
use crate::index::store::VectorStore;
use crate::llm::LlmProvider;

pub struct Engine {
    store: Arc<dyn VectorStore>,
    rewriter: QueryRewriter,
    retriever: Retriever,
    composer: AnswerComposer,
    k: usize,
    max_history_turns: usize,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("k", &self.k)
            .field("max_history_turns", &self.max_history_turns)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Load the persisted index and wire up the pipeline stages.
    pub async fn initialize(
        settings: &Settings,
        paths: &AppPaths,
        provider: Arc<dyn LlmProvider>,
    ) -> Result<Self, EngineError> {
        let index_dir = settings.index_dir(paths);
        let index = SqliteVectorIndex::open(&index_dir).await?;

        let chunk_count = index.count().await?;
        if let Some(indexed_model) = index.meta("embedding_model").await? {
            if indexed_model != settings.models.embedding_model {
                tracing::warn!(
                    "Index was built with embedding model '{}' but '{}' is configured; \
                     similarity scores will be meaningless until the index is rebuilt",
                    indexed_model,
                    settings.models.embedding_model
                );
            }
        }
        tracing::info!(
            "Loaded vector index from {} ({} chunks)",
            index_dir.display(),
            chunk_count
        );

        let store: Arc<dyn VectorStore> = Arc::new(index);

        Ok(Self {
            rewriter: QueryRewriter::new(
                provider.clone(),
                settings.models.llm_model.clone(),
                settings.llm.temperature,
            ),
            retriever: Retriever::new(
                provider.clone(),
                store.clone(),
                settings.models.embedding_model.clone(),
            ),
            composer: AnswerComposer::new(
                provider,
                settings.models.llm_model.clone(),
                settings.llm.temperature,
            ),
            store,
            k: settings.retrieval.k,
            max_history_turns: settings.chat.max_history_turns,
        })
    }

    /// Answer one turn. History is caller-owned and passed in whole;
    /// the engine forwards only the most recent window of it.
    pub async fn answer(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<AnswerResponse, EngineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EngineError::InvalidQuery(
                "question must not be empty".to_string(),
            ));
        }

        let window = window_turns(history, self.max_history_turns);

        let standalone = self.rewriter.rewrite(window, question).await?;
        tracing::debug!("Standalone query: {}", standalone);

        let chunks = self.retriever.retrieve(&standalone, self.k).await?;
        tracing::debug!("Retrieved {} chunks", chunks.len());

        self.composer.compose(question, window, &chunks).await
    }

    /// Number of chunks in the loaded index.
    pub async fn chunk_count(&self) -> Result<usize, EngineError> {
        self.store.count().await
    }
}
