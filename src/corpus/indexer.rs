//! Offline index construction.
//!
//! Corpus in, persisted vector index out: load documents, chunk them,
//! embed the chunks in batches, and stage everything into a fresh SQLite
//! file that is renamed into place only after the last write succeeds.
//! Any failure leaves the previous index (if any) untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use super::chunker::{split_document, TextChunk};
use super::loader::load_corpus;
use crate::core::errors::EngineError;
use crate::index::sqlite::{SqliteVectorIndex, INDEX_FILE};
use crate::index::store::{ChunkRecord, VectorStore};
use crate::llm::LlmProvider;

const STAGING_FILE: &str = "index.db.staging";

#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
}

pub struct IndexBuilder {
    provider: Arc<dyn LlmProvider>,
    embedding_model: String,
    chunk_size: usize,
    chunk_overlap: usize,
    embed_batch_size: usize,
}

impl IndexBuilder {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        embedding_model: String,
        chunk_size: usize,
        chunk_overlap: usize,
        embed_batch_size: usize,
    ) -> Self {
        Self {
            provider,
            embedding_model,
            chunk_size,
            chunk_overlap,
            embed_batch_size,
        }
    }

    pub async fn build(
        &self,
        corpus_dir: &Path,
        index_dir: &Path,
    ) -> Result<IndexSummary, EngineError> {
        let documents = load_corpus(corpus_dir)?;
        tracing::info!("Loaded {} documents from {}", documents.len(), corpus_dir.display());

        let mut chunks: Vec<TextChunk> = Vec::new();
        for doc in &documents {
            chunks.extend(split_document(
                &doc.content,
                &doc.source,
                self.chunk_size,
                self.chunk_overlap,
            ));
        }
        if chunks.is_empty() {
            return Err(EngineError::EmptyCorpus(corpus_dir.to_path_buf()));
        }
        tracing::info!("Split into {} chunks", chunks.len());

        fs::create_dir_all(index_dir)?;
        let staging_path = index_dir.join(STAGING_FILE);
        remove_staging_files(&staging_path);

        let store = SqliteVectorIndex::create(staging_path.clone()).await?;
        let result = self.populate(&store, &chunks).await;

        match result {
            Ok(dimension) => {
                store.close().await;
                fs::rename(&staging_path, index_dir.join(INDEX_FILE))?;
                remove_staging_files(&staging_path);
                tracing::info!(
                    "Index written to {} ({} chunks, dimension {})",
                    index_dir.display(),
                    chunks.len(),
                    dimension
                );
                Ok(IndexSummary {
                    documents: documents.len(),
                    chunks: chunks.len(),
                    dimension,
                })
            }
            Err(err) => {
                store.close().await;
                remove_staging_files(&staging_path);
                Err(err)
            }
        }
    }

    /// Embed and insert every chunk; returns the vector dimension.
    async fn populate(
        &self,
        store: &SqliteVectorIndex,
        chunks: &[TextChunk],
    ) -> Result<usize, EngineError> {
        let mut dimension = 0usize;
        let mut inserted = 0usize;

        for batch in chunks.chunks(self.embed_batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self
                .provider
                .embed(&texts, &self.embedding_model)
                .await
                .map_err(|e| EngineError::EmbeddingUnavailable(e.to_string()))?;

            if embeddings.len() != batch.len() {
                return Err(EngineError::EmbeddingUnavailable(format!(
                    "embedding count mismatch: sent {}, received {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            if dimension == 0 {
                dimension = embeddings.first().map(|v| v.len()).unwrap_or(0);
            }

            let items: Vec<(ChunkRecord, Vec<f32>)> = batch
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| {
                    (
                        ChunkRecord {
                            chunk_id: Uuid::new_v4().to_string(),
                            content: chunk.text.clone(),
                            source: chunk.source.clone(),
                            start_offset: chunk.start_offset,
                        },
                        embedding,
                    )
                })
                .collect();

            store.insert_batch(items).await?;
            inserted += batch.len();
            tracing::debug!("Embedded {}/{} chunks", inserted, chunks.len());
        }

        store
            .write_meta("embedding_model", &self.embedding_model)
            .await?;
        store.write_meta("dimension", &dimension.to_string()).await?;
        store
            .write_meta("chunk_size", &self.chunk_size.to_string())
            .await?;
        store
            .write_meta("chunk_overlap", &self.chunk_overlap.to_string())
            .await?;
        store
            .write_meta("built_at", &chrono::Utc::now().to_rfc3339())
            .await?;

        Ok(dimension)
    }
}

fn remove_staging_files(staging_path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut path = PathBuf::from(staging_path);
        if !suffix.is_empty() {
            let mut name = staging_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            name.push_str(suffix);
            path = staging_path.with_file_name(name);
        }
        if path.exists() {
            let _ = fs::remove_file(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockProvider;

    fn builder(provider: MockProvider) -> IndexBuilder {
        IndexBuilder::new(
            Arc::new(provider),
            "test-embed".to_string(),
            200,
            40,
            8,
        )
    }

    fn write_corpus(dir: &Path) {
        fs::write(
            dir.join("bloat.txt"),
            "Dogs with bloat require immediate evaluation within 1-2 hours.",
        )
        .unwrap();
        fs::write(
            dir.join("dental.txt"),
            "Routine dental cleaning is recommended annually for most breeds.",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn build_persists_an_openable_index_with_meta() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        write_corpus(corpus.path());

        let summary = builder(MockProvider::new())
            .build(corpus.path(), index_dir.path())
            .await
            .unwrap();

        assert_eq!(summary.documents, 2);
        assert!(summary.chunks >= 2);
        assert!(index_dir.path().join(INDEX_FILE).exists());

        let index = SqliteVectorIndex::open(index_dir.path()).await.unwrap();
        assert_eq!(index.count().await.unwrap(), summary.chunks);
        assert_eq!(
            index.meta("embedding_model").await.unwrap().as_deref(),
            Some("test-embed")
        );
        assert_eq!(
            index.meta("dimension").await.unwrap().as_deref(),
            Some(summary.dimension.to_string().as_str())
        );
    }

    #[tokio::test]
    async fn empty_corpus_aborts_the_build() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();

        let err = builder(MockProvider::new())
            .build(corpus.path(), index_dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::EmptyCorpus(_)));
        assert!(!index_dir.path().join(INDEX_FILE).exists());
    }

    #[tokio::test]
    async fn embedding_failure_leaves_no_partial_index() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        write_corpus(corpus.path());

        let err = builder(MockProvider::failing_embed())
            .build(corpus.path(), index_dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::EmbeddingUnavailable(_)));
        assert!(!index_dir.path().join(INDEX_FILE).exists());
        assert!(!index_dir.path().join(STAGING_FILE).exists());
    }

    #[tokio::test]
    async fn rebuild_replaces_the_previous_index() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        write_corpus(corpus.path());

        builder(MockProvider::new())
            .build(corpus.path(), index_dir.path())
            .await
            .unwrap();
        let first = SqliteVectorIndex::open(index_dir.path()).await.unwrap();
        let first_count = first.count().await.unwrap();
        first.close().await;

        fs::write(corpus.path().join("extra.txt"), "A third document.").unwrap();
        builder(MockProvider::new())
            .build(corpus.path(), index_dir.path())
            .await
            .unwrap();

        let rebuilt = SqliteVectorIndex::open(index_dir.path()).await.unwrap();
        assert!(rebuilt.count().await.unwrap() > first_count);
    }
}
