//! SQLite-backed vector index.
//!
//! Chunk text and provenance live in SQLite rows with serialized
//! embeddings, searched by brute-force cosine similarity. No external
//! server required; the index is a single file that either exists
//! (serving) or is being staged by the builder (indexing).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkRecord, ScoredChunk, VectorStore};
use crate::core::errors::EngineError;

pub const INDEX_FILE: &str = "index.db";

#[derive(Debug)]
pub struct SqliteVectorIndex {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl SqliteVectorIndex {
    /// Open an existing index under `index_dir`.
    ///
    /// The index is never built lazily: a missing file is an
    /// `IndexNotFound` error telling the operator to run the indexer.
    pub async fn open(index_dir: &Path) -> Result<Self, EngineError> {
        let db_path = index_dir.join(INDEX_FILE);
        if !db_path.exists() {
            return Err(EngineError::IndexNotFound(index_dir.to_path_buf()));
        }
        Self::connect(db_path, false).await
    }

    /// Create a fresh index file at `db_path` (used by the builder to
    /// stage a new index before it is moved into place).
    pub async fn create(db_path: PathBuf) -> Result<Self, EngineError> {
        let store = Self::connect(db_path, true).await?;
        store.init_schema().await?;
        Ok(store)
    }

    async fn connect(db_path: PathBuf, create: bool) -> Result<Self, EngineError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(EngineError::store)?;

        Ok(Self { pool, db_path })
    }

    async fn init_schema(&self) -> Result<(), EngineError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                start_offset INTEGER NOT NULL DEFAULT 0,
                embedding BLOB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(EngineError::store)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(EngineError::store)?;

        Ok(())
    }

    /// Record an index-level property (embedding model, dimension, ...).
    pub async fn write_meta(&self, key: &str, value: &str) -> Result<(), EngineError> {
        sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(EngineError::store)?;
        Ok(())
    }

    pub async fn meta(&self, key: &str) -> Result<Option<String>, EngineError> {
        sqlx::query_scalar("SELECT value FROM meta WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(EngineError::store)
    }

    /// Flush and release the underlying pool. The builder calls this
    /// before renaming the staged file into place.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Serialize embedding to bytes (little-endian f32).
    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    /// Compute cosine similarity between two vectors.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> ChunkRecord {
        let start_offset: i64 = row.get("start_offset");
        ChunkRecord {
            chunk_id: row.get("chunk_id"),
            content: row.get("content"),
            source: row.get("source"),
            start_offset: start_offset as usize,
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorIndex {
    async fn insert_batch(
        &self,
        items: Vec<(ChunkRecord, Vec<f32>)>,
    ) -> Result<(), EngineError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(EngineError::store)?;

        for (chunk, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);

            sqlx::query(
                "INSERT OR REPLACE INTO chunks (chunk_id, content, source, start_offset, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&chunk.chunk_id)
            .bind(&chunk.content)
            .bind(&chunk.source)
            .bind(chunk.start_offset as i64)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(EngineError::store)?;
        }

        tx.commit().await.map_err(EngineError::store)?;
        tracing::debug!("Inserted {} chunks into the index", items.len());
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, EngineError> {
        let rows = sqlx::query(
            "SELECT chunk_id, content, source, start_offset, embedding FROM chunks",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::store)?;

        let mut scored: Vec<ScoredChunk> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored_emb = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(query_embedding, &stored_emb);

                Some(ScoredChunk {
                    chunk: Self::row_to_chunk(row),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, EngineError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(EngineError::store)?;
        Ok(count as usize)
    }
}
