//! Offline indexer entry point.
//!
//! Reads the corpus directory, builds the vector index, and persists it
//! where the server expects to find it. Run this before starting the
//! server, and again after every corpus update.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use bark_backend::core::config::{AppPaths, Settings};
use bark_backend::corpus::IndexBuilder;
use bark_backend::llm::OpenAiProvider;
use bark_backend::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    logging::init(&paths);

    let settings = Settings::load(&paths).context("Failed to load configuration")?;

    let provider = Arc::new(OpenAiProvider::new(
        settings.llm.base_url.clone(),
        settings.api_key(),
        Duration::from_secs(settings.llm.request_timeout_secs),
    ));

    let builder = IndexBuilder::new(
        provider,
        settings.models.embedding_model.clone(),
        settings.indexing.chunk_size,
        settings.indexing.chunk_overlap,
        settings.indexing.embed_batch_size,
    );

    let corpus_dir = settings.corpus_dir(&paths);
    let index_dir = settings.index_dir(&paths);

    let summary = builder
        .build(&corpus_dir, &index_dir)
        .await
        .context("Index build failed")?;

    tracing::info!(
        "Indexed {} documents into {} chunks (dimension {})",
        summary.documents,
        summary.chunks,
        summary.dimension
    );

    Ok(())
}
