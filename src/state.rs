use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::config::{AppPaths, Settings};
use crate::core::errors::EngineError;
use crate::engine::Engine;
use crate::llm::OpenAiProvider;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] EngineError),

    #[error("Failed to initialize engine: {0}")]
    Engine(#[source] EngineError),
}

/// Application state shared across all request handlers.
///
/// Built exactly once at process start and passed explicitly — the engine
/// and its loaded index are read-only from here on, so handlers can run
/// concurrently without coordination.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Arc<Settings>,
    pub engine: Arc<Engine>,
}

impl AppState {
    /// Eager, fail-fast startup: configuration, provider, then the
    /// engine with its persisted index. A missing index aborts here with
    /// an error naming the fix; there is no degraded mode.
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let settings =
            Arc::new(Settings::load(&paths).map_err(InitializationError::Config)?);

        let provider = Arc::new(OpenAiProvider::new(
            settings.llm.base_url.clone(),
            settings.api_key(),
            Duration::from_secs(settings.llm.request_timeout_secs),
        ));

        let engine = Engine::initialize(&settings, &paths, provider)
            .await
            .map_err(InitializationError::Engine)?;

        Ok(Arc::new(AppState {
            paths,
            settings,
            engine: Arc::new(engine),
        }))
    }
}
