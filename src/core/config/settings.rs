//! Typed engine settings loaded from `config.yml`.
//!
//! Resolution order follows the rest of the app's file discovery:
//! `BARK_CONFIG_PATH` env override, then `config.yml` in the data dir,
//! then `config.yml` in the project root. A missing file means defaults.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;
use crate::core::errors::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub models: ModelSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub indexing: IndexingSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Chat model used for both the query rewrite and the answer.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Embedding model; must match the model the index was built with.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Falls back to the GROQ_API_KEY environment variable when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Chunks per embedding request when building the index.
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    #[serde(default = "default_k")]
    pub k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Most recent turns forwarded to the rewriter and composer.
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("data/raw_data")
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("data/vector_store")
}

fn default_llm_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_base_url() -> String {
    "https://api.groq.com/openai".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f64 {
    0.1
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    150
}

fn default_embed_batch_size() -> usize {
    64
}

fn default_k() -> usize {
    5
}

fn default_max_history_turns() -> usize {
    20
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            index_dir: default_index_dir(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            llm_model: default_llm_model(),
            embedding_model: default_embedding_model(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embed_batch_size: default_embed_batch_size(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: default_k() }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
        }
    }
}

impl Settings {
    pub fn load(paths: &AppPaths) -> Result<Self, EngineError> {
        let config_path = config_path(paths);
        let settings = match config_path {
            Some(path) => {
                let contents = fs::read_to_string(&path)?;
                serde_yaml::from_str::<Settings>(&contents).map_err(|e| {
                    EngineError::Config(format!("{}: {}", path.display(), e))
                })?
            }
            None => {
                tracing::info!("No config.yml found; using built-in defaults");
                Settings::default()
            }
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.indexing.chunk_size == 0 {
            return Err(EngineError::Config(
                "indexing.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.indexing.chunk_overlap >= self.indexing.chunk_size {
            return Err(EngineError::Config(format!(
                "indexing.chunk_overlap ({}) must be smaller than indexing.chunk_size ({})",
                self.indexing.chunk_overlap, self.indexing.chunk_size
            )));
        }
        if self.indexing.embed_batch_size == 0 {
            return Err(EngineError::Config(
                "indexing.embed_batch_size must be at least 1".to_string(),
            ));
        }
        if self.retrieval.k == 0 {
            return Err(EngineError::Config(
                "retrieval.k must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(EngineError::Config(format!(
                "llm.temperature ({}) must be within 0.0..=2.0",
                self.llm.temperature
            )));
        }
        if self.llm.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// API key from config, falling back to the environment.
    pub fn api_key(&self) -> String {
        if !self.llm.api_key.is_empty() {
            return self.llm.api_key.clone();
        }
        env::var("GROQ_API_KEY").unwrap_or_default()
    }

    pub fn corpus_dir(&self, paths: &AppPaths) -> PathBuf {
        paths.resolve(&self.paths.corpus_dir)
    }

    pub fn index_dir(&self, paths: &AppPaths) -> PathBuf {
        paths.resolve(&self.paths.index_dir)
    }
}

fn config_path(paths: &AppPaths) -> Option<PathBuf> {
    if let Ok(path) = env::var("BARK_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }

    let data_config = paths.data_dir.join("config.yml");
    if data_config.exists() {
        return Some(data_config);
    }

    let root_config = paths.project_root.join("config.yml");
    if root_config.exists() {
        return Some(root_config);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_configuration() {
        let settings = Settings::default();

        assert_eq!(settings.indexing.chunk_size, 1000);
        assert_eq!(settings.indexing.chunk_overlap, 150);
        assert_eq!(settings.retrieval.k, 5);
        assert_eq!(settings.llm.temperature, 0.1);
        assert_eq!(settings.models.llm_model, "llama3-8b-8192");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn overlap_must_stay_below_chunk_size() {
        let mut settings = Settings::default();
        settings.indexing.chunk_overlap = settings.indexing.chunk_size;

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn zero_k_is_rejected() {
        let mut settings = Settings::default();
        settings.retrieval.k = 0;

        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let yaml = "retrieval:\n  k: 3\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(settings.retrieval.k, 3);
        assert_eq!(settings.indexing.chunk_size, 1000);
    }
}
