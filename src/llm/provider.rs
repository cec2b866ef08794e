use async_trait::async_trait;
use thiserror::Error;

use super::types::ChatRequest;

/// Transport-level failure of a model call. The pipeline stage that made
/// the call decides which engine error it becomes (rewrite vs generation
/// vs embedding).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

/// Chat and embedding capability behind one seam, so the engine never
/// cares which vendor is on the other side.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g. "groq").
    fn name(&self) -> &str;

    /// Check if the provider is reachable.
    async fn health_check(&self) -> Result<bool, ProviderError>;

    /// Chat completion (non-streaming).
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ProviderError>;

    /// Generate one embedding per input, in input order.
    async fn embed(
        &self,
        inputs: &[String],
        model_id: &str,
    ) -> Result<Vec<Vec<f32>>, ProviderError>;
}
