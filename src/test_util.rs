//! Test doubles shared across module tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::provider::{LlmProvider, ProviderError};
use crate::llm::types::ChatRequest;

const EMBED_DIM: usize = 32;

/// Deterministic in-process provider.
///
/// Chat replies come from a scripted queue; once the queue is empty the
/// provider either echoes the last user message or fails, depending on
/// how it was built. Embeddings are a normalized bag-of-words hash so
/// texts sharing vocabulary land close together in vector space without
/// any network involved.
pub struct MockProvider {
    replies: Mutex<VecDeque<String>>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    fail_chat: bool,
    fail_embed: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            chat_requests: Mutex::new(Vec::new()),
            fail_chat: false,
            fail_embed: false,
        }
    }

    /// Scripted chat replies, consumed in order.
    pub fn with_replies(replies: Vec<&str>) -> Self {
        let provider = Self::new();
        *provider.replies.lock().unwrap() =
            replies.into_iter().map(|r| r.to_string()).collect();
        provider
    }

    /// Fails every chat call (and any call after the scripted replies
    /// run out, when combined with `with_replies` via `failing_after`).
    pub fn failing_chat() -> Self {
        Self {
            fail_chat: true,
            ..Self::new()
        }
    }

    /// Scripted replies first, then failures.
    pub fn failing_after(replies: Vec<&str>) -> Self {
        let mut provider = Self::with_replies(replies);
        provider.fail_chat = true;
        provider
    }

    pub fn failing_embed() -> Self {
        Self {
            fail_embed: true,
            ..Self::new()
        }
    }

    /// Every chat request seen so far, in call order.
    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    /// The embedding this mock produces for a text.
    pub fn embed_text(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; EMBED_DIM];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % EMBED_DIM as u64) as usize] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ProviderError> {
        self.chat_requests.lock().unwrap().push(request.clone());

        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return Ok(reply);
        }
        if self.fail_chat {
            return Err(ProviderError::Http("mock chat failure".to_string()));
        }

        let echo = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(echo)
    }

    async fn embed(
        &self,
        inputs: &[String],
        _model_id: &str,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        if self.fail_embed {
            return Err(ProviderError::Http("mock embed failure".to_string()));
        }
        Ok(inputs.iter().map(|text| Self::embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similar_texts_embed_closer_than_unrelated_ones() {
        let query = MockProvider::embed_text("dog bloat emergency");
        let related = MockProvider::embed_text("bloat in a dog is an emergency");
        let unrelated = MockProvider::embed_text("quarterly tax filing deadline");

        let dot = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
        };

        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn scripted_replies_then_echo() {
        let provider = MockProvider::with_replies(vec!["first"]);
        let request = ChatRequest::new(vec![crate::llm::ChatMessage::user("hello")]);

        assert_eq!(provider.chat(request.clone(), "m").await.unwrap(), "first");
        assert_eq!(provider.chat(request, "m").await.unwrap(), "hello");
    }
}
