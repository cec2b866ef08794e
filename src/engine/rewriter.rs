//! Standalone-query rewriting.
//!
//! Retrieval downstream never sees the conversation history, so the
//! follow-up question must be rewritten to carry every entity and detail
//! needed to stand on its own before anything is embedded.

use std::sync::Arc;

use crate::core::errors::EngineError;
use crate::history::ConversationTurn;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

const REWRITE_INSTRUCTION: &str = "Given a chat history and the latest user question, \
your task is to create a single, clear, standalone question. \
This new question must be understandable on its own, without needing to read the \
entire chat history. Incorporate all relevant details, entities, and context from \
the previous turns of the conversation into the new question. \
Do NOT answer the question, just reformulate it.";

pub struct QueryRewriter {
    provider: Arc<dyn LlmProvider>,
    llm_model: String,
    temperature: f64,
}

impl QueryRewriter {
    pub fn new(provider: Arc<dyn LlmProvider>, llm_model: String, temperature: f64) -> Self {
        Self {
            provider,
            llm_model,
            temperature,
        }
    }

    /// Reformulate `question` into a history-independent query.
    ///
    /// Runs on empty history too; with no context to merge the model
    /// returns the question largely unchanged, which is fine.
    pub async fn rewrite(
        &self,
        history: &[ConversationTurn],
        question: &str,
    ) -> Result<String, EngineError> {
        let mut messages = vec![ChatMessage::system(REWRITE_INSTRUCTION)];
        messages.extend(history.iter().map(|turn| turn.to_chat_message()));
        messages.push(ChatMessage::user(question));

        let request = ChatRequest::new(messages).with_temperature(self.temperature);
        let reply = self
            .provider
            .chat(request, &self.llm_model)
            .await
            .map_err(|e| EngineError::RewriteFailed(e.to_string()))?;

        let standalone = reply.trim().to_string();
        if standalone.is_empty() {
            return Err(EngineError::RewriteFailed(
                "model returned an empty reformulation".to_string(),
            ));
        }

        Ok(standalone)
    }
}
