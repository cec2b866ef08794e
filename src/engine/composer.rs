//! Grounded answer composition.
//!
//! Builds the clinical prompt from the retrieved chunks, the windowed
//! history and the question, and invokes the chat model at low
//! temperature. The instruction block is the behavioral contract: answers
//! draw only on the supplied context, missing information is declared
//! missing, and quantitative details are reproduced verbatim.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::errors::EngineError;
use crate::history::ConversationTurn;
use crate::index::store::ScoredChunk;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

const ANSWER_INSTRUCTION: &str = r#"You are BARK, a clinical support assistant for veterinary professionals working canine cases. You understand both technical veterinary terms ("hematemesis") and everyday descriptions ("vomiting blood"), and you translate between them when responding.

Grounding rules:
- Use ONLY the retrieved context below. Never draw on outside knowledge.
- If the context does not contain the information needed to answer, state clearly: "This information is not available in the current knowledge base."
- Every specific detail (dosages, measurements, classifications) must be reproduced exactly as stated in the context. Do not infer, generalize, or combine values across passages.
- If passages conflict, acknowledge the discrepancy.
- Present findings as clinical considerations from the literature, never as definitive diagnoses.
- When everyday terms are used, state your interpretation (e.g. interpreting "not eating" as potential inappetence or anorexia).
- Note age, breed, or size variations whenever the context mentions them.

Structure every response with these sections, in this order:
**Clinical Considerations:** key findings from the context.
**Differential Considerations:** alternative possibilities and ruling-out criteria mentioned in the context.
**Diagnostic/Treatment Notes:** protocols, dosages, and precautions exactly as stated.
**Knowledge Gaps:** critical information missing from the current context.
**Red Flags/Urgency Indicators:** emergency situations from the context, and when to escalate or refer.

If the question involves a potential emergency (bloat, toxicity, trauma, difficulty breathing), prioritize the emergency indicators found in the context and recommend immediate evaluation."#;

/// The generated answer together with the retrieval result that grounded
/// it, so callers can always inspect provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub sources: Vec<ScoredChunk>,
}

pub struct AnswerComposer {
    provider: Arc<dyn LlmProvider>,
    llm_model: String,
    temperature: f64,
}

impl AnswerComposer {
    pub fn new(provider: Arc<dyn LlmProvider>, llm_model: String, temperature: f64) -> Self {
        Self {
            provider,
            llm_model,
            temperature,
        }
    }

    pub async fn compose(
        &self,
        question: &str,
        history: &[ConversationTurn],
        chunks: &[ScoredChunk],
    ) -> Result<AnswerResponse, EngineError> {
        let system = format!(
            "{}\n\nCONTEXT:\n{}",
            ANSWER_INSTRUCTION,
            format_context(chunks)
        );

        let mut messages = vec![ChatMessage::system(system)];
        messages.extend(history.iter().map(|turn| turn.to_chat_message()));
        messages.push(ChatMessage::user(question));

        let request = ChatRequest::new(messages).with_temperature(self.temperature);
        let answer = self
            .provider
            .chat(request, &self.llm_model)
            .await
            .map_err(|e| EngineError::GenerationFailed(e.to_string()))?;

        Ok(AnswerResponse {
            answer,
            sources: chunks.to_vec(),
        })
    }
}

/// Retrieved chunks in relevance order, each tagged with its provenance.
fn format_context(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return "(no relevant passages were retrieved)".to_string();
    }

    let mut context = String::new();
    for (i, scored) in chunks.iter().enumerate() {
        context.push_str(&format!(
            "[{}] (Source: {}, relevance: {:.2})\n{}\n\n",
            i + 1,
            scored.chunk.source,
            scored.score,
            scored.chunk.content
        ));
    }
    context.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::store::ChunkRecord;
    use crate::test_util::MockProvider;

    fn scored(content: &str, source: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: ChunkRecord {
                chunk_id: "c".to_string(),
                content: content.to_string(),
                source: source.to_string(),
                start_offset: 0,
            },
            score,
        }
    }

    fn composer(provider: Arc<MockProvider>) -> AnswerComposer {
        AnswerComposer::new(provider, "test-llm".to_string(), 0.1)
    }

    #[tokio::test]
    async fn prompt_carries_grounding_rules_context_and_history() {
        let provider = Arc::new(MockProvider::with_replies(vec!["**Clinical Considerations:** ..."]));
        let chunks = vec![
            scored("Bloat requires evaluation within 1-2 hours.", "bloat.txt", 0.91),
            scored("Dental cleaning is annual.", "dental.txt", 0.40),
        ];
        let history = vec![ConversationTurn::user("my dog seems unwell")];

        composer(provider.clone())
            .compose("is this an emergency?", &history, &chunks)
            .await
            .unwrap();

        let requests = provider.chat_requests();
        assert_eq!(requests.len(), 1);
        let system = &requests[0].messages[0];
        assert_eq!(system.role, "system");
        assert!(system.content.contains("Use ONLY the retrieved context"));
        assert!(system.content.contains("not available in the current knowledge base"));
        assert!(system.content.contains("[1] (Source: bloat.txt"));
        assert!(system.content.contains("[2] (Source: dental.txt"));
        // Relevance order is preserved in the context block.
        let first = system.content.find("bloat.txt").unwrap();
        let second = system.content.find("dental.txt").unwrap();
        assert!(first < second);

        assert_eq!(requests[0].messages[1].content, "my dog seems unwell");
        assert_eq!(requests[0].messages[2].content, "is this an emergency?");
        assert_eq!(requests[0].temperature, Some(0.1));
    }

    #[tokio::test]
    async fn empty_retrieval_is_flagged_in_the_prompt() {
        let provider = Arc::new(MockProvider::with_replies(vec!["no data"]));

        composer(provider.clone())
            .compose("question", &[], &[])
            .await
            .unwrap();

        let requests = provider.chat_requests();
        assert!(requests[0].messages[0]
            .content
            .contains("no relevant passages were retrieved"));
    }

    #[tokio::test]
    async fn sources_are_returned_with_the_answer() {
        let provider = Arc::new(MockProvider::with_replies(vec!["answer text"]));
        let chunks = vec![scored("passage", "doc.txt", 0.8)];

        let response = composer(provider)
            .compose("question", &[], &chunks)
            .await
            .unwrap();

        assert_eq!(response.answer, "answer text");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].chunk.source, "doc.txt");
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_generation_failed() {
        let provider = Arc::new(MockProvider::failing_chat());

        let err = composer(provider)
            .compose("question", &[], &[])
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::GenerationFailed(_)));
    }
}
