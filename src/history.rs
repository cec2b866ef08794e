//! Conversation history types.
//!
//! The engine holds no session state: the caller owns the transcript and
//! passes it in whole on every turn. The engine only decides how much of
//! it to forward to the model.

use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a caller-owned conversation transcript, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn to_chat_message(&self) -> ChatMessage {
        match self.role {
            Role::User => ChatMessage::user(self.content.clone()),
            Role::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}

/// The most recent `max_turns` turns, oldest first. History can grow
/// without bound on the caller's side; the model only ever sees this
/// window.
pub fn window_turns(history: &[ConversationTurn], max_turns: usize) -> &[ConversationTurn] {
    let start = history.len().saturating_sub(max_turns);
    &history[start..]
}
