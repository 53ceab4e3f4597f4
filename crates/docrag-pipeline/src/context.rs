//! Turning retrieved chunks into a grounding turn for generation.

use serde::{Deserialize, Serialize};

pub const CHUNK_SEPARATOR: &str = "\n\n";
pub const CONTEXT_HEADER: &str = "Relevant context:\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversational turn in the OpenAI message shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self { Self { role, content: content.into() } }

    pub fn system(content: impl Into<String>) -> Self { Self::new(Role::System, content) }

    pub fn user(content: impl Into<String>) -> Self { Self::new(Role::User, content) }

    pub fn assistant(content: impl Into<String>) -> Self { Self::new(Role::Assistant, content) }
}

/// Join chunks in the order received. `None` when nothing was retrieved.
pub fn assemble_context(chunks: &[String]) -> Option<String> {
    if chunks.is_empty() {
        return None;
    }
    Some(chunks.join(CHUNK_SEPARATOR))
}

/// Content of the last user turn, or `""` if there is none.
pub fn latest_user_message(conversation: &[ChatTurn]) -> &str {
    conversation
        .iter()
        .rev()
        .find(|t| t.role == Role::User)
        .map(|t| t.content.as_str())
        .unwrap_or("")
}

/// Prepend a single system turn carrying the context block. Without context
/// the conversation goes out ungrounded and unchanged.
pub fn ground_conversation(conversation: &[ChatTurn], chunks: &[String]) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(conversation.len() + 1);
    if let Some(context) = assemble_context(chunks) {
        turns.push(ChatTurn::system(format!("{}{}", CONTEXT_HEADER, context)));
    }
    turns.extend_from_slice(conversation);
    turns
}
