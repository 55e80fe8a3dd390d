//! LLM request/response types
//!
//! These model the chat-completions shape: role-tagged text messages in, free text out.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Role-tagged messages, sent in order
    pub messages: Vec<Message>,

    /// Sampling temperature
    pub temperature: f32,

    /// Max tokens for the reply
    pub max_tokens: u32,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        debug!("Message::system: called");
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// The reply to a completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Free text of the first choice, if any
    pub content: Option<String>,

    /// Token usage, zero when the provider omits it
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Response carrying only text (used by mocks and stubs)
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            usage: TokenUsage::default(),
        }
    }
}
