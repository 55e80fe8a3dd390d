//! LLM client module
//!
//! Transport to the external text-generation endpoint used for slot ranking and
//! article search.

use std::sync::Arc;

use tracing::debug;

mod chat;
pub mod client;
mod error;
mod types;

pub use chat::ChatCompletionsClient;
pub use client::LlmClient;
pub use error::{FailureClass, LlmError};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client from config
///
/// Returns [`LlmError::MissingCredential`] when no API key is configured; callers treat
/// that as degraded mode.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(model = %config.model, base_url = %config.base_url, "create_client: called");
    Ok(Arc::new(ChatCompletionsClient::from_config(config)?))
}
