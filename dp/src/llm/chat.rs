//! Chat-completions API client
//!
//! Implements the LlmClient trait for OpenAI-compatible `/chat/completions` endpoints.
//! One request per call, no retries: callers degrade instead.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, TokenUsage};
use crate::config::LlmConfig;

/// Maximum number of body characters kept in an API error message
const ERROR_BODY_LIMIT: usize = 500;

/// Chat-completions API client
pub struct ChatCompletionsClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl ChatCompletionsClient {
    /// Create a new client from configuration
    ///
    /// Fails with [`LlmError::MissingCredential`] when the API key variable is unset.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config
            .api_key()
            .ok_or_else(|| LlmError::MissingCredential(config.api_key_env.clone()))?;

        Self::new(&config.base_url, &config.model, api_key, config.timeout())
    }

    /// Create a client with explicit settings
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Build the request body for the API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        serde_json::json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    /// Parse the API response
    fn parse_response(&self, api_response: ChatResponse) -> Result<CompletionResponse, LlmError> {
        debug!(choices = api_response.choices.len(), "parse_response: called");
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("Reply has no choices".to_string()))?;

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content,
            usage,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            debug!(error = %e, "map_send_error: timeout");
            LlmError::Timeout(self.timeout)
        } else {
            debug!(error = %e, "map_send_error: network error");
            LlmError::Network(e)
        }
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = self.endpoint();
        let body = self.build_request_body(&request);

        info!(%url, model = %self.model, "Sending completion request");
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        info!(status = status.as_u16(), "Received completion reply");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            warn!(status = status.as_u16(), %message, "complete: API error");
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.map_err(|e| self.map_send_error(e))?;
        let api_response: ChatResponse = serde_json::from_str(&text)?;
        self.parse_response(api_response)
    }
}

// Chat-completions response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}
