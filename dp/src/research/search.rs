//! Article search through the model endpoint

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::{CitationSearch, into_citation};
use crate::config::LlmConfig;
use crate::domain::{Citation, Task};
use crate::extract;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::{PromptLoader, SearchPromptContext};

/// [`CitationSearch`] backed by an [`LlmClient`]
pub struct LlmCitationSearch {
    client: Option<Arc<dyn LlmClient>>,
    prompts: Arc<PromptLoader>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmCitationSearch {
    pub fn new(client: Option<Arc<dyn LlmClient>>, prompts: Arc<PromptLoader>, config: &LlmConfig) -> Self {
        debug!(has_client = client.is_some(), "LlmCitationSearch::new: called");
        Self {
            client,
            prompts,
            temperature: config.temperature,
            max_tokens: config.search_max_tokens,
        }
    }

    fn build_request(&self, query: &str, limit: usize) -> eyre::Result<CompletionRequest> {
        let ctx = SearchPromptContext {
            query: query.to_string(),
            limit,
        };
        Ok(CompletionRequest {
            messages: vec![
                Message::system(self.prompts.render("search-system", &ctx)?),
                Message::user(self.prompts.render("search-user", &ctx)?),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }

    async fn ask(&self, client: &dyn LlmClient, query: &str, limit: usize) -> Result<String, LlmError> {
        let request = self
            .build_request(query, limit)
            .map_err(|e| LlmError::InvalidResponse(format!("Could not build search prompt: {}", e)))?;
        let response = client.complete(request).await?;
        response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("Empty search reply".to_string()))
    }
}

#[async_trait]
impl CitationSearch for LlmCitationSearch {
    async fn search(&self, task: &Task, limit: usize) -> Vec<Citation> {
        let query = task.search_query();
        debug!(%query, %limit, "LlmCitationSearch::search: called");

        let Some(client) = self.client.as_deref() else {
            warn!(%query, "Search skipped: no API key configured");
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        let text = match self.ask(client, &query, limit).await {
            Ok(text) => text,
            Err(e) => {
                error!(%query, error = %e, class = ?e.failure_class(), "Search request failed");
                return Vec::new();
            }
        };

        let citations: Vec<Citation> = extract::extract_sources(&text, &query)
            .into_iter()
            .take(limit)
            .map(into_citation)
            .collect();

        info!(%query, found = citations.len(), "Search finished");
        citations
    }
}
