//! Slot ranking through the model endpoint

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{RankingResult, SlotRanker, into_citation};
use crate::config::LlmConfig;
use crate::domain::TimeSlot;
use crate::extract::{self, Record};
use crate::llm::{CompletionRequest, FailureClass, LlmClient, LlmError, Message};
use crate::prompts::{PromptLoader, RankPromptContext};

/// Justification attached to the default slot for each kind of failure
pub fn degraded_justification(class: FailureClass) -> &'static str {
    match class {
        FailureClass::Credential => "Default slot: the ranking service is not configured.",
        FailureClass::Timeout => "Default slot: the ranking service timed out.",
        FailureClass::Connection => "Default slot: could not connect to the ranking service.",
        FailureClass::ApiStatus => "Default slot: the ranking service returned an error.",
        FailureClass::Parse => "Default slot: the ranking reply could not be understood.",
    }
}

/// [`SlotRanker`] backed by an [`LlmClient`]
///
/// Without a client every call answers the default slot.
pub struct LlmSlotRanker {
    client: Option<Arc<dyn LlmClient>>,
    prompts: Arc<PromptLoader>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmSlotRanker {
    pub fn new(client: Option<Arc<dyn LlmClient>>, prompts: Arc<PromptLoader>, config: &LlmConfig) -> Self {
        debug!(has_client = client.is_some(), "LlmSlotRanker::new: called");
        Self {
            client,
            prompts,
            temperature: config.temperature,
            max_tokens: config.ranking_max_tokens,
        }
    }

    fn degrade(&self, task_title: &str, class: FailureClass) -> RankingResult {
        warn!(%task_title, ?class, slot = %TimeSlot::FALLBACK, "Ranking degraded to default slot");
        RankingResult::fallback(degraded_justification(class))
    }

    fn build_request(&self, task_title: &str) -> eyre::Result<CompletionRequest> {
        let prompt = self.prompts.render("rank", &RankPromptContext::new(task_title))?;
        Ok(CompletionRequest {
            messages: vec![Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }

    async fn ask(&self, client: &dyn LlmClient, task_title: &str) -> Result<String, LlmError> {
        let request = self
            .build_request(task_title)
            .map_err(|e| LlmError::InvalidResponse(format!("Could not build ranking prompt: {}", e)))?;
        let response = client.complete(request).await?;
        response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("Empty ranking reply".to_string()))
    }
}

/// Turn an extracted record into a ranking result
fn interpret(task_title: &str, record: &Record) -> RankingResult {
    let answer = record.get("answer").and_then(Value::as_str).unwrap_or_default();
    let slot = TimeSlot::from_model_answer(answer);

    let citations: Vec<_> = extract::sources_from_record(record, "sources", task_title)
        .into_iter()
        .map(into_citation)
        .collect();

    let justification = if citations.is_empty() {
        format!("Best time for '{}' is {}.", task_title, slot)
    } else {
        format!(
            "Based on {} sources, the best time for '{}' is {}.",
            citations.len(),
            task_title,
            slot
        )
    };

    RankingResult {
        slot,
        citations,
        justification,
    }
}

#[async_trait]
impl SlotRanker for LlmSlotRanker {
    async fn rank(&self, task_title: &str) -> RankingResult {
        debug!(%task_title, "LlmSlotRanker::rank: called");
        let Some(client) = self.client.as_deref() else {
            return self.degrade(task_title, FailureClass::Credential);
        };

        let text = match self.ask(client, task_title).await {
            Ok(text) => text,
            Err(e) => {
                error!(%task_title, error = %e, "Ranking request failed");
                return self.degrade(task_title, e.failure_class());
            }
        };

        let Some(record) = extract::extract_record(&text) else {
            let preview: String = text.chars().take(200).collect();
            warn!(%task_title, %preview, "No structured data in ranking reply");
            return self.degrade(task_title, FailureClass::Parse);
        };

        let result = interpret(task_title, &record);
        info!(%task_title, slot = %result.slot, citations = result.citations.len(), "Ranked task");
        result
    }
}
