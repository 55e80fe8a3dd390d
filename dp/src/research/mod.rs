//! External research: slot ranking and article search
//!
//! Both components sit in front of the model endpoint and absorb every failure into a
//! degraded result. Callers see a [`RankingResult`] or a (possibly empty) citation list,
//! never an [`LlmError`](crate::llm::LlmError).

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{Citation, CitationPool, Task, TimeSlot};
use crate::extract::SourceCandidate;

mod ranking;
mod search;

pub use ranking::{LlmSlotRanker, degraded_justification};
pub use search::LlmCitationSearch;

/// Answer from the slot ranker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingResult {
    pub slot: TimeSlot,
    pub citations: Vec<Citation>,
    pub justification: String,
}

impl RankingResult {
    /// The default slot with no evidence
    pub fn fallback(justification: impl Into<String>) -> Self {
        Self {
            slot: TimeSlot::FALLBACK,
            citations: Vec::new(),
            justification: justification.into(),
        }
    }
}

/// Decides which slot suits a task best
#[async_trait]
pub trait SlotRanker: Send + Sync {
    /// Rank a task by title; always produces a result
    async fn rank(&self, task_title: &str) -> RankingResult;
}

/// Finds articles relevant to a task
#[async_trait]
pub trait CitationSearch: Send + Sync {
    /// Up to `limit` citations; empty on any failure
    async fn search(&self, task: &Task, limit: usize) -> Vec<Citation>;
}

/// Results of searching a whole batch of tasks
#[derive(Debug, Clone, Default)]
pub struct SearchBatch {
    /// Each task's own results, in task order
    pub per_task: Vec<Vec<Citation>>,
    /// All results merged, first URL seen wins
    pub merged: Vec<Citation>,
}

/// Search every task in turn and merge the results
pub async fn search_all(search: &dyn CitationSearch, tasks: &[Task], limit: usize) -> SearchBatch {
    debug!(task_count = tasks.len(), %limit, "search_all: called");
    let mut pool = CitationPool::new();
    let mut per_task = Vec::with_capacity(tasks.len());
    for task in tasks {
        let found = search.search(task, limit).await;
        let added = pool.extend(found.iter().cloned());
        debug!(task_id = %task.id, found = found.len(), %added, "search_all: merged task results");
        per_task.push(found);
    }
    SearchBatch {
        per_task,
        merged: pool.into_vec(),
    }
}

fn into_citation(candidate: SourceCandidate) -> Citation {
    match candidate.id {
        Some(id) => Citation::with_id(id, candidate.title, candidate.url),
        None => Citation::new(candidate.title, candidate.url),
    }
}
