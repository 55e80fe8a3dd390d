//! Plan generation for a batch of tasks

use tracing::{debug, info};

use super::resolver::TimeBlockResolver;
use crate::domain::{Citation, GeneratedPlan, PlanEntry, Task, UserProfile, dedup_by_url};
use crate::research::{CitationSearch, SlotRanker, search_all};

/// Settings that shape one generation
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    /// Citations requested per task search
    pub search_limit: usize,
    /// Batch citations borrowed by a task whose own search found nothing
    pub fallback_citations: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            search_limit: 2,
            fallback_citations: 2,
        }
    }
}

/// Prefix naming the citations a justification rests on, empty when there are none
pub fn evidence_preamble(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return String::new();
    }
    let titles: Vec<&str> = citations.iter().map(|c| c.title.as_str()).collect();
    format!("Based on: {}. ", titles.join(", "))
}

/// Turns tasks plus a profile into a [`GeneratedPlan`]
///
/// All external calls are awaited one after another; nothing runs concurrently.
pub struct PlanGenerator<'a> {
    search: &'a dyn CitationSearch,
    resolver: TimeBlockResolver<'a>,
    options: GenerationOptions,
}

impl<'a> PlanGenerator<'a> {
    pub fn new(search: &'a dyn CitationSearch, ranker: &'a dyn SlotRanker, options: GenerationOptions) -> Self {
        Self {
            search,
            resolver: TimeBlockResolver::new(ranker),
            options,
        }
    }

    /// Generate a plan, one entry per task, in task order within each slot
    ///
    /// No tasks means an empty plan, not an error.
    pub async fn generate(&self, tasks: &[Task], profile: &UserProfile) -> GeneratedPlan {
        debug!(task_count = tasks.len(), "PlanGenerator::generate: called");
        if tasks.is_empty() {
            info!("No tasks to plan");
            return GeneratedPlan::empty();
        }

        let tasks: Vec<Task> = tasks
            .iter()
            .cloned()
            .map(|mut t| {
                t.ensure_id();
                t
            })
            .collect();

        let batch = search_all(self.search, &tasks, self.options.search_limit).await;
        info!(
            task_count = tasks.len(),
            batch_citations = batch.merged.len(),
            "Searched articles for batch"
        );

        let mut entries = Vec::with_capacity(tasks.len());
        let mut collected = Vec::new();

        for (task, found) in tasks.iter().zip(batch.per_task) {
            let evidence = if found.is_empty() {
                debug!(task_id = %task.id, "generate: no task citations, borrowing from batch");
                batch
                    .merged
                    .iter()
                    .take(self.options.fallback_citations)
                    .cloned()
                    .collect()
            } else {
                found
            };

            let decision = self.resolver.resolve(task, profile).await;
            let justification = format!("{}{}", evidence_preamble(&evidence), decision.justification);

            collected.extend(decision.citations);
            collected.extend(evidence);

            info!(task_id = %task.id, slot = %decision.slot, source = ?decision.source, "Placed task");
            entries.push(PlanEntry::new(task, decision.slot, justification));
        }

        let citations: Vec<Citation> = dedup_by_url(collected)
            .into_iter()
            .map(|mut c| {
                if profile.distrusts(&c) {
                    c.trusted = false;
                }
                c
            })
            .collect();

        let plan = GeneratedPlan::from_entries(entries, citations);
        info!(
            morning = plan.morning.len(),
            midday = plan.midday.len(),
            evening = plan.evening.len(),
            citations = plan.citations.len(),
            "Plan generated"
        );
        plan
    }
}
