//! Planner service: the operations the CLI exposes, backed by a [`Store`]

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::orchestrator::{GenerationOptions, PlanGenerator};
use crate::config::Config;
use crate::domain::{
    Citation, GeneratedPlan, ShiftRecord, Task, TaskDraft, TaskError, TimeSlot, UserProfile,
};
use crate::llm;
use crate::prompts::PromptLoader;
use crate::research::{CitationSearch, LlmCitationSearch, LlmSlotRanker, SlotRanker};
use crate::store::{CitationStore, PlanStore, ProfileStore, Store, StoreError, TaskStore};

/// Message carried by the plan returned when no task could be created
pub const NO_TASKS_MESSAGE: &str = "No tasks could be created from the request";

/// Errors from planner operations
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid task: {0}")]
    InvalidTask(#[from] TaskError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type PlannerResult<T> = Result<T, PlannerError>;

/// Day planner operations over a store, a ranker and a search
pub struct PlannerService {
    store: Arc<dyn Store>,
    ranker: Arc<dyn SlotRanker>,
    search: Arc<dyn CitationSearch>,
    options: GenerationOptions,
}

impl PlannerService {
    pub fn new(
        store: Arc<dyn Store>,
        ranker: Arc<dyn SlotRanker>,
        search: Arc<dyn CitationSearch>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            store,
            ranker,
            search,
            options,
        }
    }

    /// Wire up the model-backed ranker and search from config
    ///
    /// A missing API key is not an error: both components run in degraded mode.
    pub fn from_config(config: &Config, store: Arc<dyn Store>) -> Self {
        debug!("PlannerService::from_config: called");
        let client = match llm::create_client(&config.llm) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "No LLM client, running in degraded mode");
                None
            }
        };
        let prompts = Arc::new(PromptLoader::new(config.planner.prompts_dir.as_deref()));

        let ranker = LlmSlotRanker::new(client.clone(), prompts.clone(), &config.llm);
        let search = LlmCitationSearch::new(client, prompts, &config.llm);
        let options = GenerationOptions {
            search_limit: config.planner.search_limit,
            fallback_citations: config.planner.fallback_citations,
        };

        Self::new(store, Arc::new(ranker), Arc::new(search), options)
    }

    /// Create and store a task from a draft
    pub fn create_task(&self, draft: TaskDraft) -> PlannerResult<Task> {
        debug!(title = %draft.title, "create_task: called");
        let task = Task::from_draft(draft)?;
        self.store.save_task(&task)?;
        info!(task_id = %task.id, title = %task.title, "Created task");
        Ok(task)
    }

    /// All tasks, or only those with the given ids
    pub fn list_tasks(&self, ids: Option<&[String]>) -> PlannerResult<Vec<Task>> {
        Ok(self.store.list_tasks(ids)?)
    }

    /// Delete a task; its shift history stays in the profile
    pub fn delete_task(&self, task_id: &str) -> PlannerResult<()> {
        debug!(%task_id, "delete_task: called");
        if !self.store.delete_task(task_id)? {
            return Err(PlannerError::TaskNotFound(task_id.to_string()));
        }
        info!(%task_id, "Deleted task");
        Ok(())
    }

    /// Generate a plan for stored tasks, optionally limited to some ids
    pub async fn generate_plan(&self, ids: Option<&[String]>) -> PlannerResult<GeneratedPlan> {
        debug!(?ids, "generate_plan: called");
        let tasks = self.store.list_tasks(ids)?;
        self.generate_for_tasks(&tasks).await
    }

    /// Plan stored tasks, or create tasks from `drafts` when the store has none
    ///
    /// Drafts that fail to become tasks are skipped. If none succeed the result is the
    /// error-flagged plan. An empty `drafts` list counts as a failed request, not as
    /// empty input.
    pub async fn generate_for_request(&self, drafts: Vec<TaskDraft>) -> PlannerResult<GeneratedPlan> {
        debug!(draft_count = drafts.len(), "generate_for_request: called");
        let mut tasks = self.store.list_tasks(None)?;

        if tasks.is_empty() {
            for draft in drafts {
                match self.create_task(draft) {
                    Ok(task) => tasks.push(task),
                    Err(PlannerError::InvalidTask(e)) => warn!(error = %e, "Skipping draft"),
                    Err(e) => return Err(e),
                }
            }
            if tasks.is_empty() {
                warn!("{}", NO_TASKS_MESSAGE);
                return Ok(GeneratedPlan::failed(NO_TASKS_MESSAGE));
            }
        } else {
            info!(task_count = tasks.len(), "Using stored tasks for request");
        }

        self.generate_for_tasks(&tasks).await
    }

    async fn generate_for_tasks(&self, tasks: &[Task]) -> PlannerResult<GeneratedPlan> {
        let profile = self.store.load_profile()?;
        let generator = PlanGenerator::new(self.search.as_ref(), self.ranker.as_ref(), self.options);
        let mut plan = generator.generate(tasks, &profile).await;

        let added = self.store.save_citations(&plan.citations)?;
        self.adopt_stored_ids(&mut plan.citations)?;
        self.store.save_plan(&plan)?;
        self.store.update_profile(&mut |profile| {
            profile.recompute_chronotype();
        })?;

        info!(entries = plan.len(), new_citations = added, "Saved plan");
        Ok(plan)
    }

    /// Replace each citation's id with the id stored for its URL
    fn adopt_stored_ids(&self, citations: &mut [Citation]) -> PlannerResult<()> {
        let stored = self.store.list_citations()?;
        for citation in citations.iter_mut() {
            if let Some(known) = stored.iter().find(|c| c.url == citation.url)
                && known.id != citation.id
            {
                debug!(url = %citation.url, from = %citation.id, to = %known.id, "adopt_stored_ids: reusing stored id");
                citation.id = known.id.clone();
            }
        }
        Ok(())
    }

    /// Move a task to a slot by hand
    ///
    /// The slot becomes the task's preference and is appended to its shift history.
    pub fn shift_task(&self, task_id: &str, slot: TimeSlot) -> PlannerResult<ShiftRecord> {
        debug!(%task_id, %slot, "shift_task: called");
        let mut task = self
            .store
            .get_task(task_id)?
            .ok_or_else(|| PlannerError::TaskNotFound(task_id.to_string()))?;

        let from = match task.preferred_slot {
            Some(slot) => Some(slot),
            None => self
                .store
                .last_plan()?
                .and_then(|plan| plan.entries().find(|e| e.task_id == task_id).map(|e| e.slot)),
        };

        let record = ShiftRecord::new(task_id, from, slot);
        let profile = self.store.update_profile(&mut |profile| {
            profile.apply_shift(&record);
            profile.recompute_chronotype();
        })?;

        task.preferred_slot = Some(slot);
        self.store.save_task(&task)?;

        info!(%task_id, ?from, to = %slot, chronotype = ?profile.chronotype, "Shifted task");
        Ok(record)
    }

    /// Stop trusting a citation
    ///
    /// The id (and the URL, if the citation is stored) joins the profile's distrust set.
    /// Returns whether a stored citation was found.
    pub fn distrust_citation(&self, citation_id: &str) -> PlannerResult<bool> {
        debug!(%citation_id, "distrust_citation: called");
        let stored = self.store.get_citation(citation_id)?;
        let url = stored.as_ref().map(|c| c.url.as_str());
        self.store.update_profile(&mut |profile| {
            profile.distrust(citation_id);
            if let Some(url) = url {
                profile.distrust(url);
            }
        })?;

        if stored.is_some() {
            self.store.mark_untrusted(citation_id)?;
        } else {
            warn!(%citation_id, "Distrusted citation is not in the store");
        }

        info!(%citation_id, found = stored.is_some(), "Citation distrusted");
        Ok(stored.is_some())
    }

    pub fn citations(&self) -> PlannerResult<Vec<Citation>> {
        Ok(self.store.list_citations()?)
    }

    pub fn profile(&self) -> PlannerResult<UserProfile> {
        Ok(self.store.load_profile()?)
    }

    pub fn last_plan(&self) -> PlannerResult<Option<GeneratedPlan>> {
        Ok(self.store.last_plan()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Chronotype;
    use crate::research::RankingResult;
    use crate::research::stub::{StubRanker, StubSearch};
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    /// Ranker whose citations get a fresh generated id on every call
    struct FreshIdRanker;

    #[async_trait]
    impl SlotRanker for FreshIdRanker {
        async fn rank(&self, _task_title: &str) -> RankingResult {
            RankingResult {
                slot: TimeSlot::Morning,
                citations: vec![Citation::new("Shaky study", "https://shaky.example")],
                justification: "Ranked".to_string(),
            }
        }
    }

    /// Ranker that records a manual shift for another task while it is ranking
    struct ShiftingRanker {
        store: Arc<MemoryStore>,
    }

    #[async_trait]
    impl SlotRanker for ShiftingRanker {
        async fn rank(&self, _task_title: &str) -> RankingResult {
            self.store
                .update_profile(&mut |p| p.apply_shift(&ShiftRecord::new("other-task", None, TimeSlot::Evening)))
                .expect("profile update");
            RankingResult::fallback("Ranked")
        }
    }

    fn service_with(ranker: Arc<StubRanker>, search: StubSearch) -> (PlannerService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = PlannerService::new(store.clone(), ranker, Arc::new(search), GenerationOptions::default());
        (service, store)
    }

    fn service() -> (PlannerService, Arc<MemoryStore>) {
        service_with(Arc::new(StubRanker::new(TimeSlot::Midday)), StubSearch::new())
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let (service, _) = service();
        let err = service.create_task(TaskDraft::new("  ", "x", "y")).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidTask(TaskError::EmptyTitle)));
        assert!(service.list_tasks(None).unwrap().is_empty());
    }

    #[test]
    fn test_delete_keeps_history() {
        let (service, _) = service();
        let task = service.create_task(TaskDraft::new("Run", "sport", "")).unwrap();
        service.shift_task(&task.id, TimeSlot::Morning).unwrap();

        service.delete_task(&task.id).unwrap();
        assert!(service.list_tasks(None).unwrap().is_empty());
        assert_eq!(service.profile().unwrap().last_shift(&task.id), Some("morning"));
        assert!(matches!(
            service.delete_task(&task.id),
            Err(PlannerError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_filters_by_id_and_persists() {
        let ranker = Arc::new(StubRanker::new(TimeSlot::Evening));
        let (service, _) = service_with(ranker.clone(), StubSearch::new());
        let a = service.create_task(TaskDraft::new("Read", "", "")).unwrap();
        let b = service.create_task(TaskDraft::new("Write", "", "")).unwrap();

        let plan = service.generate_plan(Some(std::slice::from_ref(&b.id))).await.unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.evening[0].task_id, b.id);
        assert_eq!(ranker.titles(), vec!["Write".to_string()]);
        assert_eq!(service.last_plan().unwrap(), Some(plan));

        let all = service.generate_plan(None).await.unwrap();
        assert_eq!(all.evening.len(), 2);
        assert_eq!(all.evening[0].task_id, a.id);
    }

    #[tokio::test]
    async fn test_generate_with_no_tasks_is_empty_not_error() {
        let (service, _) = service();
        let plan = service.generate_plan(None).await.unwrap();
        assert!(plan.is_empty());
        assert!(!plan.is_error());
    }

    #[tokio::test]
    async fn test_generate_saves_citations() {
        let ranker = Arc::new(StubRanker::with_citations(
            TimeSlot::Morning,
            vec![Citation::with_id("r1", "Early birds", "https://early.example")],
        ));
        let (service, _) = service_with(ranker, StubSearch::new());
        service.create_task(TaskDraft::new("Meditate", "", "")).unwrap();

        service.generate_plan(None).await.unwrap();
        service.generate_plan(None).await.unwrap();

        let stored = service.citations().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Early birds");
    }

    #[tokio::test]
    async fn test_request_uses_stored_tasks_first() {
        let (service, _) = service();
        service.create_task(TaskDraft::new("Stored", "", "")).unwrap();

        let plan = service
            .generate_for_request(vec![TaskDraft::new("Ignored", "", "")])
            .await
            .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.midday[0].task_title, "Stored");
        assert_eq!(service.list_tasks(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_request_creates_tasks_and_skips_failures() {
        let (service, _) = service();
        let plan = service
            .generate_for_request(vec![
                TaskDraft::new("", "", ""),
                TaskDraft::new("Cook", "home", "hungry"),
            ])
            .await
            .unwrap();

        assert!(!plan.is_error());
        assert_eq!(plan.len(), 1);
        assert_eq!(service.list_tasks(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_request_all_failed_is_error_plan() {
        let (service, _) = service();
        let plan = service
            .generate_for_request(vec![TaskDraft::new("", "", ""), TaskDraft::new("   ", "", "")])
            .await
            .unwrap();

        assert!(plan.is_error());
        assert_eq!(plan.error_message.as_deref(), Some(NO_TASKS_MESSAGE));
        assert!(plan.is_empty());
        assert!(plan.citations.is_empty());

        let empty = service.generate_for_request(Vec::new()).await.unwrap();
        assert!(empty.is_error());
    }

    #[tokio::test]
    async fn test_shift_records_history_and_preference() {
        let (service, store) = service();
        let task = service.create_task(TaskDraft::new("Gym", "sport", "")).unwrap();
        service.generate_plan(None).await.unwrap();

        let record = service.shift_task(&task.id, TimeSlot::Evening).unwrap();
        assert_eq!(record.from, Some(TimeSlot::Midday));
        assert_eq!(record.to, TimeSlot::Evening);

        let stored = store.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.preferred_slot, Some(TimeSlot::Evening));

        let second = service.shift_task(&task.id, TimeSlot::Morning).unwrap();
        assert_eq!(second.from, Some(TimeSlot::Evening));

        let profile = service.profile().unwrap();
        assert_eq!(profile.shift_history[&task.id], vec!["evening", "morning"]);
        assert_eq!(profile.shift_log.len(), 2);
    }

    #[test]
    fn test_shift_unknown_task() {
        let (service, _) = service();
        assert!(matches!(
            service.shift_task("task-nope", TimeSlot::Morning),
            Err(PlannerError::TaskNotFound(id)) if id == "task-nope"
        ));
    }

    #[test]
    fn test_shift_recomputes_chronotype() {
        let (service, _) = service();
        let tasks: Vec<Task> = ["A", "B", "C"]
            .iter()
            .map(|t| service.create_task(TaskDraft::new(*t, "", "")).unwrap())
            .collect();

        for task in &tasks {
            service.shift_task(&task.id, TimeSlot::Evening).unwrap();
        }
        // 3 evening vs 0 morning is exactly the margin plus one
        assert_eq!(service.profile().unwrap().chronotype, Some(Chronotype::Owl));
    }

    #[tokio::test]
    async fn test_distrust_flags_store_and_future_plans() {
        let ranker = Arc::new(StubRanker::with_citations(
            TimeSlot::Morning,
            vec![Citation::with_id("r1", "Shaky", "https://shaky.example")],
        ));
        let (service, _) = service_with(ranker, StubSearch::new());
        service.create_task(TaskDraft::new("Plan week", "", "")).unwrap();
        service.generate_plan(None).await.unwrap();

        assert!(service.distrust_citation("r1").unwrap());
        assert!(!service.citations().unwrap()[0].trusted);

        let profile = service.profile().unwrap();
        assert!(profile.distrusted.contains("r1"));
        assert!(profile.distrusted.contains("https://shaky.example"));

        let plan = service.generate_plan(None).await.unwrap();
        assert!(!plan.citations[0].trusted);

        assert!(!service.distrust_citation("unknown").unwrap());
        assert!(service.profile().unwrap().distrusted.contains("unknown"));
    }

    #[tokio::test]
    async fn test_plan_citation_ids_match_store() {
        let store = Arc::new(MemoryStore::new());
        let service = PlannerService::new(
            store.clone(),
            Arc::new(FreshIdRanker),
            Arc::new(StubSearch::new()),
            GenerationOptions::default(),
        );
        service.create_task(TaskDraft::new("Plan week", "", "")).unwrap();

        let first = service.generate_plan(None).await.unwrap();
        let second = service.generate_plan(None).await.unwrap();
        let shown_id = second.citations[0].id.clone();
        assert_eq!(shown_id, first.citations[0].id);
        assert_eq!(service.last_plan().unwrap().unwrap().citations[0].id, shown_id);

        assert!(service.distrust_citation(&shown_id).unwrap());
        assert!(!store.get_citation(&shown_id).unwrap().unwrap().trusted);

        let third = service.generate_plan(None).await.unwrap();
        assert_eq!(third.citations[0].id, shown_id);
        assert!(!third.citations[0].trusted);
    }

    #[tokio::test]
    async fn test_generation_keeps_shifts_made_meanwhile() {
        let store = Arc::new(MemoryStore::new());
        let ranker = Arc::new(ShiftingRanker { store: store.clone() });
        let service = PlannerService::new(store, ranker, Arc::new(StubSearch::new()), GenerationOptions::default());
        service.create_task(TaskDraft::new("Read", "", "")).unwrap();

        service.generate_plan(None).await.unwrap();

        let profile = service.profile().unwrap();
        assert_eq!(profile.last_shift("other-task"), Some("evening"));
        assert_eq!(profile.shift_log.len(), 1);
    }
}
