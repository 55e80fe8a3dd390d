//! Collaborator stores for tasks, the profile, citations and the last plan
//!
//! The planner only talks to the traits here. [`MemoryStore`] keeps everything in memory;
//! [`FileStore`] keeps one JSON document on disk.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{Citation, GeneratedPlan, Task, UserProfile};

mod file;

pub use file::FileStore;

/// Errors from store adapters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Could not lock store: {0}")]
    Lock(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Task persistence
pub trait TaskStore {
    /// All tasks, or only those whose id is in `ids`
    fn list_tasks(&self, ids: Option<&[String]>) -> StoreResult<Vec<Task>>;

    fn get_task(&self, id: &str) -> StoreResult<Option<Task>>;

    /// Insert or replace by id
    fn save_task(&self, task: &Task) -> StoreResult<()>;

    /// Returns false if no task had that id
    fn delete_task(&self, id: &str) -> StoreResult<bool>;
}

/// Profile persistence
pub trait ProfileStore {
    fn load_profile(&self) -> StoreResult<UserProfile>;

    /// Change the profile in one read-modify-write and return the result
    ///
    /// History is append-only, so callers never write back a profile they loaded earlier.
    fn update_profile(&self, f: &mut dyn FnMut(&mut UserProfile)) -> StoreResult<UserProfile>;
}

/// Citation persistence
pub trait CitationStore {
    /// Add citations whose URL is not stored yet; returns how many were added
    fn save_citations(&self, citations: &[Citation]) -> StoreResult<usize>;

    fn list_citations(&self) -> StoreResult<Vec<Citation>>;

    fn get_citation(&self, id: &str) -> StoreResult<Option<Citation>>;

    /// Returns false if no citation had that id
    fn mark_untrusted(&self, id: &str) -> StoreResult<bool>;
}

/// Last-plan persistence
pub trait PlanStore {
    fn save_plan(&self, plan: &GeneratedPlan) -> StoreResult<()>;

    fn last_plan(&self) -> StoreResult<Option<GeneratedPlan>>;
}

/// Everything the planner service needs
pub trait Store: TaskStore + ProfileStore + CitationStore + PlanStore + Send + Sync {}

impl<T> Store for T where T: TaskStore + ProfileStore + CitationStore + PlanStore + Send + Sync {}

/// The whole persisted state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreData {
    pub tasks: Vec<Task>,
    pub profile: UserProfile,
    pub citations: Vec<Citation>,
    #[serde(rename = "last-plan")]
    pub last_plan: Option<GeneratedPlan>,
}

impl StoreData {
    fn list_tasks(&self, ids: Option<&[String]>) -> Vec<Task> {
        match ids {
            Some(ids) => self.tasks.iter().filter(|t| ids.contains(&t.id)).cloned().collect(),
            None => self.tasks.clone(),
        }
    }

    fn save_task(&mut self, task: &Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => self.tasks.push(task.clone()),
        }
    }

    fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    fn save_citations(&mut self, citations: &[Citation]) -> usize {
        let mut added = 0;
        for citation in citations {
            if self.citations.iter().any(|c| c.url == citation.url) {
                continue;
            }
            self.citations.push(citation.clone());
            added += 1;
        }
        added
    }

    fn mark_untrusted(&mut self, id: &str) -> bool {
        match self.citations.iter_mut().find(|c| c.id == id) {
            Some(citation) => {
                citation.trusted = false;
                true
            }
            None => false,
        }
    }
}

/// Access to a [`StoreData`] document
///
/// Adapters implement these two methods; the store traits come for free.
pub trait Document {
    fn read<R>(&self, f: impl FnOnce(&StoreData) -> R) -> StoreResult<R>;

    fn write<R>(&self, f: impl FnOnce(&mut StoreData) -> R) -> StoreResult<R>;
}

impl<D: Document> TaskStore for D {
    fn list_tasks(&self, ids: Option<&[String]>) -> StoreResult<Vec<Task>> {
        debug!(?ids, "list_tasks: called");
        self.read(|d| d.list_tasks(ids))
    }

    fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        self.read(|d| d.tasks.iter().find(|t| t.id == id).cloned())
    }

    fn save_task(&self, task: &Task) -> StoreResult<()> {
        debug!(task_id = %task.id, "save_task: called");
        self.write(|d| d.save_task(task))
    }

    fn delete_task(&self, id: &str) -> StoreResult<bool> {
        debug!(%id, "delete_task: called");
        self.write(|d| d.delete_task(id))
    }
}

impl<D: Document> ProfileStore for D {
    fn load_profile(&self) -> StoreResult<UserProfile> {
        self.read(|d| d.profile.clone())
    }

    fn update_profile(&self, f: &mut dyn FnMut(&mut UserProfile)) -> StoreResult<UserProfile> {
        debug!("update_profile: called");
        self.write(|d| {
            f(&mut d.profile);
            d.profile.clone()
        })
    }
}

impl<D: Document> CitationStore for D {
    fn save_citations(&self, citations: &[Citation]) -> StoreResult<usize> {
        debug!(count = citations.len(), "save_citations: called");
        self.write(|d| d.save_citations(citations))
    }

    fn list_citations(&self) -> StoreResult<Vec<Citation>> {
        self.read(|d| d.citations.clone())
    }

    fn get_citation(&self, id: &str) -> StoreResult<Option<Citation>> {
        self.read(|d| d.citations.iter().find(|c| c.id == id).cloned())
    }

    fn mark_untrusted(&self, id: &str) -> StoreResult<bool> {
        debug!(%id, "mark_untrusted: called");
        self.write(|d| d.mark_untrusted(id))
    }
}

impl<D: Document> PlanStore for D {
    fn save_plan(&self, plan: &GeneratedPlan) -> StoreResult<()> {
        debug!(entries = plan.len(), "save_plan: called");
        self.write(|d| d.last_plan = Some(plan.clone()))
    }

    fn last_plan(&self) -> StoreResult<Option<GeneratedPlan>> {
        self.read(|d| d.last_plan.clone())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the given state
    pub fn with_data(data: StoreData) -> Self {
        Self { data: Mutex::new(data) }
    }
}

impl Document for MemoryStore {
    fn read<R>(&self, f: impl FnOnce(&StoreData) -> R) -> StoreResult<R> {
        let data = self.data.lock().map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(f(&data))
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreData) -> R) -> StoreResult<R> {
        let mut data = self.data.lock().map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(f(&mut data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ShiftRecord, TaskDraft, TimeSlot};

    fn task(title: &str) -> Task {
        Task::from_draft(TaskDraft::new(title, "misc", "ok")).unwrap()
    }

    #[test]
    fn test_tasks_crud() {
        let store = MemoryStore::new();
        let a = task("Alpha");
        let b = task("Beta");
        store.save_task(&a).unwrap();
        store.save_task(&b).unwrap();

        assert_eq!(store.list_tasks(None).unwrap().len(), 2);
        let only_b = store.list_tasks(Some(std::slice::from_ref(&b.id))).unwrap();
        assert_eq!(only_b, vec![b.clone()]);
        assert!(store.list_tasks(Some(&[][..])).unwrap().is_empty());

        let mut moved = a.clone();
        moved.preferred_slot = Some(TimeSlot::Evening);
        store.save_task(&moved).unwrap();
        assert_eq!(store.get_task(&a.id).unwrap(), Some(moved));
        assert_eq!(store.list_tasks(None).unwrap()[0].id, a.id);

        assert!(store.delete_task(&a.id).unwrap());
        assert!(!store.delete_task(&a.id).unwrap());
        assert_eq!(store.get_task(&a.id).unwrap(), None);
    }

    #[test]
    fn test_citations_keyed_by_url() {
        let store = MemoryStore::new();
        let first = Citation::with_id("c1", "First", "https://x.example");
        let dup = Citation::with_id("c2", "Again", "https://x.example");
        let other = Citation::with_id("c3", "Other", "https://y.example");

        assert_eq!(store.save_citations(&[first.clone(), dup]).unwrap(), 1);
        assert_eq!(store.save_citations(&[other]).unwrap(), 1);
        assert_eq!(store.list_citations().unwrap().len(), 2);
        assert_eq!(store.get_citation("c1").unwrap(), Some(first));
        assert_eq!(store.get_citation("c2").unwrap(), None);
    }

    #[test]
    fn test_mark_untrusted_survives_resave() {
        let store = MemoryStore::new();
        store
            .save_citations(&[Citation::with_id("c1", "T", "https://x.example")])
            .unwrap();

        assert!(store.mark_untrusted("c1").unwrap());
        assert!(!store.mark_untrusted("missing").unwrap());

        store
            .save_citations(&[Citation::with_id("c9", "T", "https://x.example")])
            .unwrap();
        let stored = store.list_citations().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].trusted);
    }

    #[test]
    fn test_profile_and_plan_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.load_profile().unwrap(), UserProfile::default());
        assert_eq!(store.last_plan().unwrap(), None);

        let updated = store
            .update_profile(&mut |p| {
                p.distrust("c1");
            })
            .unwrap();
        assert!(updated.distrusted.contains("c1"));
        assert_eq!(store.load_profile().unwrap(), updated);

        store
            .update_profile(&mut |p| p.apply_shift(&ShiftRecord::new("t1", None, TimeSlot::Evening)))
            .unwrap();
        let profile = store.load_profile().unwrap();
        assert!(profile.distrusted.contains("c1"));
        assert_eq!(profile.last_shift("t1"), Some("evening"));

        let plan = GeneratedPlan::failed("nothing");
        store.save_plan(&plan).unwrap();
        assert_eq!(store.last_plan().unwrap(), Some(plan));
    }
}
