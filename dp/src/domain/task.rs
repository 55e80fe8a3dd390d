//! Task records

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::TimeSlot;
use super::id::generate_id;

/// Reasons a task cannot be materialized from a draft
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task title must not be empty")]
    EmptyTitle,
}

/// User input for a new task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub title: String,
    pub category: String,
    pub mood: String,
    #[serde(rename = "preferred-slot", alias = "preferred_slot")]
    pub preferred_slot: Option<TimeSlot>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, category: impl Into<String>, mood: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            mood: mood.into(),
            preferred_slot: None,
        }
    }
}

/// A task to be placed in the day
///
/// Everything except the preferred slot is fixed once the task exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identifier, generated when absent
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub mood: String,
    /// Slot the user asked for explicitly
    #[serde(default, rename = "preferred-slot", alias = "preferred_slot")]
    pub preferred_slot: Option<TimeSlot>,
}

impl Task {
    /// Materialize a task from a draft, assigning a fresh id
    pub fn from_draft(draft: TaskDraft) -> Result<Self, TaskError> {
        debug!(title = %draft.title, "Task::from_draft: called");
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            debug!("Task::from_draft: empty title");
            return Err(TaskError::EmptyTitle);
        }

        Ok(Self {
            id: generate_id("task", &title),
            title,
            category: draft.category.trim().to_string(),
            mood: draft.mood.trim().to_string(),
            preferred_slot: draft.preferred_slot,
        })
    }

    /// Assign an id if the task was loaded without one
    pub fn ensure_id(&mut self) -> &str {
        if self.id.trim().is_empty() {
            self.id = generate_id("task", &self.title);
            debug!(id = %self.id, "Task::ensure_id: assigned id");
        }
        &self.id
    }

    /// Query used when searching for supporting articles
    pub fn search_query(&self) -> String {
        if self.category.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.category)
        }
    }
}
