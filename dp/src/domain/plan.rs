//! Generated day plans

use serde::{Deserialize, Serialize};

use super::{Citation, Task, TimeSlot};

/// One task placed in one slot
///
/// The task fields are a snapshot taken at generation time, not a live reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub task_id: String,
    pub task_title: String,
    pub task_category: String,
    pub task_mood: String,
    pub slot: TimeSlot,
    pub justification: String,
}

impl PlanEntry {
    pub fn new(task: &Task, slot: TimeSlot, justification: impl Into<String>) -> Self {
        Self {
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            task_category: task.category.clone(),
            task_mood: task.mood.clone(),
            slot,
            justification: justification.into(),
        }
    }
}

/// The result of one plan generation
///
/// A plan either carries entries and citations or an error message, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub morning: Vec<PlanEntry>,
    pub midday: Vec<PlanEntry>,
    pub evening: Vec<PlanEntry>,
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl GeneratedPlan {
    /// A plan with nothing in it and no error
    pub fn empty() -> Self {
        Self::default()
    }

    /// A plan that signals a pipeline-level failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Partition entries by slot, keeping their relative order within each slot
    pub fn from_entries(entries: Vec<PlanEntry>, citations: Vec<Citation>) -> Self {
        let mut plan = Self {
            citations,
            ..Self::default()
        };
        for entry in entries {
            match entry.slot {
                TimeSlot::Morning => plan.morning.push(entry),
                TimeSlot::Midday => plan.midday.push(entry),
                TimeSlot::Evening => plan.evening.push(entry),
            }
        }
        plan
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }

    /// Entries placed in the given slot
    pub fn slot(&self, slot: TimeSlot) -> &[PlanEntry] {
        match slot {
            TimeSlot::Morning => &self.morning,
            TimeSlot::Midday => &self.midday,
            TimeSlot::Evening => &self.evening,
        }
    }

    /// All entries in day order
    pub fn entries(&self) -> impl Iterator<Item = &PlanEntry> {
        self.morning.iter().chain(self.midday.iter()).chain(self.evening.iter())
    }

    /// Total number of entries across all slots
    pub fn len(&self) -> usize {
        self.morning.len() + self.midday.len() + self.evening.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
