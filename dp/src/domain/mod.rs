//! Domain types for the day planner
//!
//! Tasks, the three time slots, citations, generated plans and the user profile.

mod citation;
mod id;
mod plan;
mod profile;
mod slot;
mod task;

pub use citation::{Citation, CitationPool, dedup_by_url};
pub use id::{generate_id, slugify};
pub use plan::{GeneratedPlan, PlanEntry};
pub use profile::{CHRONOTYPE_MARGIN, Chronotype, ShiftRecord, UserProfile};
pub use slot::TimeSlot;
pub use task::{Task, TaskDraft, TaskError};
