//! Slot resolution cascade
//!
//! Three checks in fixed priority order: the task's explicit preference, then the user's
//! last manual shift of that task, then the external ranker. The first two are local and
//! may defer; the ranker always answers.

use tracing::debug;

use crate::domain::{Citation, Task, TimeSlot, UserProfile};
use crate::research::SlotRanker;

/// Which check produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    Preference,
    History,
    Ranking,
}

/// A resolved slot with its reasoning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub slot: TimeSlot,
    pub justification: String,
    /// Evidence from the ranker; always empty for local decisions
    pub citations: Vec<Citation>,
    pub source: DecisionSource,
}

impl Decision {
    fn local(slot: TimeSlot, source: DecisionSource, justification: String) -> Self {
        Self {
            slot,
            justification,
            citations: Vec::new(),
            source,
        }
    }
}

/// Outcome of one local check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Decision),
    Defer,
}

type LocalCheck = fn(&Task, &UserProfile) -> Resolution;

/// Local checks in priority order
const LOCAL_CHECKS: &[LocalCheck] = &[explicit_preference, shift_history];

/// Use the slot the task asks for
pub fn explicit_preference(task: &Task, _profile: &UserProfile) -> Resolution {
    match task.preferred_slot {
        Some(slot) => Resolution::Resolved(Decision::local(
            slot,
            DecisionSource::Preference,
            format!("Placed in the {} because of your preference.", slot),
        )),
        None => Resolution::Defer,
    }
}

/// Use the slot the user last moved this task to
///
/// An unreadable history value defers instead of failing.
pub fn shift_history(task: &Task, profile: &UserProfile) -> Resolution {
    let Some(last) = profile.last_shift(&task.id) else {
        return Resolution::Defer;
    };
    match last.parse::<TimeSlot>() {
        Ok(slot) => Resolution::Resolved(Decision::local(
            slot,
            DecisionSource::History,
            format!("Placed in the {} based on your previous choice.", slot),
        )),
        Err(e) => {
            debug!(task_id = %task.id, %last, error = %e, "shift_history: unreadable history value, deferring");
            Resolution::Defer
        }
    }
}

/// Runs the cascade for one task at a time
pub struct TimeBlockResolver<'a> {
    ranker: &'a dyn SlotRanker,
}

impl<'a> TimeBlockResolver<'a> {
    pub fn new(ranker: &'a dyn SlotRanker) -> Self {
        Self { ranker }
    }

    /// Resolve a task's slot; the ranker is only called when every local check defers
    pub async fn resolve(&self, task: &Task, profile: &UserProfile) -> Decision {
        debug!(task_id = %task.id, "TimeBlockResolver::resolve: called");
        for check in LOCAL_CHECKS {
            if let Resolution::Resolved(decision) = check(task, profile) {
                debug!(task_id = %task.id, slot = %decision.slot, source = ?decision.source, "resolve: local decision");
                return decision;
            }
        }

        let ranked = self.ranker.rank(&task.title).await;
        Decision {
            slot: ranked.slot,
            justification: ranked.justification,
            citations: ranked.citations,
            source: DecisionSource::Ranking,
        }
    }
}
