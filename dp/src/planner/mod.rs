//! Day planning: the slot cascade, batch generation and the service around them

mod orchestrator;
mod resolver;
mod service;

pub use orchestrator::{GenerationOptions, PlanGenerator, evidence_preamble};
pub use resolver::{Decision, DecisionSource, Resolution, TimeBlockResolver, explicit_preference, shift_history};
pub use service::{NO_TASKS_MESSAGE, PlannerError, PlannerResult, PlannerService};
