//! Day planner - place tasks into morning, midday and evening slots
//!
//! Each task is resolved through a fixed cascade: an explicit preference wins, then the
//! user's last manual shift of that task, then an external ranking model. The model is
//! also asked for supporting articles, which become the plan's citations.
//!
//! The model is optional. Without an API key the planner runs in degraded mode: ranking
//! answers midday and search finds nothing, but plans are still produced.
//!
//! # Modules
//!
//! - [`domain`] - Tasks, slots, citations, plans and the user profile
//! - [`extract`] - Recovery of JSON records and links from free-text replies
//! - [`llm`] - Chat-completions client
//! - [`research`] - Slot ranking and article search on top of the client
//! - [`planner`] - Resolution cascade, batch generation and the planner service
//! - [`store`] - Task, profile, citation and plan persistence
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod extract;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod research;
pub mod store;

// Re-export commonly used types
pub use config::{Config, LlmConfig, PlannerConfig, StorageConfig};
pub use domain::{Citation, GeneratedPlan, PlanEntry, Task, TaskDraft, TimeSlot, UserProfile};
pub use llm::{ChatCompletionsClient, LlmClient, LlmError, create_client};
pub use planner::{GenerationOptions, PlanGenerator, PlannerError, PlannerService, TimeBlockResolver};
pub use research::{CitationSearch, LlmCitationSearch, LlmSlotRanker, RankingResult, SlotRanker};
pub use store::{FileStore, MemoryStore, Store, StoreError};
