//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Slot ranking prompt (single user message)
pub const RANK: &str = include_str!("../../prompts/rank.pmt");

/// Article search system prompt
pub const SEARCH_SYSTEM: &str = include_str!("../../prompts/search-system.pmt");

/// Article search user message
pub const SEARCH_USER: &str = include_str!("../../prompts/search-user.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "rank" => Some(RANK),
        "search-system" => Some(SEARCH_SYSTEM),
        "search-user" => Some(SEARCH_USER),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
