//! Time-of-day slots

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One of the three parts of the day a task can be placed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Midday,
    Evening,
}

impl TimeSlot {
    /// Slot used whenever the ranking model cannot give a usable answer
    pub const FALLBACK: TimeSlot = TimeSlot::Midday;

    /// All slots in day order
    pub const ALL: [TimeSlot; 3] = [TimeSlot::Morning, TimeSlot::Midday, TimeSlot::Evening];

    /// Normalize a free-form model answer into a slot
    ///
    /// Matching is by substring so "Morning." or "late evening" still land in the right
    /// slot. Anything unrecognized becomes [`TimeSlot::FALLBACK`].
    pub fn from_model_answer(answer: &str) -> Self {
        let answer = answer.trim().to_lowercase();
        debug!(%answer, "TimeSlot::from_model_answer: called");

        if answer.contains("morning") || answer.contains("утро") {
            TimeSlot::Morning
        } else if answer.contains("afternoon")
            || answer.contains("midday")
            || answer.contains("обед")
            || answer.contains("день")
        {
            TimeSlot::Midday
        } else if answer.contains("evening") || answer.contains("вечер") {
            TimeSlot::Evening
        } else {
            debug!(%answer, "TimeSlot::from_model_answer: unrecognized, using fallback");
            Self::FALLBACK
        }
    }

    /// Lowercase name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Midday => "midday",
            Self::Evening => "evening",
        }
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TimeSlot {
    type Err = String;

    /// Strict parse: only the three slot names are accepted (any case)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "midday" => Ok(Self::Midday),
            "evening" => Ok(Self::Evening),
            _ => Err(format!("Unknown time slot: {}", s)),
        }
    }
}
