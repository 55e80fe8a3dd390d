//! User profile: shift history, chronotype and distrusted sources

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Citation, TimeSlot};

/// How far one side must lead before the chronotype flips
pub const CHRONOTYPE_MARGIN: usize = 2;

/// Coarse morning/evening preference derived from manual shifts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chronotype {
    /// Prefers mornings
    Lark,
    /// Prefers evenings
    Owl,
}

impl std::fmt::Display for Chronotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lark => write!(f, "lark"),
            Self::Owl => write!(f, "owl"),
        }
    }
}

/// One manual move of a task between slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub task_id: String,
    pub from: Option<TimeSlot>,
    pub to: TimeSlot,
    pub at: DateTime<Utc>,
}

impl ShiftRecord {
    /// A shift happening now
    pub fn new(task_id: impl Into<String>, from: Option<TimeSlot>, to: TimeSlot) -> Self {
        Self {
            task_id: task_id.into(),
            from,
            to,
            at: Utc::now(),
        }
    }
}

/// Per-user planning signals
///
/// History values are stored as raw strings: older or hand-edited profiles may hold
/// values that no longer parse, and those must be skipped rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub chronotype: Option<Chronotype>,
    /// Task id -> slots the user moved it to, oldest first. Append-only.
    pub shift_history: BTreeMap<String, Vec<String>>,
    /// Citation ids and URLs the user marked as untrustworthy
    pub distrusted: BTreeSet<String>,
    /// Audit log of manual shifts
    pub shift_log: Vec<ShiftRecord>,
}

impl UserProfile {
    /// Most recent history value for a task, parsed or not
    pub fn last_shift(&self, task_id: &str) -> Option<&str> {
        self.shift_history
            .get(task_id)
            .and_then(|h| h.last())
            .map(String::as_str)
    }

    /// Append a manual shift to the history and the audit log
    pub fn apply_shift(&mut self, record: &ShiftRecord) {
        debug!(task_id = %record.task_id, from = ?record.from, to = %record.to, "UserProfile::apply_shift: called");
        self.shift_history
            .entry(record.task_id.clone())
            .or_default()
            .push(record.to.as_str().to_string());
        self.shift_log.push(record.clone());
    }

    /// Count history entries across all tasks that parse to the given slot
    pub fn count_shifts_to(&self, slot: TimeSlot) -> usize {
        self.shift_history
            .values()
            .flatten()
            .filter(|v| v.parse::<TimeSlot>().ok() == Some(slot))
            .count()
    }

    /// Re-derive the chronotype from the history
    ///
    /// A clear lead (more than [`CHRONOTYPE_MARGIN`]) of morning over evening shifts makes
    /// the user a lark, the reverse an owl. Otherwise the previous value is kept.
    pub fn recompute_chronotype(&mut self) -> Option<Chronotype> {
        let morning = self.count_shifts_to(TimeSlot::Morning);
        let evening = self.count_shifts_to(TimeSlot::Evening);
        debug!(morning, evening, "UserProfile::recompute_chronotype: counts");

        if morning > evening + CHRONOTYPE_MARGIN {
            self.chronotype = Some(Chronotype::Lark);
        } else if evening > morning + CHRONOTYPE_MARGIN {
            self.chronotype = Some(Chronotype::Owl);
        }

        info!(chronotype = ?self.chronotype, "Chronotype recomputed");
        self.chronotype
    }

    /// Mark a citation id or URL as untrustworthy, returning false if it already was
    pub fn distrust(&mut self, key: &str) -> bool {
        self.distrusted.insert(key.to_string())
    }

    /// Whether the citation's id or URL has been distrusted
    pub fn distrusts(&self, citation: &Citation) -> bool {
        self.distrusted.contains(&citation.id) || self.distrusted.contains(&citation.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_shift_appends() {
        let mut profile = UserProfile::default();
        profile.apply_shift(&ShiftRecord::new("t1", None, TimeSlot::Morning));
        profile.apply_shift(&ShiftRecord::new("t1", Some(TimeSlot::Morning), TimeSlot::Evening));

        assert_eq!(profile.shift_history["t1"], vec!["morning", "evening"]);
        assert_eq!(profile.last_shift("t1"), Some("evening"));
        assert_eq!(profile.shift_log.len(), 2);
        assert_eq!(profile.shift_log[1].from, Some(TimeSlot::Morning));
        assert_eq!(profile.last_shift("missing"), None);
    }

    #[test]
    fn test_chronotype_needs_clear_margin() {
        let mut profile = UserProfile::default();
        for _ in 0..3 {
            profile.apply_shift(&ShiftRecord::new("t", None, TimeSlot::Morning));
        }
        profile.apply_shift(&ShiftRecord::new("u", None, TimeSlot::Evening));
        // 3 vs 1 is not more than 2 apart
        assert_eq!(profile.recompute_chronotype(), None);

        profile.apply_shift(&ShiftRecord::new("t", None, TimeSlot::Morning));
        assert_eq!(profile.recompute_chronotype(), Some(Chronotype::Lark));
    }

    #[test]
    fn test_chronotype_owl_and_sticky() {
        let mut profile = UserProfile::default();
        for _ in 0..3 {
            profile.apply_shift(&ShiftRecord::new("t", None, TimeSlot::Evening));
        }
        assert_eq!(profile.recompute_chronotype(), Some(Chronotype::Owl));

        // Balancing the counts does not clear a previously derived chronotype
        for _ in 0..3 {
            profile.apply_shift(&ShiftRecord::new("t", None, TimeSlot::Morning));
        }
        assert_eq!(profile.recompute_chronotype(), Some(Chronotype::Owl));
    }

    #[test]
    fn test_unparseable_history_is_not_counted() {
        let mut profile = UserProfile::default();
        profile
            .shift_history
            .insert("t".to_string(), vec!["утро".to_string(), "MORNING".to_string()]);
        assert_eq!(profile.count_shifts_to(TimeSlot::Morning), 1);
    }

    #[test]
    fn test_distrust_is_idempotent() {
        let mut profile = UserProfile::default();
        assert!(profile.distrust("c1"));
        assert!(!profile.distrust("c1"));
        assert_eq!(profile.distrusted.len(), 1);
    }

    #[test]
    fn test_distrusts_by_id_or_url() {
        let mut profile = UserProfile::default();
        profile.distrust("c1");
        profile.distrust("https://bad.example");

        assert!(profile.distrusts(&Citation::with_id("c1", "A", "https://a.example")));
        assert!(profile.distrusts(&Citation::with_id("c2", "B", "https://bad.example")));
        assert!(!profile.distrusts(&Citation::with_id("c3", "C", "https://c.example")));
    }
}
