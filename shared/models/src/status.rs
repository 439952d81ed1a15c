//! Row and run state definitions.
//!
//! Row status normally moves forward: `Pending -> Processing -> Completed | Failed`.
//! A failed row may be picked up again by a later run, and a row left in
//! Processing by an interrupted loop goes back to Pending.

use serde::{Deserialize, Serialize};

/// Per-row processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    /// Imported, not yet attempted
    Pending,
    /// Enrichment call in flight
    Processing,
    /// Enrichment succeeded
    Completed,
    /// Enrichment failed for this row
    Failed,
}

impl RowStatus {
    /// Check if transition is valid
    pub fn can_transition_to(&self, target: RowStatus) -> bool {
        use RowStatus::*;

        match (self, target) {
            (Pending, Processing) => true,

            (Processing, Completed) => true,
            (Processing, Failed) => true,

            // Re-attempted by a later run
            (Failed, Processing) => true,

            // Loop interrupted mid-call
            (Processing, Pending) => true,

            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RowStatus::Completed | RowStatus::Failed)
    }

}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Global run state of the row processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
        }
    }
}

/// Aggregate progress of a run: `current` rows handled out of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }

    /// Percentage rounded to the nearest integer, 0 for an empty run.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.current.min(self.total) as f64 / self.total as f64) * 100.0;
        pct.round() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.current >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_row_transitions() {
        assert!(RowStatus::Pending.can_transition_to(RowStatus::Processing));
        assert!(RowStatus::Processing.can_transition_to(RowStatus::Completed));
        assert!(RowStatus::Processing.can_transition_to(RowStatus::Failed));
        assert!(RowStatus::Failed.can_transition_to(RowStatus::Processing));

        assert!(!RowStatus::Completed.can_transition_to(RowStatus::Processing));
        assert!(!RowStatus::Failed.can_transition_to(RowStatus::Pending));
        assert!(RowStatus::Processing.can_transition_to(RowStatus::Pending));
        assert!(!RowStatus::Pending.can_transition_to(RowStatus::Completed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(RowStatus::Completed.is_terminal());
        assert!(RowStatus::Failed.is_terminal());
        assert!(!RowStatus::Pending.is_terminal());
        assert!(!RowStatus::Processing.is_terminal());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&RowStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        assert_eq!(RowStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress::default().percent(), 0);
        assert_eq!(Progress::new(1, 3).percent(), 33);
        assert_eq!(Progress::new(2, 3).percent(), 67);
        assert_eq!(Progress::new(3, 3).percent(), 100);
        assert!(Progress::new(3, 3).is_complete());
        assert!(!Progress::new(0, 0).is_complete());
    }

    proptest! {
        #[test]
        fn prop_percent_is_bounded(current in 0usize..10_000, total in 0usize..10_000) {
            let pct = Progress::new(current, total).percent();
            prop_assert!(pct <= 100);
        }
    }
}
