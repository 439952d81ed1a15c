//! Observable processor state: events pushed to subscribers and the
//! snapshot returned to pollers.

use partscout_models::{EnrichedRecord, Progress, RowStatus, RunState};
use serde::Serialize;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Every row was visited
    Completed,
    /// Cancellation flag observed before the next row
    Stopped,
    /// The collection was replaced or cleared while the run was draining
    Superseded,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Superseded => "superseded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub progress: Progress,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.completed + self.failed
    }
}

/// Events emitted in row order while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorEvent {
    RunStarted { total: usize },
    RowStarted { index: usize, part: String },
    RowFinished { index: usize, status: RowStatus },
    Progress(Progress),
    RunFinished(RunSummary),
}

/// Point-in-time view of the processor.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorSnapshot {
    pub records: Vec<EnrichedRecord>,
    pub run_state: RunState,
    pub progress: Progress,
    pub completed: usize,
    pub failed: usize,
    /// Every row reached a terminal status
    pub done: bool,
}

impl ProcessorSnapshot {
    pub fn new(records: Vec<EnrichedRecord>, run_state: RunState, progress: Progress) -> Self {
        let completed = count_status(&records, RowStatus::Completed);
        let failed = count_status(&records, RowStatus::Failed);
        let done = all_terminal(&records);
        Self {
            records,
            run_state,
            progress,
            completed,
            failed,
            done,
        }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }
}

pub(crate) fn count_status(records: &[EnrichedRecord], status: RowStatus) -> usize {
    records.iter().filter(|r| r.status == status).count()
}

/// Non-empty and every row is Completed or Failed.
pub(crate) fn all_terminal(records: &[EnrichedRecord]) -> bool {
    !records.is_empty() && records.iter().all(|r| r.status.is_terminal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use partscout_models::{PartRecord, API_ERROR};

    #[test]
    fn test_snapshot_done_counts_failed_rows() {
        let mut ok = EnrichedRecord::pending(PartRecord::new("A", "a.com"));
        ok.begin();
        ok.complete(partscout_models::EnrichmentResult::not_found());
        let mut bad = EnrichedRecord::pending(PartRecord::new("B", "b.com"));
        bad.begin();
        bad.fail(API_ERROR);

        let snapshot = ProcessorSnapshot::new(vec![ok, bad], RunState::Idle, Progress::new(2, 2));
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.failed, 1);
        assert!(snapshot.done);
        assert_eq!(snapshot.total(), 2);
    }

    #[test]
    fn test_empty_snapshot_is_not_done() {
        let snapshot = ProcessorSnapshot::new(Vec::new(), RunState::Idle, Progress::default());
        assert!(!snapshot.done);
    }
}
