//! Row Processor
//!
//! Sequential enrichment loop over the loaded collection with cooperative
//! cancellation. One loop runs at a time and it has a single row in flight.
//! The cancellation flag is checked only before a row is started, so an
//! in-flight call always finishes and its result is recorded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use partscout_enrichment::EnrichmentClient;
use partscout_models::{EnrichedRecord, PartRecord, Progress, RowStatus, RunState, API_ERROR};
use partscout_utils::{PartScoutError, PartScoutResult};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::{all_terminal, ProcessorEvent, ProcessorSnapshot, RunOutcome, RunSummary};

/// Buffered events per subscriber before the oldest are dropped.
pub const EVENT_CAPACITY: usize = 256;

/// Marker value when no loop is active.
const NO_LOOP: u64 = 0;

#[derive(Debug, Default)]
struct ProcessorState {
    records: Vec<EnrichedRecord>,
    progress: Progress,
    /// Bumped by load/reset; a loop from an older generation discards its work
    generation: u64,
    /// Last loop id handed out
    loop_seq: u64,
}

/// Holds the active-loop marker for the lifetime of one `drive` call.
/// Dropping it releases the marker on every exit path of the loop,
/// including a panicking client and an aborted task.
struct ActiveLoop {
    marker: Arc<AtomicU64>,
    id: u64,
}

impl Drop for ActiveLoop {
    fn drop(&mut self) {
        // A load/reset may already have released it for a newer loop
        let _ = self
            .marker
            .compare_exchange(self.id, NO_LOOP, Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// Row processor handle. Clones share the same collection.
#[derive(Clone)]
pub struct RowProcessor {
    client: Arc<dyn EnrichmentClient>,
    state: Arc<RwLock<ProcessorState>>,
    cancelled: Arc<AtomicBool>,
    /// Id of the loop allowed to run, or `NO_LOOP`
    active_loop: Arc<AtomicU64>,
    events: broadcast::Sender<ProcessorEvent>,
}

impl RowProcessor {
    pub fn new(client: Arc<dyn EnrichmentClient>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            state: Arc::new(RwLock::new(ProcessorState::default())),
            cancelled: Arc::new(AtomicBool::new(false)),
            active_loop: Arc::new(AtomicU64::new(NO_LOOP)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProcessorEvent> {
        self.events.subscribe()
    }

    /// Replace the collection with fresh pending rows. Any running loop is
    /// superseded and its in-flight result discarded.
    pub async fn load(&self, records: Vec<PartRecord>) -> PartScoutResult<usize> {
        if records.is_empty() {
            return Err(PartScoutError::no_valid_rows());
        }
        let mut state = self.state.write().await;
        Ok(self.replace(&mut state, records))
    }

    /// Like [`load`](Self::load) but refuses with a Conflict while a run is
    /// in progress. The check and the replacement share one write lock.
    pub async fn load_if_idle(&self, records: Vec<PartRecord>) -> PartScoutResult<usize> {
        if records.is_empty() {
            return Err(PartScoutError::no_valid_rows());
        }
        let mut state = self.state.write().await;
        if self.run_state() == RunState::Running {
            return Err(PartScoutError::conflict("Stop the current run before uploading a new list"));
        }
        Ok(self.replace(&mut state, records))
    }

    /// Spawn a run on the tokio runtime. `None` when there is nothing to run
    /// or a loop is already active.
    pub async fn start(&self) -> Option<JoinHandle<RunSummary>> {
        let guard = self.claim_run().await?;
        let processor = self.clone();
        Some(tokio::spawn(async move { processor.drive(guard).await }))
    }

    /// Like [`start`](Self::start) but drives the loop on the current task.
    pub async fn run(&self) -> Option<RunSummary> {
        let guard = self.claim_run().await?;
        Some(self.drive(guard).await)
    }

    /// Stop starting new rows. Returns whether a run was active.
    pub async fn stop(&self) -> bool {
        let state = self.state.read().await;
        let was_running = self.run_state() == RunState::Running;
        self.cancelled.store(true, Ordering::SeqCst);
        if was_running {
            info!(progress = ?state.progress, "Stop requested");
        }
        was_running
    }

    /// Clear the collection and all progress. Safe at any time.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        self.clear(&mut state);
    }

    /// Like [`reset`](Self::reset) but refuses with a Conflict while a run is
    /// in progress.
    pub async fn reset_if_idle(&self) -> PartScoutResult<()> {
        let mut state = self.state.write().await;
        if self.run_state() == RunState::Running {
            return Err(PartScoutError::conflict("Stop the current run before clearing the list"));
        }
        self.clear(&mut state);
        Ok(())
    }

    pub async fn snapshot(&self) -> ProcessorSnapshot {
        let state = self.state.read().await;
        ProcessorSnapshot::new(state.records.clone(), self.run_state(), state.progress)
    }

    pub async fn records(&self) -> Vec<EnrichedRecord> {
        self.state.read().await.records.clone()
    }

    /// Running while a loop holds the marker and no stop was requested.
    pub fn run_state(&self) -> RunState {
        if self.is_busy() && !self.cancelled.load(Ordering::SeqCst) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// A loop exists, including one still finishing its last row after a stop.
    pub fn is_busy(&self) -> bool {
        self.active_loop.load(Ordering::SeqCst) != NO_LOOP
    }

    /// Every row reached Completed or Failed.
    pub async fn is_done(&self) -> bool {
        all_terminal(&self.state.read().await.records)
    }

    fn replace(&self, state: &mut ProcessorState, records: Vec<PartRecord>) -> usize {
        state.records = records.into_iter().map(EnrichedRecord::pending).collect();
        self.supersede(state);

        let rows = state.records.len();
        info!(rows, "Loaded part list");
        rows
    }

    fn clear(&self, state: &mut ProcessorState) {
        state.records.clear();
        self.supersede(state);
        info!("Cleared part list");
    }

    /// New generation with no active loop. A loop still draining sees the
    /// generation change and exits without touching the new collection.
    fn supersede(&self, state: &mut ProcessorState) {
        state.progress = Progress::default();
        state.generation += 1;
        self.active_loop.store(NO_LOOP, Ordering::SeqCst);
        self.cancelled.store(false, Ordering::SeqCst);
    }

    async fn claim_run(&self) -> Option<LoopClaim> {
        let mut state = self.state.write().await;
        if state.records.is_empty() {
            debug!("Start ignored: no rows loaded");
            return None;
        }

        state.loop_seq += 1;
        let id = state.loop_seq;
        if self
            .active_loop
            .compare_exchange(NO_LOOP, id, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Start ignored: a run is already active");
            return None;
        }
        let guard = ActiveLoop {
            marker: self.active_loop.clone(),
            id,
        };

        // Rows left in Processing by an interrupted loop are attempted again
        for record in state.records.iter_mut().filter(|r| r.status == RowStatus::Processing) {
            record.requeue();
        }

        let total = state.records.len();
        state.progress = Progress::new(0, total);
        self.cancelled.store(false, Ordering::SeqCst);

        info!(total, "Starting run");
        self.emit(ProcessorEvent::RunStarted { total });
        Some(LoopClaim {
            generation: state.generation,
            _guard: guard,
        })
    }

    async fn drive(&self, claim: LoopClaim) -> RunSummary {
        let generation = claim.generation;
        let mut completed = 0;
        let mut failed = 0;
        let mut skipped = 0;
        let mut index = 0;

        let outcome = loop {
            if self.cancelled.load(Ordering::SeqCst) {
                break RunOutcome::Stopped;
            }

            let (part, website) = {
                let mut state = self.state.write().await;
                if state.generation != generation {
                    break RunOutcome::Superseded;
                }
                let total = state.records.len();
                let Some(record) = state.records.get_mut(index) else {
                    break RunOutcome::Completed;
                };

                if record.status == RowStatus::Completed {
                    skipped += 1;
                    index += 1;
                    state.progress = Progress::new(index, total);
                    self.emit(ProcessorEvent::Progress(state.progress));
                    continue;
                }

                record.begin();
                let part = record.part.clone();
                let website = record.website.clone();
                self.emit(ProcessorEvent::RowStarted {
                    index,
                    part: part.clone(),
                });
                (part, website)
            };

            debug!(index, %part, %website, "Enriching row");
            let result = self.client.enrich(&part, &website).await;

            let mut state = self.state.write().await;
            if state.generation != generation {
                break RunOutcome::Superseded;
            }
            let total = state.records.len();
            let record = &mut state.records[index];
            match result {
                Ok(enriched) => {
                    record.complete(enriched.normalized());
                    completed += 1;
                }
                Err(error) => {
                    warn!(index, %part, %website, error = %error, "Row enrichment failed");
                    record.fail(API_ERROR);
                    failed += 1;
                }
            }
            let status = record.status;
            index += 1;
            state.progress = Progress::new(index, total);
            self.emit(ProcessorEvent::RowFinished {
                index: index - 1,
                status,
            });
            self.emit(ProcessorEvent::Progress(state.progress));
        };

        let progress = self.state.read().await.progress;
        drop(claim);

        let summary = RunSummary {
            outcome,
            completed,
            failed,
            skipped,
            progress,
        };
        info!(
            outcome = ?summary.outcome,
            completed,
            failed,
            skipped,
            "Run finished"
        );
        self.emit(ProcessorEvent::RunFinished(summary.clone()));
        summary
    }

    fn emit(&self, event: ProcessorEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Permission for one loop to run against one generation.
struct LoopClaim {
    generation: u64,
    _guard: ActiveLoop,
}
