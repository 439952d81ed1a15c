//! Prometheus counters fed from processor events.

use partscout_models::RowStatus;
use partscout_processor::ProcessorEvent;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    rows_total: IntCounterVec,
    runs_total: IntCounterVec,
    uploads_total: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let rows_total = IntCounterVec::new(
            Opts::new("partscout_rows_total", "Rows that reached a terminal status"),
            &["status"],
        )?;
        let runs_total = IntCounterVec::new(
            Opts::new("partscout_runs_total", "Finished processing runs by outcome"),
            &["outcome"],
        )?;
        let uploads_total = IntCounter::new("partscout_uploads_total", "Part lists loaded")?;

        registry.register(Box::new(rows_total.clone()))?;
        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(uploads_total.clone()))?;

        Ok(Self {
            registry,
            rows_total,
            runs_total,
            uploads_total,
        })
    }

    pub fn record(&self, event: &ProcessorEvent) {
        match event {
            ProcessorEvent::RowFinished { status, .. } => match status {
                RowStatus::Completed | RowStatus::Failed => {
                    let label = status.to_string();
                    self.rows_total.with_label_values(&[label.as_str()]).inc();
                }
                _ => {}
            },
            ProcessorEvent::RunFinished(summary) => {
                self.runs_total
                    .with_label_values(&[summary.outcome.as_str()])
                    .inc();
            }
            _ => {}
        }
    }

    pub fn record_upload(&self) {
        self.uploads_total.inc();
    }

    pub fn rows_total(&self, status: RowStatus) -> u64 {
        let label = status.to_string();
        self.rows_total.with_label_values(&[label.as_str()]).get()
    }

    /// Text exposition format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        match TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
            Err(_) => "Error encoding metrics".to_string(),
        }
    }
}

/// Count processor events until the channel closes.
pub fn spawn_event_recorder(
    metrics: Metrics,
    mut events: broadcast::Receiver<ProcessorEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => metrics.record(&event),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Metrics recorder lagged behind processor events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
