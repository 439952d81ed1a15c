//! PartScout Row Processor
//!
//! Owns the loaded part list and drives it through the enrichment client one
//! row at a time, with stop/resume and progress events.

pub mod events;
pub mod processor;

pub use events::{ProcessorEvent, ProcessorSnapshot, RunOutcome, RunSummary};
pub use processor::RowProcessor;
