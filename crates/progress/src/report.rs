//! Summary of one progress run.

use serde::Serialize;
use sprintpulse_core::{AggregationStatus, ProgressRecord, Time};

/// What happened to one sprint.
#[derive(Debug, Clone, Serialize)]
pub struct SprintOutcome {
    /// The committed record
    pub record: ProgressRecord,

    /// Whether the record's counts are real or zero-filled
    pub aggregation: AggregationStatus,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// When discovery started
    pub started_at: Time,

    /// When the last record was committed
    pub finished_at: Time,

    /// Number of active sprints found
    pub discovered: usize,

    /// One entry per committed record, in processing order
    pub outcomes: Vec<SprintOutcome>,
}

impl RunReport {
    /// Records written by the run.
    pub fn persisted(&self) -> usize {
        self.outcomes.len()
    }

    /// Outcomes whose counts were zero-filled after a failure.
    pub fn degraded(&self) -> impl Iterator<Item = &SprintOutcome> {
        self.outcomes.iter().filter(|o| o.aggregation.is_degraded())
    }
}
