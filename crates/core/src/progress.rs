//! Sprint progress: bucket counts and the persisted daily record.

use serde::{Deserialize, Serialize};

use crate::id::{ProgressRecordId, SprintId};
use crate::status::{StatusBucket, TicketStatus};

/// One grouped row: a status label and how many tickets carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    /// Raw status label
    pub status: String,

    /// Number of tickets with that label
    pub count: i64,
}

impl StatusCount {
    /// Create a grouped row.
    pub fn new(status: impl Into<String>, count: i64) -> Self {
        Self {
            status: status.into(),
            count,
        }
    }
}

/// Errors raised while reducing grouped rows to buckets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReduceError {
    /// A group reported a negative ticket count
    #[error("negative count {count} for status {status:?}")]
    NegativeCount {
        /// Label of the offending group
        status: String,
        /// The reported count
        count: i64,
    },

    /// A bucket total no longer fits the output column
    #[error("{bucket:?} total exceeds the integer column range")]
    Overflow {
        /// Bucket whose total overflowed
        bucket: StatusBucket,
    },
}

/// Ticket counts per bucket for one sprint.
///
/// Values are never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    /// Tickets in `CLOSED`
    pub completed: i32,

    /// Tickets in `BLOCKED`
    pub blocked: i32,

    /// Tickets in `OPEN` or `IN PROGRESS`
    pub remaining: i32,
}

impl BucketCounts {
    /// Fold grouped status rows into the three buckets.
    ///
    /// Unrecognized labels contribute nothing.
    pub fn reduce(rows: &[StatusCount]) -> Result<Self, ReduceError> {
        let mut counts = Self::default();

        for row in rows {
            if row.count < 0 {
                return Err(ReduceError::NegativeCount {
                    status: row.status.clone(),
                    count: row.count,
                });
            }

            let Some(bucket) = TicketStatus::parse(&row.status).bucket() else {
                continue;
            };

            let slot = counts.slot_mut(bucket);
            let current = *slot;
            *slot = i32::try_from(row.count)
                .ok()
                .and_then(|n| current.checked_add(n))
                .ok_or(ReduceError::Overflow { bucket })?;
        }

        Ok(counts)
    }

    /// Tickets across all buckets.
    pub fn total(&self) -> i64 {
        i64::from(self.completed) + i64::from(self.blocked) + i64::from(self.remaining)
    }

    fn slot_mut(&mut self, bucket: StatusBucket) -> &mut i32 {
        match bucket {
            StatusBucket::Completed => &mut self.completed,
            StatusBucket::Blocked => &mut self.blocked,
            StatusBucket::Remaining => &mut self.remaining,
        }
    }
}

/// How a sprint's counts were obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AggregationStatus {
    /// Counts reflect the ticket rows read from the store.
    Counted,

    /// Aggregation failed; counts were substituted with zeros.
    Degraded {
        /// Why aggregation failed
        reason: String,
    },
}

impl AggregationStatus {
    /// Whether counts were zeroed after a failure.
    pub fn is_degraded(&self) -> bool {
        matches!(self, AggregationStatus::Degraded { .. })
    }
}

/// Result of aggregating one sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintProgress {
    /// Bucketed counts (all zero when degraded)
    pub counts: BucketCounts,

    /// Whether the counts are real
    pub status: AggregationStatus,
}

impl SprintProgress {
    /// Counts read successfully.
    pub fn counted(counts: BucketCounts) -> Self {
        Self {
            counts,
            status: AggregationStatus::Counted,
        }
    }

    /// Zeroed counts standing in for a failed aggregation.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            counts: BucketCounts::default(),
            status: AggregationStatus::Degraded {
                reason: reason.into(),
            },
        }
    }
}

/// Daily progress snapshot for one sprint. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Generated identifier
    pub id: ProgressRecordId,

    /// Sprint the snapshot belongs to
    pub sprint_id: SprintId,

    /// Closed tickets
    pub completed: i32,

    /// Blocked tickets
    pub blocked: i32,

    /// Open and in-progress tickets
    pub remaining: i32,
}

impl ProgressRecord {
    /// Build a record from bucketed counts.
    pub fn new(id: ProgressRecordId, sprint_id: SprintId, counts: BucketCounts) -> Self {
        Self {
            id,
            sprint_id,
            completed: counts.completed,
            blocked: counts.blocked,
            remaining: counts.remaining,
        }
    }

    /// The record's counts.
    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            completed: self.completed,
            blocked: self.blocked,
            remaining: self.remaining,
        }
    }
}
