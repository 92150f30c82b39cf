//! Sprint Pulse core data models.
//!
//! Sprint references, ticket statuses, bucket counts and the daily
//! progress record. Nothing in this crate touches the database.

#![warn(missing_docs)]

mod id;
mod progress;
mod status;

pub use id::{CuidGenerator, IdGenerator, ProgressRecordId, SprintId, RECORD_ID_LEN};
pub use progress::{
    AggregationStatus, BucketCounts, ProgressRecord, ReduceError, SprintProgress, StatusCount,
};
pub use status::{StatusBucket, TicketStatus};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
