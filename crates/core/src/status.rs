//! Ticket status labels and the buckets they count toward.

use serde::{Deserialize, Serialize};

/// Status label attached to a ticket row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    /// `OPEN`
    Open,
    /// `IN PROGRESS`
    InProgress,
    /// `BLOCKED`
    Blocked,
    /// `CLOSED`
    Closed,
    /// Any label outside the recognized vocabulary.
    Other(String),
}

impl TicketStatus {
    /// Parse a raw label. Matching is exact and case-sensitive.
    pub fn parse(label: &str) -> Self {
        match label {
            "OPEN" => TicketStatus::Open,
            "IN PROGRESS" => TicketStatus::InProgress,
            "BLOCKED" => TicketStatus::Blocked,
            "CLOSED" => TicketStatus::Closed,
            other => TicketStatus::Other(other.to_string()),
        }
    }

    /// The bucket this status counts toward, if any.
    pub fn bucket(&self) -> Option<StatusBucket> {
        match self {
            TicketStatus::Open | TicketStatus::InProgress => Some(StatusBucket::Remaining),
            TicketStatus::Blocked => Some(StatusBucket::Blocked),
            TicketStatus::Closed => Some(StatusBucket::Completed),
            TicketStatus::Other(_) => None,
        }
    }
}

/// Output category of a daily progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    /// Closed tickets
    Completed,
    /// Blocked tickets
    Blocked,
    /// Open and in-progress tickets
    Remaining,
}
