//! Store trait abstraction.

use async_trait::async_trait;
use sprintpulse_core::{ProgressRecord, SprintId, StatusCount};

/// Error type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database driver error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// The data store the progress job reads from and writes to.
///
/// One value represents one exclusively owned connection. Calls are made
/// strictly one after another; `close` consumes the store so it can only
/// happen once.
#[async_trait]
pub trait ProgressStore: Send {
    /// Sprints currently marked active by some team.
    async fn active_sprints(&mut self) -> Result<Vec<SprintId>>;

    /// Ticket counts for a sprint, grouped by status label.
    async fn status_counts(&mut self, sprint: &SprintId) -> Result<Vec<StatusCount>>;

    /// Insert one progress record in its own transaction and commit it.
    ///
    /// Nothing is left pending when this returns an error.
    async fn record_progress(&mut self, record: &ProgressRecord) -> Result<()>;

    /// Release the underlying connection.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}
