//! Errors that end a progress run.

use sprintpulse_core::SprintId;
use sprintpulse_storage::{ConfigError, StorageError};

/// A failure fatal to the whole run.
///
/// Per-sprint aggregation failures are not errors; they surface as
/// degraded outcomes in the run report.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Connection settings could not be resolved
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The database could not be reached or refused the login
    #[error("could not connect to the database: {0}")]
    Connection(#[source] sqlx::Error),

    /// Active sprints could not be listed
    #[error("failed to load active sprints: {0}")]
    Discovery(#[source] StorageError),

    /// Inserting or committing a record failed; later sprints were skipped
    #[error("failed to persist progress for sprint {sprint} ({persisted} record(s) already committed): {source}")]
    Persistence {
        /// Sprint whose record was not written
        sprint: SprintId,
        /// Records committed earlier in the run
        persisted: usize,
        /// Underlying store error
        #[source]
        source: StorageError,
    },

    /// The connection could not be released cleanly
    #[error("failed to close the database connection: {0}")]
    Close(#[source] StorageError),
}
