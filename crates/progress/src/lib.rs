//! Sprint progress snapshots.
//!
//! Counts each active sprint's tickets by status bucket and appends one
//! progress record per sprint per run.

#![warn(missing_docs)]

pub mod aggregator;
pub mod error;
pub mod report;

pub use aggregator::ProgressAggregator;
pub use error::JobError;
pub use report::{RunReport, SprintOutcome};

use sprintpulse_core::CuidGenerator;
use sprintpulse_storage::{DbConfig, PgProgressStore};
use tracing::{error, info, warn};

/// Resolve settings from the environment and run the job once.
pub async fn run_from_env() -> Result<RunReport, JobError> {
    let config = DbConfig::from_env()?;
    run_with_config(&config).await
}

/// Connect with `config` and run the job once.
pub async fn run_with_config(config: &DbConfig) -> Result<RunReport, JobError> {
    info!(url = %config.redacted_url(), "Connecting to database");

    let store = PgProgressStore::connect(&config.connect_options())
        .await
        .map_err(JobError::Connection)?;

    ProgressAggregator::new(CuidGenerator::default())
        .run(store)
        .await
}

/// Log how a run ended.
pub fn log_outcome(result: &Result<RunReport, JobError>) {
    match result {
        Ok(report) => {
            for outcome in report.degraded() {
                warn!(
                    sprint = %outcome.record.sprint_id,
                    id = %outcome.record.id,
                    "Progress recorded with zero-filled counts"
                );
            }
            info!(
                discovered = report.discovered,
                persisted = report.persisted(),
                degraded = report.degraded().count(),
                "Sprint progress run finished"
            );
        }
        Err(e) => error!(error = %e, "Sprint progress run failed"),
    }
}

/// Run the job once, reporting the outcome only through logs.
pub async fn trigger() {
    log_outcome(&run_from_env().await);
}
