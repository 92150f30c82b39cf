//! PostgreSQL store backend.
//!
//! Reads the team/ticket tables owned by the tracker application and
//! appends rows to its `SprintDailyProgress` table. The schema is not
//! created or migrated here.

use async_trait::async_trait;
use sprintpulse_core::{ProgressRecord, SprintId, StatusCount};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Row};
use tracing::debug;

use super::trait_::{ProgressStore, Result};

/// Active sprint of every team that has one.
pub const ACTIVE_SPRINTS_SQL: &str =
    r#"SELECT "currentSprintId" FROM "Team" WHERE "currentSprintId" IS NOT NULL"#;

/// Ticket counts per status for one sprint. The status column may be a
/// database enum, so it is read back as text.
pub const STATUS_COUNTS_SQL: &str = r#"SELECT "status"::text AS "status", count(*) AS "count" FROM "Ticket" WHERE "sprintId" = $1 GROUP BY "status""#;

/// One daily progress row.
pub const INSERT_PROGRESS_SQL: &str = r#"INSERT INTO "SprintDailyProgress"("id", "sprintId", "completed", "blocked", "remaining") VALUES($1, $2, $3, $4, $5)"#;

/// Store backed by a single PostgreSQL connection.
pub struct PgProgressStore {
    conn: PgConnection,
}

impl PgProgressStore {
    /// Open a connection.
    pub async fn connect(options: &PgConnectOptions) -> std::result::Result<Self, sqlx::Error> {
        let conn = PgConnection::connect_with(options).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ProgressStore for PgProgressStore {
    async fn active_sprints(&mut self) -> Result<Vec<SprintId>> {
        let ids: Vec<String> = sqlx::query_scalar(ACTIVE_SPRINTS_SQL)
            .fetch_all(&mut self.conn)
            .await?;

        debug!(count = ids.len(), "Loaded active sprints");
        Ok(ids.into_iter().map(SprintId::from).collect())
    }

    async fn status_counts(&mut self, sprint: &SprintId) -> Result<Vec<StatusCount>> {
        let rows = sqlx::query(STATUS_COUNTS_SQL)
            .bind(sprint.as_str())
            .fetch_all(&mut self.conn)
            .await?;

        let counts = rows
            .iter()
            .map(|row| -> std::result::Result<StatusCount, sqlx::Error> {
                Ok(StatusCount {
                    status: row.try_get("status")?,
                    count: row.try_get("count")?,
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        debug!(sprint = %sprint, groups = counts.len(), "Loaded ticket status counts");
        Ok(counts)
    }

    async fn record_progress(&mut self, record: &ProgressRecord) -> Result<()> {
        // Dropping the guard on an early return rolls the insert back.
        let mut tx = self.conn.begin().await?;

        sqlx::query(INSERT_PROGRESS_SQL)
            .bind(record.id.as_str())
            .bind(record.sprint_id.as_str())
            .bind(record.completed)
            .bind(record.blocked)
            .bind(record.remaining)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(sprint = %record.sprint_id, id = %record.id, "Committed progress record");
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}
