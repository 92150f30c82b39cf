//! The daily progress job.
//!
//! Runs one pass over the active sprints:
//! ```text
//! Discover sprints → for each: Aggregate → Persist + Commit → Close
//! ```

use chrono::Utc;
use sprintpulse_core::{BucketCounts, IdGenerator, ProgressRecord, SprintId, SprintProgress};
use sprintpulse_storage::{ProgressStore, StorageError};
use tracing::{debug, info, warn};

use crate::error::JobError;
use crate::report::{RunReport, SprintOutcome};

/// Computes and records one progress snapshot per active sprint.
pub struct ProgressAggregator<G: IdGenerator> {
    ids: G,
}

impl<G: IdGenerator> ProgressAggregator<G> {
    /// Create an aggregator that names records with `ids`.
    pub fn new(ids: G) -> Self {
        Self { ids }
    }

    /// List the sprints currently active for some team.
    pub async fn discover<S: ProgressStore>(
        &self,
        store: &mut S,
    ) -> Result<Vec<SprintId>, StorageError> {
        store.active_sprints().await
    }

    /// Bucket a sprint's tickets.
    ///
    /// Never fails: a query or reduction error is logged and the sprint
    /// gets zero counts marked as degraded.
    pub async fn aggregate<S: ProgressStore>(
        &self,
        store: &mut S,
        sprint: &SprintId,
    ) -> SprintProgress {
        let rows = match store.status_counts(sprint).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(sprint = %sprint, error = %e, "Ticket query failed, recording zero counts");
                return SprintProgress::degraded(e.to_string());
            }
        };

        match BucketCounts::reduce(&rows) {
            Ok(counts) => {
                debug!(
                    sprint = %sprint,
                    completed = counts.completed,
                    blocked = counts.blocked,
                    remaining = counts.remaining,
                    "Aggregated ticket counts"
                );
                SprintProgress::counted(counts)
            }
            Err(e) => {
                warn!(sprint = %sprint, error = %e, "Ticket counts unusable, recording zero counts");
                SprintProgress::degraded(e.to_string())
            }
        }
    }

    /// Write and commit one record for the sprint.
    pub async fn persist<S: ProgressStore>(
        &self,
        store: &mut S,
        sprint: &SprintId,
        counts: BucketCounts,
    ) -> Result<ProgressRecord, StorageError> {
        let record = ProgressRecord::new(self.ids.generate(), sprint.clone(), counts);
        store.record_progress(&record).await?;
        Ok(record)
    }

    /// Run the whole job against `store`, closing it on every path.
    pub async fn run<S: ProgressStore>(&self, mut store: S) -> Result<RunReport, JobError> {
        let result = self.process(&mut store).await;

        match (result, store.close().await) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(JobError::Close(e)),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!(error = %close_err, "Failed to close connection after run error");
                Err(e)
            }
        }
    }

    async fn process<S: ProgressStore>(&self, store: &mut S) -> Result<RunReport, JobError> {
        let started_at = Utc::now();

        let sprints = self.discover(store).await.map_err(JobError::Discovery)?;
        info!(count = sprints.len(), "Discovered active sprints");

        let mut outcomes = Vec::with_capacity(sprints.len());
        for sprint in &sprints {
            let progress = self.aggregate(store, sprint).await;

            let record = self
                .persist(store, sprint, progress.counts)
                .await
                .map_err(|source| JobError::Persistence {
                    sprint: sprint.clone(),
                    persisted: outcomes.len(),
                    source,
                })?;

            info!(
                sprint = %sprint,
                id = %record.id,
                completed = record.completed,
                blocked = record.blocked,
                remaining = record.remaining,
                degraded = progress.status.is_degraded(),
                "Recorded sprint progress"
            );

            outcomes.push(SprintOutcome {
                record,
                aggregation: progress.status,
            });
        }

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            discovered: sprints.len(),
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprintpulse_core::{AggregationStatus, ProgressRecordId, StatusCount};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// What the mock store saw, kept outside the store since `close` consumes it.
    #[derive(Default)]
    struct Journal {
        calls: Vec<String>,
        committed: Vec<ProgressRecord>,
        closes: usize,
    }

    #[derive(Default)]
    struct MockStore {
        sprints: Vec<SprintId>,
        counts: HashMap<String, Vec<StatusCount>>,
        fail_discovery: bool,
        failing_counts: HashSet<String>,
        failing_inserts: HashSet<String>,
        fail_close: bool,
        journal: Arc<Mutex<Journal>>,
    }

    impl MockStore {
        fn with_sprints(ids: &[&str]) -> Self {
            Self {
                sprints: ids.iter().map(|id| SprintId::from(*id)).collect(),
                ..Default::default()
            }
        }

        fn tickets(mut self, sprint: &str, rows: &[(&str, i64)]) -> Self {
            self.counts.insert(
                sprint.to_string(),
                rows.iter().map(|(s, c)| StatusCount::new(*s, *c)).collect(),
            );
            self
        }

        fn journal(&self) -> Arc<Mutex<Journal>> {
            self.journal.clone()
        }

        fn log(&self, call: String) {
            self.journal.lock().unwrap().calls.push(call);
        }
    }

    #[async_trait::async_trait]
    impl ProgressStore for MockStore {
        async fn active_sprints(&mut self) -> sprintpulse_storage::Result<Vec<SprintId>> {
            self.log("sprints".to_string());
            if self.fail_discovery {
                return Err(StorageError::Other("relation \"Team\" does not exist".into()));
            }
            Ok(self.sprints.clone())
        }

        async fn status_counts(
            &mut self,
            sprint: &SprintId,
        ) -> sprintpulse_storage::Result<Vec<StatusCount>> {
            self.log(format!("counts:{}", sprint));
            if self.failing_counts.contains(sprint.as_str()) {
                return Err(StorageError::Other("DB error".into()));
            }
            Ok(self.counts.get(sprint.as_str()).cloned().unwrap_or_default())
        }

        async fn record_progress(
            &mut self,
            record: &ProgressRecord,
        ) -> sprintpulse_storage::Result<()> {
            self.log(format!("insert:{}", record.sprint_id));
            if self.failing_inserts.contains(record.sprint_id.as_str()) {
                return Err(StorageError::Other("insert rejected".into()));
            }
            self.journal.lock().unwrap().committed.push(record.clone());
            Ok(())
        }

        async fn close(self) -> sprintpulse_storage::Result<()> {
            let mut journal = self.journal.lock().unwrap();
            journal.calls.push("close".to_string());
            journal.closes += 1;
            if self.fail_close {
                return Err(StorageError::Other("connection already broken".into()));
            }
            Ok(())
        }
    }

    /// Deterministic ids: rec-1, rec-2, ...
    #[derive(Default)]
    struct SequenceIds(AtomicUsize);

    impl IdGenerator for SequenceIds {
        fn generate(&self) -> ProgressRecordId {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            ProgressRecordId::new(format!("rec-{}", n))
        }
    }

    fn aggregator() -> ProgressAggregator<SequenceIds> {
        ProgressAggregator::new(SequenceIds::default())
    }

    fn counts(completed: i32, blocked: i32, remaining: i32) -> BucketCounts {
        BucketCounts {
            completed,
            blocked,
            remaining,
        }
    }

    #[tokio::test]
    async fn test_run_records_every_sprint() {
        let store = MockStore::with_sprints(&["sprint1", "sprint2"])
            .tickets(
                "sprint1",
                &[("OPEN", 2), ("IN PROGRESS", 1), ("BLOCKED", 1), ("CLOSED", 3)],
            )
            .tickets(
                "sprint2",
                &[("OPEN", 1), ("IN PROGRESS", 2), ("BLOCKED", 2), ("CLOSED", 4)],
            );
        let journal = store.journal();

        let report = aggregator().run(store).await.unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.persisted(), 2);
        assert_eq!(report.degraded().count(), 0);

        let journal = journal.lock().unwrap();
        assert_eq!(journal.closes, 1);
        assert_eq!(journal.committed.len(), 2);
        assert_eq!(journal.committed[0].sprint_id.as_str(), "sprint1");
        assert_eq!(journal.committed[0].counts(), counts(3, 1, 3));
        assert_eq!(journal.committed[1].sprint_id.as_str(), "sprint2");
        assert_eq!(journal.committed[1].counts(), counts(4, 2, 3));
        assert_ne!(journal.committed[0].id, journal.committed[1].id);
    }

    #[tokio::test]
    async fn test_sprints_processed_in_order() {
        let store = MockStore::with_sprints(&["S1", "S2"]);
        let journal = store.journal();

        aggregator().run(store).await.unwrap();

        assert_eq!(
            journal.lock().unwrap().calls,
            vec!["sprints", "counts:S1", "insert:S1", "counts:S2", "insert:S2", "close"]
        );
    }

    #[tokio::test]
    async fn test_single_ticket_rows_example() {
        let store = MockStore::with_sprints(&["S1"]).tickets(
            "S1",
            &[("OPEN", 1), ("IN PROGRESS", 1), ("BLOCKED", 1), ("CLOSED", 3)],
        );
        let journal = store.journal();

        let report = aggregator().run(store).await.unwrap();

        assert_eq!(report.outcomes[0].record.counts(), counts(3, 1, 2));
        assert_eq!(journal.lock().unwrap().committed[0].id.as_str(), "rec-1");
    }

    #[tokio::test]
    async fn test_empty_sprint_still_recorded() {
        let store = MockStore::with_sprints(&["empty"]);
        let journal = store.journal();

        let report = aggregator().run(store).await.unwrap();

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.record.counts(), BucketCounts::default());
        assert_eq!(outcome.aggregation, AggregationStatus::Counted);
        assert_eq!(journal.lock().unwrap().committed.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_statuses_ignored() {
        let store = MockStore::with_sprints(&["S1"])
            .tickets("S1", &[("CLOSED", 2), ("ARCHIVED", 9), ("OPEN", 1)]);

        let report = aggregator().run(store).await.unwrap();

        let record = &report.outcomes[0].record;
        assert_eq!(record.counts(), counts(2, 0, 1));
        assert_eq!(record.counts().total(), 3);
    }

    #[tokio::test]
    async fn test_query_failure_records_zero_and_continues() {
        let mut store = MockStore::with_sprints(&["S1", "S2", "S3"])
            .tickets("S2", &[("CLOSED", 5)])
            .tickets("S3", &[("BLOCKED", 1)]);
        store.failing_counts.insert("S1".to_string());
        let journal = store.journal();

        let report = aggregator().run(store).await.unwrap();

        assert_eq!(report.persisted(), 3);
        let degraded: Vec<_> = report.degraded().collect();
        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].record.sprint_id.as_str(), "S1");
        assert_eq!(degraded[0].record.counts(), BucketCounts::default());

        let journal = journal.lock().unwrap();
        assert_eq!(journal.committed[1].counts(), counts(5, 0, 0));
        assert_eq!(journal.committed[2].counts(), counts(0, 1, 0));
        assert_eq!(journal.closes, 1);
    }

    #[tokio::test]
    async fn test_reduction_failure_records_zero() {
        let store = MockStore::with_sprints(&["S1"]).tickets("S1", &[("OPEN", 4), ("CLOSED", -2)]);

        let report = aggregator().run(store).await.unwrap();

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.record.counts(), BucketCounts::default());
        assert!(outcome.aggregation.is_degraded());
    }

    #[tokio::test]
    async fn test_persistence_failure_aborts_remaining_sprints() {
        let mut store = MockStore::with_sprints(&["S1", "S2", "S3"]);
        store.failing_inserts.insert("S2".to_string());
        let journal = store.journal();

        let err = aggregator().run(store).await.unwrap_err();

        match err {
            JobError::Persistence {
                sprint, persisted, ..
            } => {
                assert_eq!(sprint.as_str(), "S2");
                assert_eq!(persisted, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        let journal = journal.lock().unwrap();
        assert_eq!(journal.committed.len(), 1);
        assert_eq!(journal.committed[0].sprint_id.as_str(), "S1");
        assert!(!journal.calls.iter().any(|c| c.ends_with("S3")));
        assert_eq!(journal.closes, 1);
    }

    #[tokio::test]
    async fn test_discovery_failure_closes_connection() {
        let store = MockStore {
            fail_discovery: true,
            ..Default::default()
        };
        let journal = store.journal();

        let err = aggregator().run(store).await.unwrap_err();

        assert!(matches!(err, JobError::Discovery(_)));
        let journal = journal.lock().unwrap();
        assert!(journal.committed.is_empty());
        assert_eq!(journal.closes, 1);
    }

    #[tokio::test]
    async fn test_no_active_sprints() {
        let store = MockStore::default();
        let journal = store.journal();

        let report = aggregator().run(store).await.unwrap();

        assert_eq!(report.discovered, 0);
        assert!(report.outcomes.is_empty());
        assert_eq!(journal.lock().unwrap().calls, vec!["sprints", "close"]);
    }

    #[tokio::test]
    async fn test_close_failure_after_success() {
        let store = MockStore {
            fail_close: true,
            ..MockStore::with_sprints(&["S1"])
        };
        let journal = store.journal();

        let err = aggregator().run(store).await.unwrap_err();

        assert!(matches!(err, JobError::Close(_)));
        let journal = journal.lock().unwrap();
        assert_eq!(journal.committed.len(), 1);
        assert_eq!(journal.closes, 1);
    }

    #[tokio::test]
    async fn test_run_error_wins_over_close_failure() {
        let mut store = MockStore {
            fail_close: true,
            ..MockStore::with_sprints(&["S1"])
        };
        store.failing_inserts.insert("S1".to_string());

        let err = aggregator().run(store).await.unwrap_err();

        assert!(matches!(err, JobError::Persistence { .. }));
    }

    #[tokio::test]
    async fn test_each_record_gets_fresh_id() {
        let mut store = MockStore::with_sprints(&["S1", "S2", "S3"]);
        let aggregator = aggregator();

        let first = aggregator
            .persist(&mut store, &SprintId::from("S1"), BucketCounts::default())
            .await
            .unwrap();
        let second = aggregator
            .persist(&mut store, &SprintId::from("S1"), BucketCounts::default())
            .await
            .unwrap();

        assert_eq!(first.id.as_str(), "rec-1");
        assert_eq!(second.id.as_str(), "rec-2");
    }
}
