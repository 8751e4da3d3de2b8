//! Snapshot run orchestration
//!
//! One controller run moves through `Idle -> Discovering -> Collecting ->
//! Done`, or ends in `Failed` if discovery or the sink gives out. Workers
//! are joined on every path, including failure, so no background collection
//! outlives the run. Pages written before a failure stay on disk; there is
//! no rollback.

use super::discover::{DiscoveryPolicy, PrefixDiscoverer};
use super::fetch::RecordFilter;
use super::queue::{ResultChannel, TaskQueue, WorkUnit};
use super::sink::ResultSink;
use super::worker::WorkerPool;
use crate::error::{Result, SnapError};
use crate::output::JsonlWriter;
use crate::postprocess::Postprocessor;
use crate::remote::{GroupingApi, ListApi};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Phase of a snapshot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapPhase {
    Idle,
    Discovering,
    Collecting,
    Done,
    Failed,
}

impl fmt::Display for SnapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SnapPhase::Idle => "idle",
            SnapPhase::Discovering => "discovering",
            SnapPhase::Collecting => "collecting",
            SnapPhase::Done => "done",
            SnapPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How the work-unit list for a run is obtained.
pub enum WorkPlan<'a> {
    /// Caller supplies the units directly
    Explicit(Vec<WorkUnit>),

    /// Partition a hierarchical key space before collecting
    Discover {
        api: &'a dyn GroupingApi,
        root: String,
        delimiter: String,
        policy: DiscoveryPolicy,
    },
}

/// Result of a completed snapshot run
#[derive(Debug, Clone, Copy)]
pub struct SnapshotSummary {
    /// Work units collected or attempted
    pub units: usize,

    /// Workers used
    pub workers: usize,

    /// Records written to the target file
    pub records_written: u64,

    /// Batches handed to the writer (one per forwarded page)
    pub batches: u64,

    /// Records dropped by postprocessing
    pub records_skipped: u64,

    /// Records dropped by the post-filter predicate
    pub records_filtered: u64,

    /// Work units abandoned after a fetch failure
    pub failed_units: u64,

    /// Wall time for the whole run
    pub elapsed: Duration,
}

/// Orchestrates one end-to-end snapshot run.
pub struct SnapshotController {
    api: Arc<dyn ListApi>,
    postprocess: Postprocessor,
    filter: Option<RecordFilter>,
    worker_count: usize,
    result_capacity: usize,
}

impl SnapshotController {
    pub fn new(
        api: Arc<dyn ListApi>,
        postprocess: Postprocessor,
        worker_count: usize,
        result_capacity: usize,
    ) -> Self {
        Self {
            api,
            postprocess,
            filter: None,
            worker_count,
            result_capacity,
        }
    }

    /// Attach a per-record post-filter predicate, applied before forwarding.
    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Run discovery and collection, consuming `writer`.
    ///
    /// The writer is closed on every exit path: explicitly on success, by
    /// drop (with a best-effort flush) on failure.
    pub fn run(&self, plan: WorkPlan<'_>, writer: JsonlWriter) -> Result<SnapshotSummary> {
        let start = Instant::now();
        let mut phase = SnapPhase::Idle;
        info!(phase = %phase, started_at = %chrono::Utc::now().to_rfc3339(), "Snapshot run created");

        phase = SnapPhase::Discovering;
        info!(phase = %phase, "Resolving work units");

        let units = match plan {
            WorkPlan::Explicit(units) => units,
            WorkPlan::Discover {
                api,
                root,
                delimiter,
                policy,
            } => {
                let discoverer = PrefixDiscoverer::new(api, delimiter);
                match discoverer.discover(&root, &policy) {
                    Ok(units) => units,
                    Err(e) => {
                        phase = SnapPhase::Failed;
                        error!(
                            phase = %phase,
                            root = %root,
                            error = %e,
                            elapsed_secs = start.elapsed().as_secs_f64(),
                            "Discovery failed"
                        );
                        return Err(SnapError::Api(e));
                    }
                }
            }
        };

        let unit_count = units.len();
        info!(units = unit_count, "Work units resolved");

        phase = SnapPhase::Collecting;
        info!(
            phase = %phase,
            units = unit_count,
            workers = self.worker_count,
            "Starting collection"
        );

        let queue = TaskQueue::preloaded(units, self.worker_count);
        let results = ResultChannel::with_capacity(self.result_capacity);
        let pool = WorkerPool::spawn(
            self.worker_count,
            &self.api,
            self.filter.as_ref(),
            &queue,
            &results,
        )?;
        let worker_count = pool.worker_count();

        // The sink runs on this thread and consumes the receiving half; when
        // drain returns the receiver is gone, so workers still blocked on a
        // full channel observe a disconnect instead of hanging the join below.
        let mut writer = writer;
        let sink = ResultSink::new(results.into_receiver(), worker_count, self.postprocess);
        let sink_result = sink.drain(&mut writer);

        // Join every worker before reporting, on the failure path too.
        let pool_stats = pool.join_all();

        let report = match sink_result {
            Ok(report) => report,
            Err(e) => {
                phase = SnapPhase::Failed;
                error!(
                    phase = %phase,
                    error = %e,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "Collection failed"
                );
                return Err(e);
            }
        };

        writer.finish().map_err(SnapError::Sink)?;

        let elapsed = start.elapsed();
        phase = SnapPhase::Done;
        info!(
            phase = %phase,
            discovered = report.records_written,
            failed_units = pool_stats.units_failed,
            elapsed_secs = elapsed.as_secs_f64(),
            "Snapshot complete"
        );

        Ok(SnapshotSummary {
            units: unit_count,
            workers: worker_count,
            records_written: report.records_written,
            batches: report.batches,
            records_skipped: report.records_skipped,
            records_filtered: pool_stats.records_filtered,
            failed_units: pool_stats.units_failed,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult};
    use crate::output::WriteMode;
    use crate::remote::{ListPage, Record};
    use serde_json::json;
    use tempfile::tempdir;

    struct SinglePageApi;

    impl ListApi for SinglePageApi {
        fn list(&self, filter: &str, _token: Option<&str>) -> ApiResult<ListPage> {
            let record: Record = json!({
                "Key": format!("{filter}obj"),
                "LastModified": 1700000000,
                "ETag": "x"
            })
            .as_object()
            .cloned()
            .unwrap();
            Ok(ListPage::ok(vec![record], None))
        }
    }

    struct FailingGroupings;

    impl GroupingApi for FailingGroupings {
        fn list_groupings(&self, _prefix: &str, _delimiter: &str) -> ApiResult<Vec<String>> {
            Err(ApiError::Status { code: 500 })
        }
    }

    #[test]
    fn test_explicit_plan_collects_all_units() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snap.jsonl");
        let writer = JsonlWriter::open(&path, WriteMode::Truncate).unwrap();

        let api: Arc<dyn ListApi> = Arc::new(SinglePageApi);
        let controller = SnapshotController::new(api, Postprocessor::ObjectKeys, 2, 64);
        let units = vec!["a/".to_string(), "b/".to_string(), "c/".to_string()];
        let summary = controller
            .run(WorkPlan::Explicit(units), writer)
            .unwrap();

        assert_eq!(summary.units, 3);
        assert_eq!(summary.workers, 2);
        assert_eq!(summary.records_written, 3);
        assert_eq!(summary.failed_units, 0);

        let lines = std::fs::read_to_string(&path).unwrap();
        assert_eq!(lines.lines().count(), 3);
    }

    #[test]
    fn test_discovery_failure_aborts_before_collection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snap.jsonl");
        let writer = JsonlWriter::open(&path, WriteMode::Truncate).unwrap();

        let api: Arc<dyn ListApi> = Arc::new(SinglePageApi);
        let groupings = FailingGroupings;
        let controller = SnapshotController::new(api, Postprocessor::ObjectKeys, 2, 64);
        let plan = WorkPlan::Discover {
            api: &groupings,
            root: "data/".into(),
            delimiter: "/".into(),
            policy: DiscoveryPolicy::default(),
        };

        let err = controller.run(plan, writer).unwrap_err();
        assert!(matches!(err, SnapError::Api(ApiError::Status { code: 500 })));
        // Nothing was collected.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_more_workers_than_units() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snap.jsonl");
        let writer = JsonlWriter::open(&path, WriteMode::Truncate).unwrap();

        let api: Arc<dyn ListApi> = Arc::new(SinglePageApi);
        let controller = SnapshotController::new(api, Postprocessor::ObjectKeys, 4, 64);
        let summary = controller
            .run(WorkPlan::Explicit(vec!["only/".to_string()]), writer)
            .unwrap();

        assert_eq!(summary.workers, 4);
        assert_eq!(summary.records_written, 1);
    }
}
