//! Worker threads for parallel metadata collection
//!
//! Each worker:
//! - Pulls work units from the shared task queue
//! - Drives the paginated fetcher for one unit at a time, to completion
//! - Forwards every page to the bounded result channel
//! - Emits exactly one completion signal before terminating, on every path
//!
//! A failed unit is logged and skipped; it never crashes the worker or
//! touches sibling units.

use super::fetch::{FetchError, FetchStats, PageFetcher, RecordFilter};
use super::queue::{ResultChannel, ResultSender, Task, TaskQueue, TaskReceiver, TaskSender};
use crate::error::WorkerError;
use crate::remote::ListApi;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Work units fully collected
    pub units_processed: AtomicU64,

    /// Work units abandoned after a fetch failure
    pub units_failed: AtomicU64,

    /// Pages forwarded to the sink
    pub pages_forwarded: AtomicU64,

    /// Records forwarded to the sink
    pub records_collected: AtomicU64,

    /// Records dropped by the post-filter predicate
    pub records_filtered: AtomicU64,
}

impl WorkerStats {
    fn record_unit(&self, fetch: &FetchStats) {
        self.units_processed.fetch_add(1, Ordering::Relaxed);
        self.pages_forwarded.fetch_add(fetch.pages, Ordering::Relaxed);
        self.records_collected
            .fetch_add(fetch.records, Ordering::Relaxed);
        self.records_filtered
            .fetch_add(fetch.filtered, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.units_failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// A worker thread that collects work units
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<Result<(), WorkerError>>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        api: Arc<dyn ListApi>,
        filter: Option<RecordFilter>,
        tasks_rx: TaskReceiver,
        tasks_tx: TaskSender,
        results: ResultSender,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("collector-{}", id))
            .spawn(move || worker_loop(id, api, filter, tasks_rx, tasks_tx, results, stats_clone))
            .map_err(|e| WorkerError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => Err(WorkerError::Panicked { id: self.id }),
            },
            None => Ok(()),
        }
    }
}

/// Main worker loop wrapper: guarantees the completion signal is emitted
/// exactly once per worker, also when collection bails out early.
fn worker_loop(
    id: usize,
    api: Arc<dyn ListApi>,
    filter: Option<RecordFilter>,
    tasks_rx: TaskReceiver,
    tasks_tx: TaskSender,
    results: ResultSender,
    stats: Arc<WorkerStats>,
) -> Result<(), WorkerError> {
    debug!(worker = id, "Worker starting");

    let outcome = run_worker(id, &api, filter.as_ref(), &tasks_rx, &tasks_tx, &results, &stats);

    // If the sink is already gone this send fails, which is fine: the sink
    // no longer counts completions.
    let _ = results.send_done();

    debug!(
        worker = id,
        units = stats.units_processed.load(Ordering::Relaxed),
        failed = stats.units_failed.load(Ordering::Relaxed),
        "Worker shutting down"
    );

    outcome
}

fn run_worker(
    id: usize,
    api: &Arc<dyn ListApi>,
    filter: Option<&RecordFilter>,
    tasks_rx: &TaskReceiver,
    tasks_tx: &TaskSender,
    results: &ResultSender,
    stats: &WorkerStats,
) -> Result<(), WorkerError> {
    loop {
        match tasks_rx.recv() {
            Some(Task::Collect(unit)) => {
                let fetcher = PageFetcher::with_filter(api.as_ref(), filter);
                match fetcher.fetch_into(&unit, results) {
                    Ok(fetch) => {
                        stats.record_unit(&fetch);
                        debug!(
                            worker = id,
                            unit = %unit,
                            pages = fetch.pages,
                            records = fetch.records,
                            "Work unit collected"
                        );
                    }
                    Err(FetchError::Api(e)) => {
                        stats.record_failure();
                        warn!(
                            worker = id,
                            unit = %unit,
                            error = %e,
                            "Failed to collect work unit; skipping"
                        );
                    }
                    Err(FetchError::ChannelClosed) => {
                        warn!(worker = id, unit = %unit, "Result channel closed; worker exiting");
                        return Err(WorkerError::ResultChannelClosed);
                    }
                }
            }
            Some(Task::Shutdown) => {
                // Put the marker back so sibling workers observe it too.
                tasks_tx.requeue_shutdown();
                break;
            }
            None => break,
        }
    }

    Ok(())
}

/// Aggregated statistics across a whole pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct PoolStats {
    pub units_processed: u64,
    pub units_failed: u64,
    pub pages_forwarded: u64,
    pub records_collected: u64,
    pub records_filtered: u64,
}

/// A fixed-size pool of collection workers.
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Spawn `count` workers against the shared queue and result channel.
    pub fn spawn(
        count: usize,
        api: &Arc<dyn ListApi>,
        filter: Option<&RecordFilter>,
        queue: &TaskQueue,
        results: &ResultChannel,
    ) -> Result<Self, WorkerError> {
        let mut workers = Vec::with_capacity(count);
        for id in 0..count {
            workers.push(Worker::spawn(
                id,
                Arc::clone(api),
                filter.cloned(),
                queue.receiver(),
                queue.sender(),
                results.sender(),
            )?);
        }

        info!(count = workers.len(), "Workers spawned");
        Ok(Self { workers })
    }

    /// Number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Join every worker and aggregate final statistics.
    ///
    /// Join failures are logged, not propagated: by this point the sink has
    /// already decided the run's outcome.
    pub fn join_all(self) -> PoolStats {
        let mut totals = PoolStats::default();

        for worker in self.workers {
            let id = worker.id();
            let stats = Arc::clone(&worker.stats);
            if let Err(e) = worker.join() {
                warn!(worker = id, error = %e, "Worker did not shut down cleanly");
            }

            totals.units_processed += stats.units_processed.load(Ordering::Relaxed);
            totals.units_failed += stats.units_failed.load(Ordering::Relaxed);
            totals.pages_forwarded += stats.pages_forwarded.load(Ordering::Relaxed);
            totals.records_collected += stats.records_collected.load(Ordering::Relaxed);
            totals.records_filtered += stats.records_filtered.load(Ordering::Relaxed);
        }

        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::queue::ResultItem;
    use crate::error::{ApiError, ApiResult};
    use crate::remote::{ListPage, Record};
    use serde_json::json;

    struct SinglePageApi;

    impl ListApi for SinglePageApi {
        fn list(&self, filter: &str, _token: Option<&str>) -> ApiResult<ListPage> {
            let record: Record = json!({ "Unit": filter }).as_object().cloned().unwrap();
            Ok(ListPage::ok(vec![record], None))
        }
    }

    struct AlwaysFailingApi;

    impl ListApi for AlwaysFailingApi {
        fn list(&self, _filter: &str, _token: Option<&str>) -> ApiResult<ListPage> {
            Err(ApiError::Transport {
                reason: "unreachable".into(),
            })
        }
    }

    #[test]
    fn test_worker_stats_accumulation() {
        let stats = WorkerStats::default();
        stats.record_unit(&FetchStats {
            pages: 2,
            records: 10,
            filtered: 1,
        });
        stats.record_failure();

        assert_eq!(stats.units_processed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.units_failed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.pages_forwarded.load(Ordering::Relaxed), 2);
        assert_eq!(stats.records_collected.load(Ordering::Relaxed), 10);
        assert_eq!(stats.records_filtered.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_pool_drains_queue_and_signals_completion() {
        let api: Arc<dyn ListApi> = Arc::new(SinglePageApi);
        let units: Vec<String> = (0..8).map(|i| format!("unit-{i}")).collect();
        let queue = TaskQueue::preloaded(units, 3);
        let results = ResultChannel::with_capacity(64);

        let pool = WorkerPool::spawn(3, &api, None, &queue, &results).unwrap();
        let receiver = results.into_receiver();

        let mut pages = 0;
        let mut completions = 0;
        while completions < 3 {
            match receiver.recv() {
                Some(ResultItem::Page(_)) => pages += 1,
                Some(ResultItem::WorkerDone) => completions += 1,
                None => panic!("channel closed early"),
            }
        }

        let totals = pool.join_all();
        assert_eq!(pages, 8);
        assert_eq!(completions, 3);
        assert_eq!(totals.units_processed, 8);
        assert_eq!(totals.units_failed, 0);
    }

    #[test]
    fn test_failing_units_still_complete() {
        let api: Arc<dyn ListApi> = Arc::new(AlwaysFailingApi);
        let queue = TaskQueue::preloaded(vec!["a".to_string(), "b".to_string()], 2);
        let results = ResultChannel::with_capacity(64);

        let pool = WorkerPool::spawn(2, &api, None, &queue, &results).unwrap();
        let receiver = results.into_receiver();

        let mut completions = 0;
        while completions < 2 {
            match receiver.recv() {
                Some(ResultItem::WorkerDone) => completions += 1,
                Some(ResultItem::Page(_)) => panic!("no pages expected"),
                None => panic!("channel closed early"),
            }
        }

        let totals = pool.join_all();
        assert_eq!(totals.units_failed, 2);
        assert_eq!(totals.units_processed, 0);
    }
}
