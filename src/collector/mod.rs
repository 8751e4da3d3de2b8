//! Concurrent discovery-and-collection engine
//!
//! The engine turns an a-priori-unknown resource space into a flattened
//! snapshot in four stages:
//!
//! 1. [`discover`] partitions a hierarchical key space into leaf prefixes
//!    (or the caller supplies an explicit unit list).
//! 2. [`worker`] fans the units out across a fixed pool, each worker driving
//!    [`fetch`] against the paginated remote API.
//! 3. Pages flow back through the bounded result channel in [`queue`].
//! 4. [`sink`] serializes them through a single writer, terminating when
//!    every worker has signalled completion.
//!
//! [`controller`] ties the stages into one run with deterministic shutdown:
//! workers are joined on every path, and a failure is isolated to the run
//! that produced it.

pub mod controller;
pub mod discover;
pub mod fetch;
pub mod queue;
pub mod sink;
pub mod worker;

pub use controller::{SnapPhase, SnapshotController, SnapshotSummary, WorkPlan};
pub use discover::{DiscoveryPolicy, PrefixDiscoverer, DEFAULT_MAX_PREFIXES, DEFAULT_MAX_ROUNDS};
pub use fetch::{FetchError, FetchStats, PageFetcher, RecordFilter};
pub use queue::{
    ResultChannel, ResultItem, ResultReceiver, ResultSender, Task, TaskQueue, WorkUnit,
    DEFAULT_RESULT_CAPACITY,
};
pub use sink::{ResultSink, SinkReport};
pub use worker::{PoolStats, Worker, WorkerPool, WorkerStats};
