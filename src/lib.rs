//! cloudsnap - Cloud Resource Metadata Snapshot Tool
//!
//! Inventories metadata from a cloud provider's resource namespaces (object
//! storage keys, metric descriptors, stream shard topologies) and persists
//! a flattened snapshot as newline-delimited JSON for downstream analysis.
//!
//! # Features
//!
//! - **Adaptive discovery**: hierarchical key spaces are partitioned into
//!   leaf prefixes before collection, with bounded fan-out.
//!
//! - **Parallel collection**: a fixed pool of worker threads drives the
//!   paginated listing APIs, one work unit at a time per worker.
//!
//! - **Memory bounded**: a bounded result channel applies backpressure, so
//!   a slow writer stalls producers instead of growing the heap.
//!
//! - **Partial-failure tolerant**: a failed work unit is logged and
//!   skipped; already-collected records always reach the output file.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Provider listing APIs                        │
//! │            (keys / groupings / metrics / streams)                │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ paginated list calls
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Worker Threads                             │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │Worker 1 │  │Worker 2 │  │Worker 3 │  ...    │Worker N │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       │            │            │                    │          │
//! │       ▲ task queue (units + shutdown markers)        │          │
//! │       │            │            │                    │          │
//! │       └────────────┴─────┬──────┴────────────────────┘          │
//! │                          ▼                                      │
//! │            ┌──────────────────────────┐                         │
//! │            │   Result channel         │                         │
//! │            │  (crossbeam bounded)     │                         │
//! │            │  pages + completions     │                         │
//! │            └────────────┬─────────────┘                         │
//! │                         ▼                                       │
//! │            ┌──────────────────────────┐                         │
//! │            │   Result sink            │                         │
//! │            │  postprocess + write     │                         │
//! │            └──────────────────────────┘                         │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               ▼
//!                    ┌──────────────────┐
//!                    │  snapshot.jsonl  │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Inventory a bucket's key metadata
//! cloudsnap --endpoint https://api.internal --access-key AK --secret-key SK \
//!     --region us-east-1 objects --bucket prod-archive --prefix 'AWSLogs/'
//!
//! # Metric descriptors with the namespace's default metric set
//! cloudsnap ... metrics --namespace AWS/EC2
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod filter;
pub mod output;
pub mod postprocess;
pub mod progress;
pub mod remote;
pub mod resources;

pub use collector::{SnapshotController, SnapshotSummary, WorkPlan};
pub use config::{CliArgs, ResourceConfig, SnapConfig};
pub use error::{Result, SnapError};
