//! Resource families the tool can snapshot
//!
//! Each family assembles its own discovery, fetch and postprocess pieces
//! around the shared collection engine. The set is closed: a family is a
//! [`crate::config::ResourceConfig`] variant selected at configuration
//! time, never a runtime lookup.
//!
//! Every snapper follows the same shape as the others: log the run start
//! with the resource identity, run the engine, then log either the summary
//! or the failure. A failed run never corrupts state for sibling resource
//! families - each run owns its own clients and writer.

pub mod metric_defaults;
pub mod metrics;
pub mod objects;
pub mod streams;

pub use metrics::MetricSnapper;
pub use objects::ObjectSnapper;
pub use streams::StreamSnapper;
