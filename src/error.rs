//! Error types for cloudsnap
//!
//! This module defines the error hierarchy covering:
//! - Remote API transport and status errors
//! - Configuration and CLI errors
//! - Worker thread errors
//! - Snapshot sink / output writer errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include context about what failed
//! - A failed work unit is logged and skipped; only discovery, writer and
//!   channel failures abort a run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the cloudsnap application
#[derive(Error, Debug)]
pub enum SnapError {
    /// Remote API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Sink / output writer errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote API errors
///
/// A response that came back with a status outside {200, 201} is a `Status`
/// error, treated identically to a transport failure by the collection
/// engine.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Request never produced a response
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    /// Response arrived with a non-success status
    #[error("request failed with status {code}")]
    Status { code: u16 },

    /// Response body could not be decoded
    #[error("failed to decode response: {reason}")]
    Decode { reason: String },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid result channel capacity
    #[error("Invalid result capacity {size}: must be at least {min}")]
    InvalidResultCapacity { size: usize, min: usize },

    /// Output path error
    #[error("Invalid target file '{path}': {reason}")]
    InvalidTargetFile { path: PathBuf, reason: String },

    /// Malformed dimension filter expression
    #[error("Invalid dimension filter '{filter}': {reason}")]
    InvalidDimensionFilter { filter: String, reason: String },

    /// Namespace without a default metric table and no explicit metric list
    #[error("No default metrics known for namespace '{namespace}': pass --metrics explicitly")]
    UnknownNamespace { namespace: String },

    /// Empty enumeration where at least one item is required
    #[error("'{name}' must name at least one item")]
    EmptyList { name: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked")]
    Panicked { id: usize },

    /// Worker thread could not be spawned
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Result channel closed while the worker was forwarding pages
    #[error("Result channel closed unexpectedly")]
    ResultChannelClosed,
}

/// Sink and output writer errors
#[derive(Error, Debug)]
pub enum SinkError {
    /// Writing to the target file failed
    #[error("Failed to write snapshot records: {0}")]
    Write(#[from] std::io::Error),

    /// A record could not be JSON-encoded
    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writer was used after being closed
    #[error("Snapshot writer already closed")]
    Closed,

    /// Result channel disconnected before every worker reported completion
    #[error("Result channel closed before all workers completed")]
    ChannelClosed,
}

/// Result type alias for SnapError
pub type Result<T> = std::result::Result<T, SnapError>;

/// Result type alias for ApiError
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Result type alias for SinkError
pub type SinkResult<T> = std::result::Result<T, SinkError>;
