//! Record normalization applied by the sink before writing
//!
//! Each resource family carries its own transform, selected once at run
//! configuration time. Transforms stringify timestamp fields so the output
//! is stable across encoders, and strip volatile fields (content hashes)
//! that would make successive snapshots diff noisily.
//!
//! A record that fails its transform is skipped and logged by the sink; it
//! does not abort the run.

use crate::remote::Record;
use serde_json::Value;
use thiserror::Error;

/// A record could not be normalized.
#[derive(Error, Debug)]
pub enum PostprocessError {
    #[error("record is missing required field '{field}'")]
    MissingField { field: &'static str },
}

/// Resource-specific record transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Postprocessor {
    /// Object keys: stringify `LastModified`, drop the volatile `ETag`.
    ObjectKeys,

    /// Metric descriptors pass through unchanged.
    Identity,

    /// Stream descriptions: stringify `StreamCreationTimestamp`.
    StreamDescriptions,
}

impl Postprocessor {
    /// Normalize one record.
    pub fn apply(&self, record: Record) -> Result<Record, PostprocessError> {
        match self {
            Postprocessor::ObjectKeys => object_keys(record),
            Postprocessor::Identity => Ok(record),
            Postprocessor::StreamDescriptions => stream_descriptions(record),
        }
    }
}

fn object_keys(mut record: Record) -> Result<Record, PostprocessError> {
    stringify_field(&mut record, "LastModified")?;
    record.remove("ETag");
    Ok(record)
}

fn stream_descriptions(mut record: Record) -> Result<Record, PostprocessError> {
    stringify_field(&mut record, "StreamCreationTimestamp")?;
    Ok(record)
}

fn stringify_field(record: &mut Record, field: &'static str) -> Result<(), PostprocessError> {
    let value = record
        .get_mut(field)
        .ok_or(PostprocessError::MissingField { field })?;

    if !value.is_string() {
        let rendered = match value {
            Value::Number(n) => n.to_string(),
            ref other => other.to_string(),
        };
        *value = Value::String(rendered);
    }

    Ok(())
}
