//! Newline-delimited JSON output writer
//!
//! The target file is opened once per run, written in batches by the sink,
//! and closed once. The sink is the only writer for the duration of a run,
//! so no locking is needed. `finish` surfaces flush errors on the success
//! path; `Drop` flushes best-effort so no already-written page is lost when
//! a run fails partway.

use crate::error::{SinkError, SinkResult};
use crate::remote::Record;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Whether a run appends to or replaces the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Keep existing records, append new ones (default)
    Append,

    /// Replace the file contents
    Truncate,
}

/// Append-oriented writer producing one JSON object per line.
pub struct JsonlWriter {
    path: PathBuf,
    file: Option<BufWriter<File>>,
    records_written: u64,
    batches_written: u64,
}

impl JsonlWriter {
    /// Open the target file for this run.
    pub fn open(path: &Path, mode: WriteMode) -> SinkResult<Self> {
        let mut options = OpenOptions::new();
        options.create(true).write(true);
        match mode {
            WriteMode::Append => options.append(true),
            WriteMode::Truncate => options.truncate(true),
        };

        let file = options.open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(BufWriter::new(file)),
            records_written: 0,
            batches_written: 0,
        })
    }

    /// Append one batch, one encoded record per line.
    pub fn write_batch(&mut self, records: &[Record]) -> SinkResult<()> {
        let file = self.file.as_mut().ok_or(SinkError::Closed)?;

        for record in records {
            serde_json::to_writer(&mut *file, record)?;
            file.write_all(b"\n")?;
        }

        self.records_written += records.len() as u64;
        self.batches_written += 1;
        Ok(())
    }

    /// Records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Batches written so far.
    pub fn batches_written(&self) -> u64 {
        self.batches_written
    }

    /// Path of the target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close, returning the total record count.
    pub fn finish(mut self) -> SinkResult<u64> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        Ok(self.records_written)
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(key: &str) -> Record {
        json!({ "Key": key }).as_object().cloned().unwrap()
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_one_record_per_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut writer = JsonlWriter::open(&path, WriteMode::Truncate).unwrap();
        writer.write_batch(&[record("a"), record("b")]).unwrap();
        writer.write_batch(&[record("c")]).unwrap();
        assert_eq!(writer.batches_written(), 2);
        assert_eq!(writer.finish().unwrap(), 3);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        for line in &lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(parsed.get("Key").is_some());
        }
    }

    #[test]
    fn test_append_mode_keeps_existing_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut writer = JsonlWriter::open(&path, WriteMode::Append).unwrap();
        writer.write_batch(&[record("a")]).unwrap();
        writer.finish().unwrap();

        let mut writer = JsonlWriter::open(&path, WriteMode::Append).unwrap();
        writer.write_batch(&[record("b")]).unwrap();
        writer.finish().unwrap();

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_truncate_mode_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut writer = JsonlWriter::open(&path, WriteMode::Append).unwrap();
        writer.write_batch(&[record("a"), record("b")]).unwrap();
        writer.finish().unwrap();

        let mut writer = JsonlWriter::open(&path, WriteMode::Truncate).unwrap();
        writer.write_batch(&[record("c")]).unwrap();
        writer.finish().unwrap();

        assert_eq!(read_lines(&path), vec![r#"{"Key":"c"}"#]);
    }

    #[test]
    fn test_drop_flushes_partial_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        {
            let mut writer = JsonlWriter::open(&path, WriteMode::Truncate).unwrap();
            writer.write_batch(&[record("a")]).unwrap();
            // Dropped without finish, as on a failed run.
        }

        assert_eq!(read_lines(&path).len(), 1);
    }
}
