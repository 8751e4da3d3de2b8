//! Single-consumer result sink
//!
//! The sink drains the result channel on the calling thread and is the only
//! code that touches the output writer during a run. Termination is decided
//! by counting completion signals, not by channel closure: every page sent
//! before the last worker's signal is received and written, because each
//! worker sends its pages strictly before its own signal.

use super::queue::{ResultItem, ResultReceiver};
use crate::error::{SinkError, SnapError};
use crate::output::JsonlWriter;
use crate::postprocess::Postprocessor;
use crate::remote::Record;
use tracing::{debug, warn};

/// Outcome counters for one drain.
#[derive(Debug, Default, Clone, Copy)]
pub struct SinkReport {
    /// Records written to the target file
    pub records_written: u64,

    /// Records dropped because their transform failed
    pub records_skipped: u64,

    /// Batches handed to the writer
    pub batches: u64,

    /// Completion signals received
    pub completions: usize,
}

/// Drains pages from the result channel into the output writer.
pub struct ResultSink {
    results: ResultReceiver,
    worker_count: usize,
    postprocess: Postprocessor,
}

impl ResultSink {
    pub fn new(results: ResultReceiver, worker_count: usize, postprocess: Postprocessor) -> Self {
        Self {
            results,
            worker_count,
            postprocess,
        }
    }

    /// Receive until every worker has reported completion, writing each page
    /// as one batch.
    ///
    /// Consumes the sink so the receiver is dropped on exit; producers still
    /// blocked on a full channel then observe a disconnect and unwind
    /// instead of hanging.
    pub fn drain(self, writer: &mut JsonlWriter) -> Result<SinkReport, SnapError> {
        let mut report = SinkReport::default();

        while report.completions < self.worker_count {
            match self.results.recv() {
                Some(ResultItem::Page(page)) => {
                    let batch = self.normalize(page, &mut report);
                    if !batch.is_empty() {
                        writer.write_batch(&batch).map_err(SnapError::Sink)?;
                        report.records_written += batch.len() as u64;
                        report.batches += 1;
                    }
                }
                Some(ResultItem::WorkerDone) => {
                    report.completions += 1;
                    debug!(
                        completions = report.completions,
                        workers = self.worker_count,
                        "Worker completed"
                    );
                }
                None => {
                    return Err(SnapError::Sink(SinkError::ChannelClosed));
                }
            }
        }

        Ok(report)
    }

    fn normalize(&self, page: Vec<Record>, report: &mut SinkReport) -> Vec<Record> {
        let mut batch = Vec::with_capacity(page.len());
        for record in page {
            match self.postprocess.apply(record) {
                Ok(normalized) => batch.push(normalized),
                Err(e) => {
                    report.records_skipped += 1;
                    warn!(error = %e, "Dropping record that failed postprocessing");
                }
            }
        }
        batch
    }
}
