//! Stream shard topology snapshots
//!
//! When no explicit stream list is given, stream names are enumerated from
//! the API first; an enumeration failure is fatal, like prefix discovery.
//! Each stream name then becomes one work unit whose "page" is the single
//! describe record carrying the shard topology.

use crate::collector::{SnapshotController, SnapshotSummary, WorkPlan};
use crate::config::SnapConfig;
use crate::error::Result;
use crate::output::JsonlWriter;
use crate::postprocess::Postprocessor;
use crate::remote::{ApiConnection, ListApi, StreamCatalogClient};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Snapshots shard topologies for a region's streams.
pub struct StreamSnapper<'a> {
    config: &'a SnapConfig,
    streams: Option<&'a [String]>,
}

impl<'a> StreamSnapper<'a> {
    pub fn new(config: &'a SnapConfig, streams: Option<&'a [String]>) -> Self {
        Self { config, streams }
    }

    /// Run one snapshot, logging start and outcome with the resource
    /// identity.
    pub fn snap(&self) -> Result<SnapshotSummary> {
        let start = Instant::now();
        info!(
            region = %self.config.connection.region,
            "Starting stream topology collection"
        );

        match self.do_snap() {
            Ok(summary) => {
                info!(
                    region = %self.config.connection.region,
                    discovered = summary.records_written,
                    elapsed_secs = summary.elapsed.as_secs_f64(),
                    "Finished stream topology collection"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(
                    region = %self.config.connection.region,
                    error = %e,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "Stream topology collection failed"
                );
                Err(e)
            }
        }
    }

    fn do_snap(&self) -> Result<SnapshotSummary> {
        let conn = Arc::new(ApiConnection::new(&self.config.connection));
        let client = Arc::new(StreamCatalogClient::new(conn));

        let names = match self.streams {
            Some(names) => names.to_vec(),
            None => {
                let names = client.enumerate()?;
                info!(streams = names.len(), "Enumerated streams");
                names
            }
        };

        let writer = JsonlWriter::open(&self.config.target_file, self.config.write_mode)?;

        let api: Arc<dyn ListApi> = client;
        let controller = SnapshotController::new(
            api,
            Postprocessor::StreamDescriptions,
            self.config.workers,
            self.config.result_capacity,
        );

        controller.run(WorkPlan::Explicit(names), writer)
    }
}
