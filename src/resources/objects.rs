//! Object storage key metadata snapshots
//!
//! Discovers leaf prefixes under the configured root, then collects key
//! metadata per prefix across the worker pool. Key records get their
//! timestamps stringified and the volatile content hash dropped before
//! writing.

use crate::collector::discover::DiscoveryPolicy;
use crate::collector::{SnapshotController, SnapshotSummary, WorkPlan};
use crate::config::SnapConfig;
use crate::error::Result;
use crate::output::JsonlWriter;
use crate::postprocess::Postprocessor;
use crate::remote::{ApiConnection, ListApi, ObjectStoreClient};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Snapshots key metadata for one bucket.
pub struct ObjectSnapper<'a> {
    config: &'a SnapConfig,
    bucket: &'a str,
    prefix: &'a str,
    policy: DiscoveryPolicy,
}

impl<'a> ObjectSnapper<'a> {
    pub fn new(
        config: &'a SnapConfig,
        bucket: &'a str,
        prefix: &'a str,
        policy: DiscoveryPolicy,
    ) -> Self {
        Self {
            config,
            bucket,
            prefix,
            policy,
        }
    }

    /// Run one snapshot, logging start and outcome with the resource
    /// identity.
    pub fn snap(&self) -> Result<SnapshotSummary> {
        let start = Instant::now();
        info!(
            region = %self.config.connection.region,
            bucket = %self.bucket,
            prefix = %self.prefix,
            "Starting object metadata collection"
        );

        match self.do_snap() {
            Ok(summary) => {
                info!(
                    region = %self.config.connection.region,
                    bucket = %self.bucket,
                    prefix = %self.prefix,
                    discovered = summary.records_written,
                    elapsed_secs = summary.elapsed.as_secs_f64(),
                    "Finished object metadata collection"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(
                    region = %self.config.connection.region,
                    bucket = %self.bucket,
                    prefix = %self.prefix,
                    error = %e,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "Object metadata collection failed"
                );
                Err(e)
            }
        }
    }

    fn do_snap(&self) -> Result<SnapshotSummary> {
        let conn = Arc::new(ApiConnection::new(&self.config.connection));
        let client = Arc::new(ObjectStoreClient::new(conn, self.bucket));

        let writer = JsonlWriter::open(&self.config.target_file, self.config.write_mode)?;

        let api: Arc<dyn ListApi> = client.clone();
        let controller = SnapshotController::new(
            api,
            Postprocessor::ObjectKeys,
            self.config.workers,
            self.config.result_capacity,
        );

        let plan = WorkPlan::Discover {
            api: client.as_ref(),
            root: self.prefix.to_string(),
            delimiter: "/".to_string(),
            policy: self.policy.clone(),
        };

        controller.run(plan, writer)
    }
}
