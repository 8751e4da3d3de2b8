//! Metric descriptor snapshots
//!
//! The work list is the namespace's metric names (explicit or from the
//! default tables); each unit paginates the descriptor listing for one
//! metric name. Records pass through a post-filter before forwarding:
//! dimensionless metrics are always dropped, configured dimension filters
//! apply with OR semantics, and optionally dimensions are checked against
//! the live entity catalog so descriptors for deleted entities do not
//! linger in the snapshot.

use crate::collector::fetch::RecordFilter;
use crate::collector::{SnapshotController, SnapshotSummary, WorkPlan};
use crate::config::SnapConfig;
use crate::error::Result;
use crate::filter::DimensionMatcher;
use crate::output::JsonlWriter;
use crate::postprocess::Postprocessor;
use crate::remote::{ApiConnection, EntityCatalogClient, ListApi, MetricCatalogClient, Record};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Entity catalogs that back dimension validation, per namespace.
fn validation_catalog(namespace: &str) -> Option<(&'static str, &'static str)> {
    match namespace {
        "AWS/EC2" => Some(("instances", "InstanceId")),
        "AWS/EBS" => Some(("volumes", "VolumeId")),
        _ => None,
    }
}

/// Snapshots metric descriptors for one namespace.
pub struct MetricSnapper<'a> {
    config: &'a SnapConfig,
    namespace: &'a str,
    metric_names: &'a [String],
    dimension_filters: &'a [DimensionMatcher],
    validate_dimensions: bool,
}

impl<'a> MetricSnapper<'a> {
    pub fn new(
        config: &'a SnapConfig,
        namespace: &'a str,
        metric_names: &'a [String],
        dimension_filters: &'a [DimensionMatcher],
        validate_dimensions: bool,
    ) -> Self {
        Self {
            config,
            namespace,
            metric_names,
            dimension_filters,
            validate_dimensions,
        }
    }

    /// Run one snapshot, logging start and outcome with the resource
    /// identity.
    pub fn snap(&self) -> Result<SnapshotSummary> {
        let start = Instant::now();
        info!(
            region = %self.config.connection.region,
            namespace = %self.namespace,
            metrics = self.metric_names.len(),
            "Starting metric descriptor collection"
        );

        match self.do_snap() {
            Ok(summary) => {
                info!(
                    region = %self.config.connection.region,
                    namespace = %self.namespace,
                    discovered = summary.records_written,
                    elapsed_secs = summary.elapsed.as_secs_f64(),
                    "Finished metric descriptor collection"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(
                    region = %self.config.connection.region,
                    namespace = %self.namespace,
                    error = %e,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "Metric descriptor collection failed"
                );
                Err(e)
            }
        }
    }

    fn do_snap(&self) -> Result<SnapshotSummary> {
        let conn = Arc::new(ApiConnection::new(&self.config.connection));
        let client = Arc::new(MetricCatalogClient::new(
            Arc::clone(&conn),
            self.namespace,
        ));

        // Resolved once, single-threaded, before the pool starts.
        let valid_ids = if self.validate_dimensions {
            self.fetch_valid_ids(&conn)
        } else {
            None
        };

        let writer = JsonlWriter::open(&self.config.target_file, self.config.write_mode)?;

        let filter = record_filter(self.dimension_filters.to_vec(), valid_ids);
        let api: Arc<dyn ListApi> = client;
        let controller = SnapshotController::new(
            api,
            Postprocessor::Identity,
            self.config.workers,
            self.config.result_capacity,
        )
        .with_filter(filter);

        let plan = WorkPlan::Explicit(self.metric_names.to_vec());
        controller.run(plan, writer)
    }

    /// Fetch the set of live entity ids for this namespace, if it has a
    /// backing catalog. A catalog failure degrades to no validation rather
    /// than aborting the run.
    fn fetch_valid_ids(&self, conn: &Arc<ApiConnection>) -> Option<HashSet<String>> {
        let (kind, id_key) = match validation_catalog(self.namespace) {
            Some(catalog) => catalog,
            None => {
                info!(
                    namespace = %self.namespace,
                    "No entity catalog for namespace; skipping dimension validation"
                );
                return None;
            }
        };

        let catalog = EntityCatalogClient::new(Arc::clone(conn));
        match catalog.valid_ids(kind, id_key) {
            Ok(ids) => {
                info!(kind, entities = ids.len(), "Loaded entity catalog");
                Some(ids)
            }
            Err(e) => {
                warn!(
                    kind,
                    error = %e,
                    "Failed to load entity catalog; keeping metrics unvalidated"
                );
                None
            }
        }
    }
}

/// Compose the per-record predicate applied by the fetcher.
fn record_filter(
    matchers: Vec<DimensionMatcher>,
    valid_ids: Option<HashSet<String>>,
) -> RecordFilter {
    Arc::new(move |record: &Record| {
        if !has_dimensions(record) {
            return false;
        }

        if !matchers.is_empty() && !matchers.iter().any(|m| m.matches_record(record)) {
            return false;
        }

        match &valid_ids {
            // Keep the record when any dimension value names a live entity.
            Some(ids) => dimension_values(record).any(|value| ids.contains(value)),
            None => true,
        }
    })
}

fn has_dimensions(record: &Record) -> bool {
    record
        .get("Dimensions")
        .and_then(Value::as_array)
        .map(|dims| !dims.is_empty())
        .unwrap_or(false)
}

fn dimension_values(record: &Record) -> impl Iterator<Item = &str> {
    record
        .get("Dimensions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|dim| dim.get("Value").and_then(Value::as_str))
}
