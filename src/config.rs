//! Configuration types for cloudsnap
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//!
//! The resource kind is a closed set selected at parse time - each
//! subcommand maps to one [`ResourceConfig`] variant carrying its own
//! discovery, filtering and postprocessing choices.

use crate::collector::discover::{DiscoveryPolicy, DEFAULT_MAX_PREFIXES, DEFAULT_MAX_ROUNDS};
use crate::collector::queue::DEFAULT_RESULT_CAPACITY;
use crate::error::ConfigError;
use crate::filter::DimensionMatcher;
use crate::output::WriteMode;
use crate::resources::metric_defaults;
use clap::Parser;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Minimum result channel capacity
const MIN_RESULT_CAPACITY: usize = 100;

/// Cloud resource metadata snapshot tool
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cloudsnap",
    version,
    about = "Cloud resource metadata snapshot tool",
    long_about = "Inventories metadata from a cloud provider's resource namespaces\n\
                  (object storage keys, metric descriptors, stream shard topologies)\n\
                  and persists a flattened snapshot as newline-delimited JSON.\n\n\
                  Collection fans out across a fixed worker pool against the paginated\n\
                  listing APIs; a single writer serializes results to the target file.",
    after_help = "EXAMPLES:\n    \
        cloudsnap --endpoint https://api.internal --access-key AK --secret-key SK --region us-east-1 \\\n        \
            objects --bucket prod-archive --prefix 'AWSLogs/'\n    \
        cloudsnap ... metrics --namespace AWS/EC2 --dimension-filter 'InstanceId=i-.*'\n    \
        cloudsnap ... streams --streams clickstream,auditlog"
)]
pub struct CliArgs {
    /// Listing API endpoint base URL
    #[arg(long, value_name = "URL")]
    pub endpoint: String,

    /// API access key
    #[arg(long, value_name = "KEY")]
    pub access_key: String,

    /// API secret key
    #[arg(long, value_name = "KEY")]
    pub secret_key: String,

    /// Provider region
    #[arg(long, value_name = "REGION")]
    pub region: String,

    /// File the collected metadata is written to (JSON lines)
    #[arg(
        short = 'o',
        long = "target-file",
        default_value = "snapshot.jsonl",
        value_name = "FILE"
    )]
    pub target_file: PathBuf,

    /// Overwrite the target file instead of appending
    #[arg(long)]
    pub truncate: bool,

    /// Number of collection workers
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Result channel capacity (pending pages; bounds memory use)
    #[arg(long, default_value_t = DEFAULT_RESULT_CAPACITY, value_name = "NUM")]
    pub result_capacity: usize,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show per-unit collection logs)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Resource family to snapshot
    #[command(subcommand)]
    pub command: ResourceCommand,
}

/// Resource subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum ResourceCommand {
    /// Snapshot object storage key metadata
    Objects {
        /// Bucket to inventory
        #[arg(long, value_name = "NAME")]
        bucket: String,

        /// Root key prefix, like 'AWSLogs/'
        #[arg(long, default_value = "", value_name = "PREFIX")]
        prefix: String,

        /// Prefix discovery policy
        #[arg(long, value_enum, default_value = "widen")]
        discovery: DiscoveryMode,

        /// Cap on discovered leaf prefixes (widen policy)
        #[arg(long, default_value_t = DEFAULT_MAX_PREFIXES, value_name = "NUM")]
        max_prefixes: usize,

        /// Cap on breadth-first discovery rounds (widen policy)
        #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS, value_name = "NUM")]
        max_rounds: usize,
    },

    /// Snapshot metric descriptors for a namespace
    Metrics {
        /// Metric namespace, like AWS/EC2
        #[arg(long, value_name = "NAMESPACE")]
        namespace: String,

        /// Comma-separated metric names (namespace defaults when omitted)
        #[arg(long, value_name = "NAMES")]
        metrics: Option<String>,

        /// Dimension filter like 'InstanceId=i-.*' (repeatable, OR semantics)
        #[arg(long = "dimension-filter", value_name = "SPEC", action = clap::ArgAction::Append)]
        dimension_filters: Vec<String>,

        /// Drop metrics whose dimensions reference entities that no longer exist
        #[arg(long)]
        validate_dimensions: bool,
    },

    /// Snapshot stream shard topologies
    Streams {
        /// Comma-separated stream names (enumerated from the API when omitted)
        #[arg(long, value_name = "NAMES")]
        streams: Option<String>,
    },
}

/// Prefix discovery policy selector
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Descend single-child chains, stop at the first fan-out point
    Narrow,

    /// Bounded breadth-first widening (default)
    Widen,
}

fn default_workers() -> usize {
    // Listing calls are I/O bound; oversubscribe the cores.
    num_cpus::get() * 2
}

/// Connection parameters shared by every API client in a run.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Validated per-resource configuration.
#[derive(Debug)]
pub enum ResourceConfig {
    Objects {
        bucket: String,
        prefix: String,
        policy: DiscoveryPolicy,
    },
    Metrics {
        namespace: String,
        metric_names: Vec<String>,
        dimension_filters: Vec<DimensionMatcher>,
        validate_dimensions: bool,
    },
    Streams {
        /// Explicit stream names; `None` means enumerate from the API
        streams: Option<Vec<String>>,
    },
}

/// Validated runtime configuration
#[derive(Debug)]
pub struct SnapConfig {
    /// Connection parameters for the listing APIs
    pub connection: ConnectionConfig,

    /// Output file path
    pub target_file: PathBuf,

    /// Append or overwrite the target file
    pub write_mode: WriteMode,

    /// Number of collection workers
    pub workers: usize,

    /// Result channel capacity
    pub result_capacity: usize,

    /// Show progress spinner and summary
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,

    /// Resource family to collect
    pub resource: ResourceConfig,
}

impl SnapConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.result_capacity < MIN_RESULT_CAPACITY {
            return Err(ConfigError::InvalidResultCapacity {
                size: args.result_capacity,
                min: MIN_RESULT_CAPACITY,
            });
        }

        if let Some(parent) = args.target_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::InvalidTargetFile {
                    path: args.target_file.clone(),
                    reason: format!("Parent directory '{}' does not exist", parent.display()),
                });
            }
        }

        let resource = match args.command {
            ResourceCommand::Objects {
                bucket,
                prefix,
                discovery,
                max_prefixes,
                max_rounds,
            } => {
                let policy = match discovery {
                    DiscoveryMode::Narrow => DiscoveryPolicy::NarrowSinglePath,
                    DiscoveryMode::Widen => DiscoveryPolicy::BoundedWidening {
                        max_prefixes,
                        max_rounds,
                    },
                };
                ResourceConfig::Objects {
                    bucket,
                    prefix,
                    policy,
                }
            }

            ResourceCommand::Metrics {
                namespace,
                metrics,
                dimension_filters,
                validate_dimensions,
            } => {
                let metric_names = resolve_metric_names(&namespace, metrics.as_deref())?;
                let dimension_filters = dimension_filters
                    .iter()
                    .map(|spec| DimensionMatcher::parse(spec))
                    .collect::<Result<Vec<_>, _>>()?;
                ResourceConfig::Metrics {
                    namespace,
                    metric_names,
                    dimension_filters,
                    validate_dimensions,
                }
            }

            ResourceCommand::Streams { streams } => {
                let streams = match streams.as_deref() {
                    Some(list) => Some(split_names(list, "streams")?),
                    None => None,
                };
                ResourceConfig::Streams { streams }
            }
        };

        Ok(Self {
            connection: ConnectionConfig {
                endpoint: args.endpoint,
                access_key: args.access_key,
                secret_key: args.secret_key,
                region: args.region,
            },
            target_file: args.target_file,
            write_mode: if args.truncate {
                WriteMode::Truncate
            } else {
                WriteMode::Append
            },
            workers: args.workers,
            result_capacity: args.result_capacity,
            show_progress: !args.quiet,
            verbose: args.verbose,
            resource,
        })
    }
}

/// Resolve the metric-name work list: explicit names, or the namespace's
/// default table when the list is absent or the `.*` wildcard.
fn resolve_metric_names(
    namespace: &str,
    metrics: Option<&str>,
) -> Result<Vec<String>, ConfigError> {
    match metrics {
        Some(list) if !list.trim().is_empty() && list.trim() != ".*" => {
            split_names(list, "metrics")
        }
        _ => match metric_defaults::default_metric_names(namespace) {
            Some(names) => Ok(names.iter().map(|n| n.to_string()).collect()),
            None => Err(ConfigError::UnknownNamespace {
                namespace: namespace.to_string(),
            }),
        },
    }
}

fn split_names(list: &str, what: &str) -> Result<Vec<String>, ConfigError> {
    let names: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if names.is_empty() {
        return Err(ConfigError::EmptyList {
            name: what.to_string(),
        });
    }
    Ok(names)
}
