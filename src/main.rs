//! cloudsnap - Cloud Resource Metadata Snapshot Tool
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use cloudsnap::config::{CliArgs, ResourceConfig, SnapConfig};
use cloudsnap::progress::{print_header, print_summary, ProgressReporter};
use cloudsnap::resources::{MetricSnapper, ObjectSnapper, StreamSnapper};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = SnapConfig::from_args(args).context("Invalid configuration")?;

    // Print header
    if config.show_progress {
        print_header(
            &resource_label(&config.resource),
            config.workers,
            &config.target_file.display().to_string(),
        );
    }

    let progress = if config.show_progress {
        Some(ProgressReporter::new())
    } else {
        None
    };

    if let Some(ref p) = progress {
        p.set_status("Collecting metadata...");
    }

    let result = match &config.resource {
        ResourceConfig::Objects {
            bucket,
            prefix,
            policy,
        } => ObjectSnapper::new(&config, bucket, prefix, policy.clone()).snap(),
        ResourceConfig::Metrics {
            namespace,
            metric_names,
            dimension_filters,
            validate_dimensions,
        } => MetricSnapper::new(
            &config,
            namespace,
            metric_names,
            dimension_filters,
            *validate_dimensions,
        )
        .snap(),
        ResourceConfig::Streams { streams } => {
            StreamSnapper::new(&config, streams.as_deref()).snap()
        }
    };

    let summary = match result {
        Ok(summary) => {
            if let Some(ref p) = progress {
                p.finish_and_clear();
            }
            summary
        }
        Err(e) => {
            if let Some(ref p) = progress {
                p.finish("Collection failed");
            }
            return Err(e).context("Snapshot run failed");
        }
    };

    if config.show_progress {
        print_summary(&summary, &config.target_file.display().to_string());
    }

    Ok(())
}

fn resource_label(resource: &ResourceConfig) -> String {
    match resource {
        ResourceConfig::Objects { bucket, prefix, .. } => {
            if prefix.is_empty() {
                format!("objects in {bucket}")
            } else {
                format!("objects in {bucket}/{prefix}")
            }
        }
        ResourceConfig::Metrics { namespace, .. } => format!("metrics in {namespace}"),
        ResourceConfig::Streams { .. } => "streams".to_string(),
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("cloudsnap=debug,warn")
    } else {
        EnvFilter::new("cloudsnap=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
