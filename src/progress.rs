//! Progress reporting for snapshot runs
//!
//! Provides a lightweight spinner while collection is running and a styled
//! summary once a run finishes.

use crate::collector::SnapshotSummary;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a run is in flight
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Print a header before the run starts
pub fn print_header(resource: &str, workers: usize, target: &str) {
    eprintln!(
        "{} {} -> {} ({} workers)",
        style("Snapshotting").bold().green(),
        resource,
        target,
        workers
    );
}

/// Print a summary of the completed run
pub fn print_summary(summary: &SnapshotSummary, target: &str) {
    let secs = summary.elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        summary.records_written as f64 / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("{}", style("Snapshot complete").bold().green());
    eprintln!(
        "  Records:   {} ({:.0}/s)",
        format_number(summary.records_written),
        rate
    );
    eprintln!(
        "  Units:     {} collected, {} failed",
        summary.units, summary.failed_units
    );
    if summary.records_skipped > 0 || summary.records_filtered > 0 {
        eprintln!(
            "  Dropped:   {} filtered, {} malformed",
            format_number(summary.records_filtered),
            format_number(summary.records_skipped)
        );
    }
    eprintln!("  Elapsed:   {:.2}s", secs);
    eprintln!("  Output:    {}", target);
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
