//! Report Module
//!
//! Final summary for a conversion run.

use crate::batch::RunCounters;
use std::time::Duration;

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

/// One-line summary: considered, OK, SKIP, ERR and deleted counts.
pub fn summary_line(counters: &RunCounters, elapsed: Duration) -> String {
    format!(
        "Conversion completed in {}. {} files considered, {} OK, {} SKIP, {} ERR, {} deleted.",
        format_duration(elapsed),
        counters.considered(),
        counters.converted,
        counters.skipped,
        counters.errored,
        counters.deleted
    )
}

pub fn log_summary(counters: &RunCounters, elapsed: Duration) {
    tracing::info!("{}", summary_line(counters, elapsed));
    if counters.errored > 0 {
        tracing::debug!(
            success_rate = counters.success_rate(),
            "Some files failed to convert"
        );
    }
}
