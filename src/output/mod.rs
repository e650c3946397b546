//! Output module for reporting harvest results
//!
//! This module handles:
//! - Loading aggregate statistics from the datastore
//! - Rendering them for the `--stats` mode

pub mod stats;

pub use stats::{load_statistics, print_statistics, render_statistics, HarvestStatistics};

use crate::storage::RunRecord;
use chrono::{DateTime, Utc};

/// Wall-clock duration of a finished run, in seconds
pub fn run_duration_seconds(run: &RunRecord) -> Option<u64> {
    let started = run.started_at.parse::<DateTime<Utc>>().ok()?;
    let finished = run.finished_at.as_ref()?.parse::<DateTime<Utc>>().ok()?;
    let seconds = (finished - started).num_seconds();
    u64::try_from(seconds).ok()
}
