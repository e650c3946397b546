//! Statistics generation from the vacancy database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::output::run_duration_seconds;
use crate::storage::{RunRecord, VacancyStore};
use crate::HarvestError;
use std::fmt::Write;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Vacancies currently stored
    pub total_vacancies: u64,

    /// Distinct skill names across stored vacancies
    pub distinct_skills: u64,

    /// Most frequent skills with their vacancy counts
    pub top_skills: Vec<(String, u64)>,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `top_n` - How many of the most frequent skills to include
pub fn load_statistics(
    storage: &dyn VacancyStore,
    top_n: usize,
) -> Result<HarvestStatistics, HarvestError> {
    Ok(HarvestStatistics {
        total_vacancies: storage.count_vacancies()?,
        distinct_skills: storage.count_skills()?,
        top_skills: storage.top_skills(top_n)?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Renders statistics as a plain-text report
pub fn render_statistics(stats: &HarvestStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Harvest Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Vacancies stored: {}", stats.total_vacancies);
    let _ = writeln!(out, "  Distinct skills: {}", stats.distinct_skills);
    let _ = writeln!(out);

    if !stats.top_skills.is_empty() {
        let _ = writeln!(out, "Top Skills:");
        for (name, count) in &stats.top_skills {
            let percentage = if stats.total_vacancies > 0 {
                (*count as f64 / stats.total_vacancies as f64) * 100.0
            } else {
                0.0
            };
            let _ = writeln!(out, "  {}: {} ({:.1}%)", name, count, percentage);
        }
        let _ = writeln!(out);
    }

    match &stats.latest_run {
        Some(run) => {
            let _ = writeln!(out, "Last Run:");
            let _ = writeln!(out, "  ID: {}", run.id);
            let _ = writeln!(out, "  Query: {} ({})", run.query, run.source);
            let _ = writeln!(out, "  Status: {}", run.status.to_db_string());
            let _ = writeln!(out, "  Started: {}", run.started_at);
            if let Some(seconds) = run_duration_seconds(run) {
                let _ = writeln!(out, "  Duration: {}s", seconds);
            }
            let _ = writeln!(out, "  Vacancies: {}", run.vacancy_count);
        }
        None => {
            let _ = writeln!(out, "No harvest runs recorded yet.");
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    print!("{}", render_statistics(stats));
}
