//! Record builder
//!
//! Joins a listing summary with its detail payload into a [`Vacancy`]. No I/O
//! happens here, so identical input always yields an identical record.

use crate::models::{DetailPayload, ItemSummary, Skill, Vacancy};
use std::collections::HashSet;

/// Builds a normalized vacancy from a summary and its detail payload
///
/// Returns `None` when the summary lacks a title or an employer name; such an
/// item is ineligible rather than broken.
///
/// # Example
///
/// ```
/// use hh_harvester::models::{build_vacancy, DetailPayload, ItemSummary, Lifecycle};
///
/// let summary = ItemSummary {
///     id: "42".to_string(),
///     title: Some("Rust Developer".to_string()),
///     company: Some("Acme".to_string()),
///     trusted: true,
///     lifecycle: Lifecycle::Open,
///     detail_url: None,
/// };
/// let detail = DetailPayload {
///     description: "\n\nWrite async code\n".to_string(),
///     skills: vec!["Rust".to_string(), "Tokio".to_string()],
/// };
///
/// let vacancy = build_vacancy(&summary, &detail).unwrap();
/// assert_eq!(vacancy.description, "Write async code");
/// assert_eq!(vacancy.skills[0].name, "rust");
/// ```
pub fn build_vacancy(summary: &ItemSummary, detail: &DetailPayload) -> Option<Vacancy> {
    let (title, company) = summary.headline()?;

    Some(Vacancy {
        internal_id: summary.id.clone(),
        company: company.trim().to_string(),
        carrier_position: title.trim().to_string(),
        description: normalize_description(&detail.description),
        skills: normalize_skills(&detail.skills),
    })
}

/// Strips blank leading and trailing lines and trailing whitespace per line
pub fn normalize_description(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().map(str::trim_end).collect();

    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());

    match (first, last) {
        // First line may carry indentation from the surrounding markup
        (Some(first), Some(last)) => lines[first..=last].join("\n").trim_start().to_string(),
        _ => String::new(),
    }
}

/// Lower-cases skill names, dropping empty and repeated ones
pub fn normalize_skills(raw: &[String]) -> Vec<Skill> {
    let mut seen = HashSet::new();

    raw.iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .map(Skill::new)
        .collect()
}
