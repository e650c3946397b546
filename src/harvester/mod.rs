//! Harvester module for vacancy listing and detail retrieval
//!
//! This module contains the core ingestion logic, including:
//! - HTTP fetching with browser-like headers and timeouts
//! - Listing and detail extraction for both source variants
//! - Pagination, dedup and cap enforcement
//! - Concurrent detail fan-out with retries
//! - Overall run coordination behind a lazy stream

mod admission;
mod api;
mod coordinator;
mod fanout;
mod fetcher;
mod html;
mod pagination;
mod parser;
mod retry;
mod source;

#[cfg(test)]
mod testing;

pub use admission::{Admission, AdmissionControl};
pub use api::ApiSource;
pub use coordinator::{build_source, HarvestOutcome, Harvester, SearchQuery, VacancyStream};
pub use fanout::{resolve_details, DetailOutcome};
pub use fetcher::{browser_headers, build_http_client, fetch_text};
pub use html::HtmlSource;
pub use pagination::{PageCursor, Pagination};
pub use parser::{find_data_island, parse_search_page, parse_vacancy_page};
pub use retry::{RetryPolicy, TRANSIENT_KINDS};
pub use source::{DetailFailurePolicy, DetailFetch, ListingPage, SourceKind, VacancySource};

use crate::config::Config;
use crate::HarvestError;

/// Starts a run configured from `config`
///
/// This is the main entry point for harvesting. It will:
/// 1. Build the HTTP client and the source variant `query.source` selects
/// 2. Set up the retry policy and detail concurrency
/// 3. Spawn the run and hand back its vacancy stream
///
/// Must be called within a Tokio runtime.
pub fn each_vacancy(config: &Config, query: SearchQuery) -> Result<VacancyStream, HarvestError> {
    let harvester = Harvester::from_config(config, query.source)?;
    Ok(harvester.each_vacancy(query))
}
