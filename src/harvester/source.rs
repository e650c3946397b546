//! Source strategy interface
//!
//! The API and HTML variants share the outer pagination, dedup and cap
//! skeleton; they differ only in how a listing page is fetched and parsed,
//! which items are admitted at listing time, how a detail response is
//! parsed, and what happens when a detail fetch keeps failing.

use crate::models::{DetailPayload, ItemSummary};
use crate::harvester::retry::RetryPolicy;
use crate::HarvestError;
use async_trait::async_trait;

/// Which source variant a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Api,
    Html,
}

impl SourceKind {
    pub fn from_use_api(use_api: bool) -> Self {
        if use_api {
            Self::Api
        } else {
            Self::Html
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Html => "html",
        }
    }
}

/// One fetched listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Item summaries in listing order
    pub items: Vec<ItemSummary>,

    /// Last page number as reported by this very page
    pub last_page: u32,
}

/// Outcome of the transport half of a detail fetch
#[derive(Debug, Clone)]
pub enum DetailFetch {
    /// Raw detail document, ready for `parse_detail`
    Document(String),

    /// The item is ineligible; no record and no error
    Skipped,
}

/// What a run does with a detail fetch that failed after retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailFailurePolicy {
    /// Drop the item and give its cap slot back
    Drop,

    /// Terminate the whole run with the error
    Fatal,
}

/// Capability set of a source variant
#[async_trait]
pub trait VacancySource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetches and parses one listing page
    async fn fetch_listing(
        &self,
        query: &str,
        page: u32,
        page_size: usize,
    ) -> Result<ListingPage, HarvestError>;

    /// Listing-time eligibility; ineligible items never reach the seen-set
    fn admits(&self, item: &ItemSummary) -> bool;

    /// Fetches the raw detail document for an admitted item
    async fn fetch_detail(&self, item: &ItemSummary) -> Result<DetailFetch, HarvestError>;

    /// Extracts description and skills from an item's detail document
    fn parse_detail(
        &self,
        item: &ItemSummary,
        document: &str,
    ) -> Result<DetailPayload, HarvestError>;

    fn detail_failure_policy(&self) -> DetailFailurePolicy;

    /// Retry policy for one listing fetch, derived from the run's policy
    fn listing_retry(&self, base: &RetryPolicy) -> RetryPolicy {
        base.clone()
    }
}
