//! HTML-scrape source variant
//!
//! Lists vacancies by reading the data island embedded in the rendered search
//! page, and fetches each vacancy's rendered page for skills and description.
//! Archived, untrusted or incomplete listing items are filtered before any
//! detail request. Vacancy pages are expected to be well-formed, so a detail
//! fetch that keeps failing ends the run. A search page that looks empty is
//! retried once before the run gives up.

use crate::harvester::fetcher::fetch_text;
use crate::harvester::parser::{parse_search_page, parse_vacancy_page};
use crate::harvester::retry::{RetryPolicy, TRANSIENT_KINDS};
use crate::harvester::source::{
    DetailFailurePolicy, DetailFetch, ListingPage, SourceKind, VacancySource,
};
use crate::models::{DetailPayload, ItemSummary};
use crate::{ErrorKind, HarvestError};
use async_trait::async_trait;
use reqwest::Client;

/// An empty-looking search page gets one more try before the run ends
const EMPTY_PAGE_ATTEMPTS: u32 = 2;

pub struct HtmlSource {
    client: Client,
    search_endpoint: String,
    details_endpoint: String,
}

impl HtmlSource {
    pub fn new(
        client: Client,
        search_endpoint: impl Into<String>,
        details_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            search_endpoint: search_endpoint.into(),
            details_endpoint: details_endpoint.into(),
        }
    }

    fn search_params(query: &str, page: u32, page_size: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("no_magic", "true".to_string()),
            ("L_save_area", "false".to_string()),
            ("text", query.to_string()),
            ("excluded_text", String::new()),
            ("salary", String::new()),
            ("currency_code", "RUR".to_string()),
            ("experience", "doesNotMatter".to_string()),
            ("order_by", "relevance".to_string()),
            ("search_period", "0".to_string()),
            ("items_on_page", page_size.to_string()),
            ("disableBrowserCache", "true".to_string()),
        ];
        if page > 0 {
            params.push(("page", page.to_string()));
        }
        params
    }
}

#[async_trait]
impl VacancySource for HtmlSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Html
    }

    async fn fetch_listing(
        &self,
        query: &str,
        page: u32,
        page_size: usize,
    ) -> Result<ListingPage, HarvestError> {
        let params = Self::search_params(query, page, page_size);

        let body = match fetch_text(&self.client, &self.search_endpoint, &params).await {
            Ok(body) => body,
            Err(HarvestError::Status { url, status: 404 }) => {
                return Err(HarvestError::UpstreamFormatChanged(format!(
                    "search url is no longer valid: {}",
                    url
                )));
            }
            Err(e) => return Err(e),
        };

        let state = parse_search_page(&body, &self.details_endpoint)?;

        if state.page.items.is_empty() && state.total_results == Some(0) {
            return Err(HarvestError::NoSearchResults(format!(
                "search page reports no vacancies for '{}'",
                query
            )));
        }

        tracing::debug!(
            "Search page {} listed {} items (last page {})",
            page,
            state.page.items.len(),
            state.page.last_page
        );
        Ok(state.page)
    }

    fn admits(&self, item: &ItemSummary) -> bool {
        if !item.lifecycle.is_open() || !item.trusted {
            tracing::warn!(
                "Vacancy {:?} from {:?} is ignored since it is in archive or company is untrusted",
                item.title,
                item.company
            );
            return false;
        }

        if item.headline().is_none() {
            tracing::warn!("Vacancy {} search result has an invalid shape", item.id);
            return false;
        }

        true
    }

    async fn fetch_detail(&self, item: &ItemSummary) -> Result<DetailFetch, HarvestError> {
        let url = match item.detail_url.as_deref() {
            Some(url) => url.to_string(),
            None => format!("{}{}", self.details_endpoint, item.id),
        };

        let body = fetch_text(&self.client, &url, &[]).await?;
        Ok(DetailFetch::Document(body))
    }

    fn parse_detail(
        &self,
        _item: &ItemSummary,
        document: &str,
    ) -> Result<DetailPayload, HarvestError> {
        Ok(parse_vacancy_page(document))
    }

    fn detail_failure_policy(&self) -> DetailFailurePolicy {
        DetailFailurePolicy::Fatal
    }

    fn listing_retry(&self, base: &RetryPolicy) -> RetryPolicy {
        let mut kinds = TRANSIENT_KINDS.to_vec();
        kinds.push(ErrorKind::NoSearchResults);
        base.clone()
            .retrying(&kinds)
            .capping(ErrorKind::NoSearchResults, EMPTY_PAGE_ATTEMPTS)
    }
}
