//! API source variant
//!
//! Lists vacancies through the public JSON endpoint and fetches each
//! vacancy's own resource URL. Trust and URL preconditions are checked at
//! detail time; a failing item is dropped and its cap slot returned.

use crate::harvester::fetcher::fetch_text;
use crate::harvester::parser::{parse_api_detail, parse_api_listing};
use crate::harvester::source::{
    DetailFailurePolicy, DetailFetch, ListingPage, SourceKind, VacancySource,
};
use crate::models::{DetailPayload, ItemSummary};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;

pub struct ApiSource {
    client: Client,
    endpoint: String,
}

impl ApiSource {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl VacancySource for ApiSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Api
    }

    async fn fetch_listing(
        &self,
        query: &str,
        page: u32,
        page_size: usize,
    ) -> Result<ListingPage, HarvestError> {
        let mut params = vec![
            ("per_page", page_size.to_string()),
            ("text", query.to_string()),
        ];
        if page > 0 {
            params.push(("page", page.to_string()));
        }

        let body = fetch_text(&self.client, &self.endpoint, &params).await?;
        let listing = parse_api_listing(&body, &self.endpoint)?;

        if listing.found == 0 {
            return Err(HarvestError::NoSearchResults(format!(
                "API found no vacancies for '{}'",
                query
            )));
        }

        tracing::debug!(
            "API page {} listed {} items ({} found in total)",
            page,
            listing.page.items.len(),
            listing.found
        );
        Ok(listing.page)
    }

    fn admits(&self, _item: &ItemSummary) -> bool {
        true
    }

    async fn fetch_detail(&self, item: &ItemSummary) -> Result<DetailFetch, HarvestError> {
        let url = match item.detail_url.as_deref() {
            Some(url) if item.trusted => url,
            _ => {
                tracing::warn!(
                    "Vacancy {:?} from {:?} is ignored since it has no url or company is untrusted",
                    item.title,
                    item.company
                );
                return Ok(DetailFetch::Skipped);
            }
        };

        if item.headline().is_none() {
            tracing::warn!("Vacancy {} has no title or company, ignoring", item.id);
            return Ok(DetailFetch::Skipped);
        }

        let body = fetch_text(&self.client, url, &[]).await?;
        Ok(DetailFetch::Document(body))
    }

    fn parse_detail(
        &self,
        item: &ItemSummary,
        document: &str,
    ) -> Result<DetailPayload, HarvestError> {
        let url = item.detail_url.as_deref().unwrap_or(&self.endpoint);
        parse_api_detail(document, url)
    }

    fn detail_failure_policy(&self) -> DetailFailurePolicy {
        DetailFailurePolicy::Drop
    }
}
