//! In-process source used by the harvester unit tests

use crate::harvester::source::{
    DetailFailurePolicy, DetailFetch, ListingPage, SourceKind, VacancySource,
};
use crate::models::{DetailPayload, ItemSummary, Lifecycle};
use crate::HarvestError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Scripted response for one listing page
#[derive(Debug, Clone)]
pub enum FakeListing {
    Page(ListingPage),
    NoResults,
    FormatChanged,
    /// Fails with a 503 for the first `n` requests of the page, then serves it
    FailThen(u32, ListingPage),
}

/// Scripted behaviour of one item's detail fetch
#[derive(Debug, Clone)]
pub enum FakeDetail {
    Document(String),
    Timeout,
    FailThenDocument(u32, String),
}

pub struct FakeSource {
    kind: SourceKind,
    listings: Vec<FakeListing>,
    details: HashMap<String, FakeDetail>,
    listing_calls: Mutex<Vec<u32>>,
    detail_calls: Mutex<HashMap<String, u32>>,
}

impl FakeSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            listings: Vec::new(),
            details: HashMap::new(),
            listing_calls: Mutex::new(Vec::new()),
            detail_calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_flaky_page(mut self, failures: u32, items: Vec<ItemSummary>, last_page: u32) -> Self {
        self.listings.push(FakeListing::FailThen(
            failures,
            ListingPage { items, last_page },
        ));
        self
    }

    pub fn with_page(mut self, items: Vec<ItemSummary>, last_page: u32) -> Self {
        self.listings
            .push(FakeListing::Page(ListingPage { items, last_page }));
        self
    }

    pub fn with_listing(mut self, listing: FakeListing) -> Self {
        self.listings.push(listing);
        self
    }

    pub fn with_detail(mut self, id: &str, detail: FakeDetail) -> Self {
        self.details.insert(id.to_string(), detail);
        self
    }

    /// Pages requested so far, in request order
    pub fn listing_calls(&self) -> Vec<u32> {
        self.listing_calls.lock().unwrap().clone()
    }

    pub fn detail_calls(&self, id: &str) -> u32 {
        self.detail_calls
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl VacancySource for FakeSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch_listing(
        &self,
        query: &str,
        page: u32,
        _page_size: usize,
    ) -> Result<ListingPage, HarvestError> {
        let attempt = {
            let mut calls = self.listing_calls.lock().unwrap();
            calls.push(page);
            calls.iter().filter(|p| **p == page).count() as u32
        };

        match self.listings.get(page as usize) {
            Some(FakeListing::Page(listing)) => Ok(listing.clone()),
            Some(FakeListing::FailThen(failures, listing)) if attempt > *failures => {
                Ok(listing.clone())
            }
            Some(FakeListing::FailThen(..)) => Err(HarvestError::Status {
                url: format!("fake://search?page={}", page),
                status: 503,
            }),
            Some(FakeListing::NoResults) => {
                Err(HarvestError::NoSearchResults(format!("nothing for {}", query)))
            }
            Some(FakeListing::FormatChanged) | None => Err(
                HarvestError::UpstreamFormatChanged(format!("no page {}", page)),
            ),
        }
    }

    fn admits(&self, item: &ItemSummary) -> bool {
        match self.kind {
            SourceKind::Api => true,
            SourceKind::Html => {
                item.lifecycle.is_open() && item.trusted && item.headline().is_some()
            }
        }
    }

    async fn fetch_detail(&self, item: &ItemSummary) -> Result<DetailFetch, HarvestError> {
        let attempt = {
            let mut calls = self.detail_calls.lock().unwrap();
            let count = calls.entry(item.id.clone()).or_insert(0);
            *count += 1;
            *count
        };

        if self.kind == SourceKind::Api && !item.trusted {
            return Ok(DetailFetch::Skipped);
        }

        let url = format!("fake://vacancy/{}", item.id);
        match self.details.get(&item.id) {
            Some(FakeDetail::Document(body)) => Ok(DetailFetch::Document(body.clone())),
            Some(FakeDetail::FailThenDocument(failures, body)) if attempt > *failures => {
                Ok(DetailFetch::Document(body.clone()))
            }
            Some(FakeDetail::FailThenDocument(..)) => Err(HarvestError::Status { url, status: 503 }),
            Some(FakeDetail::Timeout) => Err(HarvestError::Timeout { url }),
            None => Ok(DetailFetch::Document(format!("description of {}", item.id))),
        }
    }

    fn parse_detail(
        &self,
        _item: &ItemSummary,
        document: &str,
    ) -> Result<DetailPayload, HarvestError> {
        Ok(DetailPayload {
            description: document.to_string(),
            skills: vec!["Rust".to_string()],
        })
    }

    fn detail_failure_policy(&self) -> DetailFailurePolicy {
        match self.kind {
            SourceKind::Api => DetailFailurePolicy::Drop,
            SourceKind::Html => DetailFailurePolicy::Fatal,
        }
    }
}

/// Open listing item with a title and employer
pub fn summary(id: &str, trusted: bool) -> ItemSummary {
    ItemSummary {
        id: id.to_string(),
        title: Some(format!("Position {}", id)),
        company: Some("Acme".to_string()),
        trusted,
        lifecycle: Lifecycle::Open,
        detail_url: Some(format!("fake://vacancy/{}", id)),
    }
}
