//! Extraction logic for listing and detail documents
//!
//! This module turns raw responses into domain types:
//! - the `HH*InitialState` data island embedded in search result pages
//! - API listing and detail JSON
//! - skill tags and description text from rendered vacancy pages

use crate::harvester::source::ListingPage;
use crate::models::{DetailPayload, ItemSummary, Lifecycle};
use crate::HarvestError;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Deserialize;
use std::sync::OnceLock;

/// Attribute marker of skill tags on a vacancy page
const SKILL_TAG_SELECTOR: &str = "[data-qa='bloko-tag__text']";

/// Attribute marker of description containers on a vacancy page
const DESCRIPTION_SELECTOR: &str = "[data-qa='vacancy-description']";

/// Elements that may carry the embedded search state
const DATA_ISLAND_SELECTOR: &str = "template[id], script[id]";

fn data_island_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"HH.*InitialState").expect("static regex is valid"))
}

/// External identifier as found in JSON: hh.ru uses both numbers and strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ExternalId {
    Number(u64),
    Text(String),
}

impl ExternalId {
    fn into_string(self) -> Option<String> {
        match self {
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Self::Text(_) => None,
        }
    }
}

fn first_page() -> u32 {
    1
}

fn trusted_by_default() -> bool {
    true
}

// ===== Search page data island =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitialState {
    #[serde(default)]
    vacancy_search_result: Option<SearchResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(default)]
    vacancies: Option<Vec<IslandVacancy>>,
    #[serde(default)]
    paging: Option<Paging>,
    #[serde(default)]
    total_results: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paging {
    #[serde(default)]
    last_page: Option<PageRef>,
}

#[derive(Debug, Deserialize)]
struct PageRef {
    #[serde(default = "first_page")]
    page: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IslandVacancy {
    #[serde(default)]
    vacancy_id: Option<ExternalId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    lifecycle: Option<String>,
    #[serde(default)]
    company: Option<IslandCompany>,
}

#[derive(Debug, Deserialize)]
struct IslandCompany {
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "trusted_by_default", rename = "@trusted")]
    trusted: bool,
}

/// Listing extracted from a search results page
#[derive(Debug, Clone)]
pub struct SearchState {
    pub page: ListingPage,

    /// Total number of matches, when the page reports it
    pub total_results: Option<u64>,
}

/// Finds the text of the first `HH*InitialState` data island
pub fn find_data_island(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(DATA_ISLAND_SELECTOR).ok()?;

    document
        .select(&selector)
        .find(|element| {
            element
                .value()
                .attr("id")
                .is_some_and(|id| data_island_pattern().is_match(id))
        })
        .map(|element| element.text().collect::<String>())
}

/// Parses a rendered search results page
///
/// `details_endpoint` is the prefix each vacancy id is appended to.
///
/// # Returns
///
/// * `Ok(SearchState)` - Items and paging found in the data island
/// * `Err(HarvestError::UpstreamFormatChanged)` - Island missing or not valid JSON
pub fn parse_search_page(html: &str, details_endpoint: &str) -> Result<SearchState, HarvestError> {
    let island = find_data_island(html).ok_or_else(|| {
        HarvestError::UpstreamFormatChanged(
            "search page has no HH*InitialState element".to_string(),
        )
    })?;

    let state: InitialState = serde_json::from_str(island.trim()).map_err(|e| {
        HarvestError::UpstreamFormatChanged(format!(
            "could not parse vacancies json from data island: {}",
            e
        ))
    })?;

    let result = state.vacancy_search_result.unwrap_or_default();
    let last_page = result
        .paging
        .and_then(|paging| paging.last_page)
        .map(|last| last.page)
        .unwrap_or(1);

    let items = result
        .vacancies
        .unwrap_or_default()
        .into_iter()
        .filter_map(|vacancy| {
            let id = vacancy.vacancy_id.and_then(ExternalId::into_string)?;
            let (company, trusted) = match vacancy.company {
                Some(company) => (company.name, company.trusted),
                None => (None, true),
            };
            Some(ItemSummary {
                detail_url: Some(format!("{}{}", details_endpoint, id)),
                id,
                title: vacancy.name,
                company,
                trusted,
                lifecycle: Lifecycle::from_listing_type(vacancy.lifecycle.as_deref()),
            })
        })
        .collect();

    Ok(SearchState {
        page: ListingPage { items, last_page },
        total_results: result.total_results,
    })
}

// ===== API payloads =====

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    found: u64,
    #[serde(default = "first_page")]
    pages: u32,
    #[serde(default)]
    items: Vec<ApiItem>,
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    #[serde(default)]
    id: Option<ExternalId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    employer: Option<ApiEmployer>,
}

#[derive(Debug, Deserialize)]
struct ApiEmployer {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    trusted: bool,
}

#[derive(Debug, Deserialize)]
struct ApiDetail {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    key_skills: Vec<ApiSkill>,
}

#[derive(Debug, Deserialize)]
struct ApiSkill {
    #[serde(default)]
    name: Option<String>,
}

/// Listing decoded from the JSON search endpoint
#[derive(Debug, Clone)]
pub struct ApiListing {
    pub page: ListingPage,

    /// Total number of matches across all pages
    pub found: u64,
}

/// Decodes an API listing response
pub fn parse_api_listing(body: &str, url: &str) -> Result<ApiListing, HarvestError> {
    let response: ApiSearchResponse =
        serde_json::from_str(body).map_err(|source| HarvestError::Decode {
            url: url.to_string(),
            source,
        })?;

    let items = response
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.and_then(ExternalId::into_string)?;
            let (company, trusted) = match item.employer {
                Some(employer) => (employer.name, employer.trusted),
                None => (None, false),
            };
            Some(ItemSummary {
                id,
                title: item.name,
                company,
                trusted,
                lifecycle: if item.archived {
                    Lifecycle::Archived
                } else {
                    Lifecycle::Open
                },
                detail_url: item.url.filter(|u| !u.trim().is_empty()),
            })
        })
        .collect();

    Ok(ApiListing {
        page: ListingPage {
            items,
            last_page: response.pages,
        },
        found: response.found,
    })
}

/// Decodes an API vacancy resource; skills without a name are dropped
pub fn parse_api_detail(body: &str, url: &str) -> Result<DetailPayload, HarvestError> {
    let detail: ApiDetail = serde_json::from_str(body).map_err(|source| HarvestError::Decode {
        url: url.to_string(),
        source,
    })?;

    Ok(DetailPayload {
        description: detail.description.unwrap_or_default(),
        skills: detail
            .key_skills
            .into_iter()
            .filter_map(|skill| skill.name)
            .filter(|name| !name.is_empty())
            .collect(),
    })
}

// ===== Rendered vacancy page =====

/// Extracts skill tags and description from a rendered vacancy page
pub fn parse_vacancy_page(html: &str) -> DetailPayload {
    let document = Html::parse_document(html);
    DetailPayload {
        description: extract_description(&document),
        skills: extract_skill_tags(&document),
    }
}

fn extract_skill_tags(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(SKILL_TAG_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .collect()
}

/// Concatenates description containers, one line per direct child node
///
/// Whitespace-only text between blocks becomes an empty line, which keeps
/// paragraphs apart; the record builder trims the outer ones.
fn extract_description(document: &Html) -> String {
    let Ok(selector) = Selector::parse(DESCRIPTION_SELECTOR) else {
        return String::new();
    };

    let mut lines = Vec::new();
    for container in document.select(&selector) {
        for child in container.children() {
            let text = match child.value() {
                Node::Text(text) => text.trim().to_string(),
                Node::Element(_) => ElementRef::wrap(child)
                    .map(|element| element.text().collect::<String>())
                    .unwrap_or_default(),
                _ => continue,
            };
            lines.push(text.trim().to_string());
        }
    }

    lines.join("\n")
}
