//! Detail fan-out
//!
//! Resolves the admitted items of one page concurrently. Each item is
//! fetched under its own retry policy, so one failing item never cancels its
//! siblings. The returned batch is only available once every item settled.

use crate::harvester::retry::RetryPolicy;
use crate::harvester::source::{DetailFetch, VacancySource};
use crate::models::{build_vacancy, ItemSummary, Vacancy};
use crate::HarvestError;
use futures::stream::{self, StreamExt};

/// Settled result of one item's detail fetch
#[derive(Debug)]
pub enum DetailOutcome {
    /// A complete record
    Built(Vacancy),

    /// Ineligible at detail time; no record, no error
    Skipped { id: String },

    /// Fetch or parse failed after retries
    Failed { id: String, error: HarvestError },
}

/// Fetches, parses and builds every item, at most `concurrency` at a time
///
/// Outcomes come back in completion order, not listing order.
pub async fn resolve_details(
    source: &dyn VacancySource,
    items: Vec<ItemSummary>,
    retry: &RetryPolicy,
    concurrency: usize,
) -> Vec<DetailOutcome> {
    let pending: Vec<_> = items
        .into_iter()
        .map(|item| resolve_item(source, item, retry))
        .collect();

    stream::iter(pending)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}

async fn resolve_item(
    source: &dyn VacancySource,
    item: ItemSummary,
    retry: &RetryPolicy,
) -> DetailOutcome {
    let target = &item;
    let fetched = retry.run(|| source.fetch_detail(target)).await;
    let document = match fetched {
        Ok(DetailFetch::Document(document)) => document,
        Ok(DetailFetch::Skipped) => return DetailOutcome::Skipped { id: item.id },
        Err(error) => return DetailOutcome::Failed { id: item.id, error },
    };

    let payload = match source.parse_detail(&item, &document) {
        Ok(payload) => payload,
        Err(error) => return DetailOutcome::Failed { id: item.id, error },
    };

    match build_vacancy(&item, &payload) {
        Some(vacancy) => {
            tracing::info!("Discovered vacancy {}", vacancy);
            DetailOutcome::Built(vacancy)
        }
        None => {
            tracing::warn!("Vacancy {} has no title or company, ignoring", item.id);
            DetailOutcome::Skipped { id: item.id }
        }
    }
}
