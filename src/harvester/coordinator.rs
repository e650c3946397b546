//! Harvest coordinator - main run orchestration logic
//!
//! A run is driven by a single producer task that:
//! - Advances the pagination controller one listing page at a time
//! - Records the last page each fetched page reports
//! - Admits eligible, unseen items until the cap is reached
//! - Resolves the admitted items concurrently and waits for all of them
//! - Sends the page's records into a bounded channel the caller drains
//!
//! Pages are processed strictly in order; records within a page come out in
//! completion order.

use crate::config::{Config, SearchConfig};
use crate::harvester::admission::AdmissionControl;
use crate::harvester::api::ApiSource;
use crate::harvester::fanout::{resolve_details, DetailOutcome};
use crate::harvester::fetcher::build_http_client;
use crate::harvester::html::HtmlSource;
use crate::harvester::pagination::Pagination;
use crate::harvester::retry::RetryPolicy;
use crate::harvester::source::{DetailFailurePolicy, SourceKind, VacancySource};
use crate::models::Vacancy;
use crate::HarvestError;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

const DEFAULT_DETAIL_CONCURRENCY: usize = 10;

/// Parameters of one run; immutable once the run starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text search query
    pub text: String,

    /// Maximum number of vacancies the run may emit
    pub limit: usize,

    /// Listing items requested per page
    pub page_size: usize,

    /// Source variant selector
    pub source: SourceKind,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, limit: usize, page_size: usize, source: SourceKind) -> Self {
        Self {
            text: text.into(),
            limit,
            page_size,
            source,
        }
    }

    pub fn from_config(config: &SearchConfig, source: SourceKind) -> Self {
        Self::new(config.query.clone(), config.limit, config.prefetch, source)
    }
}

/// Builds the source variant selected by `kind`
pub fn build_source(
    config: &Config,
    kind: SourceKind,
) -> Result<Arc<dyn VacancySource>, HarvestError> {
    let client = build_http_client(config.provider.request_timeout())?;
    let source: Arc<dyn VacancySource> = match kind {
        SourceKind::Api => Arc::new(ApiSource::new(client, &config.provider.api_endpoint)),
        SourceKind::Html => Arc::new(HtmlSource::new(
            client,
            &config.provider.search_endpoint,
            &config.provider.vacancy_details_endpoint,
        )),
    };
    Ok(source)
}

/// Entry point for runs against one source
pub struct Harvester {
    source: Arc<dyn VacancySource>,
    retry: RetryPolicy,
    detail_concurrency: usize,
}

impl Harvester {
    pub fn new(source: Arc<dyn VacancySource>, retry: RetryPolicy) -> Self {
        Self {
            source,
            retry,
            detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
        }
    }

    /// Builds the harvester for `kind` from configuration
    pub fn from_config(config: &Config, kind: SourceKind) -> Result<Self, HarvestError> {
        let source = build_source(config, kind)?;
        Ok(Self::new(source, RetryPolicy::from_config(&config.retry))
            .with_detail_concurrency(config.provider.detail_concurrency))
    }

    pub fn with_detail_concurrency(mut self, concurrency: usize) -> Self {
        self.detail_concurrency = concurrency.max(1);
        self
    }

    /// Starts a fresh run and returns the stream of its vacancies
    ///
    /// Every call starts from page 0 with an empty seen-set. The stream ends
    /// after the last record, or with one `Err` when the run fails. Must be
    /// called within a Tokio runtime.
    pub fn each_vacancy(&self, query: SearchQuery) -> VacancyStream {
        if query.source != self.source.kind() {
            tracing::warn!(
                "Query asks for the {} source but this harvester is bound to {}",
                query.source.as_str(),
                self.source.kind().as_str()
            );
        }

        let (tx, rx) = mpsc::channel(query.page_size.max(1));
        let run = HarvestRun {
            source: Arc::clone(&self.source),
            retry: self.retry.clone(),
            detail_concurrency: self.detail_concurrency,
            query,
        };

        tokio::spawn(async move {
            match run.execute(&tx).await {
                Ok(stats) => tracing::info!(
                    "Harvest finished: {} vacancies from {} pages",
                    stats.emitted,
                    stats.pages
                ),
                Err(e) => {
                    tracing::error!("Harvest terminated: {}", e);
                    let _ = tx.send(Err(e)).await;
                }
            }
        });

        VacancyStream { rx }
    }
}

#[derive(Debug, Default)]
struct RunStats {
    pages: u32,
    emitted: usize,
}

/// State owned by the producer task of one run
struct HarvestRun {
    source: Arc<dyn VacancySource>,
    retry: RetryPolicy,
    detail_concurrency: usize,
    query: SearchQuery,
}

impl HarvestRun {
    async fn execute(
        self,
        tx: &mpsc::Sender<Result<Vacancy, HarvestError>>,
    ) -> Result<RunStats, HarvestError> {
        let source: &dyn VacancySource = self.source.as_ref();
        let listing_retry = source.listing_retry(&self.retry);
        let pagination = Pagination::new(self.query.page_size);
        let mut admission = AdmissionControl::new(self.query.limit);
        let mut stats = RunStats::default();

        let text = self.query.text.as_str();
        let listing_retry = &listing_retry;

        while !pagination.done().await && !admission.is_full() {
            let page = pagination
                .next(|page, size| async move {
                    listing_retry
                        .run(|| source.fetch_listing(text, page, size))
                        .await
                })
                .await?;
            pagination.set_last_page(page.last_page).await;
            stats.pages += 1;

            let listed = page.items.len();
            let batch = admission.admit_page(source, page.items);
            tracing::info!(
                "Page {}: {} listed, {} admitted, {}/{} slots used",
                pagination.cursor().await.current_page - 1,
                listed,
                batch.len(),
                admission.admitted(),
                self.query.limit
            );

            let outcomes =
                resolve_details(source, batch, &self.retry, self.detail_concurrency).await;

            let mut records = Vec::with_capacity(outcomes.len());
            for outcome in outcomes {
                match outcome {
                    DetailOutcome::Built(vacancy) => records.push(vacancy),
                    DetailOutcome::Skipped { .. } => admission.give_back(),
                    DetailOutcome::Failed { id, error } => match source.detail_failure_policy() {
                        DetailFailurePolicy::Drop => {
                            tracing::warn!("Dropping vacancy {}: {}", id, error);
                            admission.give_back();
                        }
                        DetailFailurePolicy::Fatal => return Err(error),
                    },
                }
            }

            for vacancy in records {
                if tx.send(Ok(vacancy)).await.is_err() {
                    tracing::debug!("Vacancy stream was dropped, stopping run");
                    return Ok(stats);
                }
                stats.emitted += 1;
            }
        }

        Ok(stats)
    }
}

/// Finite, non-restartable stream of one run's vacancies
///
/// Yields `Ok` records in page order and, if the run fails, a single `Err`
/// as the last item.
pub struct VacancyStream {
    rx: mpsc::Receiver<Result<Vacancy, HarvestError>>,
}

/// Everything a drained stream produced
#[derive(Debug)]
pub struct HarvestOutcome {
    /// Records yielded before the stream ended
    pub vacancies: Vec<Vacancy>,

    /// The failure that terminated the run, if any
    pub error: Option<HarvestError>,
}

impl VacancyStream {
    /// Receives the next record, or `None` once the run is over
    pub async fn recv(&mut self) -> Option<Result<Vacancy, HarvestError>> {
        self.rx.recv().await
    }

    /// Drains the stream
    pub async fn collect_all(mut self) -> HarvestOutcome {
        let mut vacancies = Vec::new();
        while let Some(item) = self.rx.recv().await {
            match item {
                Ok(vacancy) => vacancies.push(vacancy),
                Err(error) => {
                    return HarvestOutcome {
                        vacancies,
                        error: Some(error),
                    }
                }
            }
        }

        HarvestOutcome {
            vacancies,
            error: None,
        }
    }
}

impl Stream for VacancyStream {
    type Item = Result<Vacancy, HarvestError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
