//! Harvest coordinator - main crawl orchestration logic
//!
//! This module contains the page loop that drives one harvest run:
//! - Building page URLs and fetching listing pages in order
//! - Extracting candidates and deduplicating them by URL
//! - Enriching new listings from their detail pages, a bounded batch at a time
//! - Streaming accepted listings to the CSV writer task
//! - Reporting progress to an optional event channel
//! - Deciding when the run is done and which failures are fatal

use crate::catalog::Category;
use crate::config::{Config, EnrichmentFailurePolicy};
use crate::crawler::enrich::{enrich, EnrichError};
use crate::crawler::events::HarvestEvent;
use crate::crawler::ledger::DedupLedger;
use crate::crawler::{Extractor, Fetcher, ListingRecord};
use crate::output::{CsvSink, HarvestOutcome, HarvestSummary, OutputResult, RecordSink, Schema};
use crate::state::{RunPhase, RunState};
use crate::url::page_url;
use crate::{HarvestError, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Records buffered between the coordinator and the writer task
const SINK_BUFFER: usize = 64;

/// What the caller wants harvested
#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub category: Category,

    /// Number of listings to collect
    pub target: usize,

    /// Fetch each listing's detail page for the extended columns
    pub enrich: bool,

    /// CSV file receiving the run's output
    pub output_path: PathBuf,
}

impl HarvestRequest {
    /// Builds a request whose output file is named after the category
    pub fn new(category: Category, target: usize, enrich: bool, output_dir: impl AsRef<Path>) -> Self {
        let output_path = category.output_path(output_dir);
        Self {
            category,
            target,
            enrich,
            output_path,
        }
    }
}

/// Bookkeeping owned by one run of the page loop
struct HarvestRun {
    state: RunState,
    ledger: DedupLedger,
    pages_fetched: u32,
    duplicates_skipped: usize,
    stale_pages: u32,
    enrichment_failures: usize,
    enrichment_fallbacks: usize,
}

impl HarvestRun {
    fn new(category: &str, target: usize) -> Self {
        Self {
            state: RunState::new(category, target),
            ledger: DedupLedger::new(),
            pages_fetched: 0,
            duplicates_skipped: 0,
            stale_pages: 0,
            enrichment_failures: 0,
            enrichment_fallbacks: 0,
        }
    }

    fn abort(&mut self, error: HarvestError) -> HarvestError {
        self.state.transition(RunPhase::Aborted);
        tracing::error!(
            "Aborting on page {} after {} listings: {}",
            self.state.page,
            self.state.accepted,
            error
        );
        error
    }
}

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Fetcher,
    extractor: Extractor,
    events: Option<mpsc::Sender<HarvestEvent>>,
}

impl Coordinator {
    /// Creates a coordinator with its own HTTP client
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = Fetcher::from_config(&config.site, &config.harvest)?;
        Self::with_fetcher(config, fetcher)
    }

    /// Creates a coordinator sharing an existing fetcher
    pub fn with_fetcher(config: Config, fetcher: Fetcher) -> Result<Self> {
        crate::config::validate(&config)?;
        let extractor = Extractor::new(config.site.origin.clone())?;

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            extractor,
            events: None,
        })
    }

    /// Reports progress of every run to `events`
    ///
    /// Events are dropped once the receiver goes away; a closed channel
    /// never affects the run.
    pub fn with_events(mut self, events: mpsc::Sender<HarvestEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs a harvest end to end: opens the output, crawls, closes the output
    ///
    /// The writer task always drains and closes the file, so when a listing
    /// page fails the file still holds every row accepted before the failure.
    pub async fn harvest(&self, request: &HarvestRequest) -> Result<HarvestSummary> {
        let sink = CsvSink::create(&request.output_path, Schema::for_mode(request.enrich))?;
        let (tx, rx) = mpsc::channel(SINK_BUFFER);
        let writer = spawn_writer(sink, rx);

        let run_result = self.run(request, tx).await;
        let write_result = writer.await?;

        match (run_result, write_result) {
            (Ok(summary), Ok(rows)) => {
                tracing::info!("Wrote {} rows to {}", rows, request.output_path.display());
                Ok(summary)
            }
            (Ok(_), Err(write_error)) => Err(write_error.into()),
            (Err(HarvestError::SinkClosed), Err(write_error)) => Err(write_error.into()),
            (Err(run_error), Ok(rows)) => {
                tracing::error!(
                    "Run aborted; {} rows kept in {}",
                    rows,
                    request.output_path.display()
                );
                Err(run_error)
            }
            (Err(run_error), Err(write_error)) => {
                tracing::error!("Output writer also failed: {}", write_error);
                Err(run_error)
            }
        }
    }

    /// Runs the page loop, sending accepted listings to `sink`
    ///
    /// # Loop
    ///
    /// 1. Build the next page URL and fetch it; a failure aborts the run
    /// 2. Extract candidates; an empty page ends the run as exhausted
    /// 3. Skip candidates whose URL was already seen
    /// 4. Enrich new listings when requested; a failed detail page affects
    ///    only its own listing
    /// 5. Send listings in page order, stopping as soon as the target is met
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestSummary)` - Target reached or category exhausted
    /// * `Err(HarvestError::PageFetch)` - A listing page could not be fetched
    /// * `Err(HarvestError::PageExtract)` - A listing page was not recognised
    /// * `Err(HarvestError::SinkClosed)` - The writer stopped accepting rows
    pub async fn run(
        &self,
        request: &HarvestRequest,
        sink: mpsc::Sender<ListingRecord>,
    ) -> Result<HarvestSummary> {
        let started_at = Utc::now();
        let base_url = request.category.base_url(&self.config.site.origin)?;
        let mut run = HarvestRun::new(&request.category.title, request.target);

        tracing::info!(
            "Harvesting up to {} listings from '{}' ({}), enrichment {}",
            request.target,
            request.category.title,
            base_url,
            if request.enrich { "on" } else { "off" }
        );
        self.emit(HarvestEvent::Started {
            category: request.category.title.clone(),
            target: request.target,
        })
        .await;

        let outcome = loop {
            if run.state.is_target_reached() {
                run.state.transition(RunPhase::Done);
                tracing::info!("Target of {} listings reached", request.target);
                break HarvestOutcome::TargetReached;
            }

            run.state.transition(RunPhase::Paging);
            let page = run.state.next_page();
            let url = page_url(&base_url, page);

            let html = match self.fetcher.fetch_document(&url).await {
                Ok(html) => html,
                Err(source) => return Err(run.abort(HarvestError::PageFetch { url, source })),
            };
            run.pages_fetched += 1;

            run.state.transition(RunPhase::Extracting);
            let candidates = match self.extractor.extract_listing_cards(&html) {
                Ok(candidates) => candidates,
                Err(source) => return Err(run.abort(HarvestError::PageExtract { url, source })),
            };

            if candidates.is_empty() {
                run.state.transition(RunPhase::Done);
                tracing::info!(
                    "Page {} has no listings; '{}' exhausted after {} of {}",
                    page,
                    request.category.title,
                    run.state.accepted,
                    request.target
                );
                break HarvestOutcome::Exhausted;
            }

            tracing::info!("Page {}: {} candidates from {}", page, candidates.len(), url);
            self.emit(HarvestEvent::PageFetched {
                page,
                candidates: candidates.len(),
            })
            .await;

            let fresh = match self.process_page(candidates, request.enrich, &mut run, &sink).await {
                Ok(fresh) => fresh,
                Err(error) => return Err(run.abort(error)),
            };

            if fresh == 0 {
                run.stale_pages += 1;
                tracing::warn!(
                    "Page {} held only listings already seen ({} stale pages so far)",
                    page,
                    run.stale_pages
                );
                self.emit(HarvestEvent::StalePage { page }).await;
            }

            tracing::debug!(
                "Progress: {}/{} listings after page {}",
                run.state.accepted,
                request.target,
                page
            );
        };

        self.emit(HarvestEvent::Finished {
            collected: run.state.accepted,
        })
        .await;

        Ok(HarvestSummary {
            category: request.category.title.clone(),
            requested: request.target,
            collected: run.state.accepted,
            pages_fetched: run.pages_fetched,
            duplicates_skipped: run.duplicates_skipped,
            stale_pages: run.stale_pages,
            enrichment_failures: run.enrichment_failures,
            enrichment_fallbacks: run.enrichment_fallbacks,
            outcome,
            output_path: request.output_path.clone(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Accepts the new candidates of one page, in page order
    ///
    /// Candidates are taken in batches no larger than the number of listings
    /// still needed, so no detail page is fetched for a listing that could
    /// not be written. A batch that loses listings to enrichment failures is
    /// followed by another batch from the same page.
    ///
    /// Returns how many candidates were new to the run.
    async fn process_page(
        &self,
        candidates: Vec<ListingRecord>,
        enrich_listings: bool,
        run: &mut HarvestRun,
        sink: &mpsc::Sender<ListingRecord>,
    ) -> Result<usize> {
        let mut candidates = candidates.into_iter();
        let mut fresh = 0;

        loop {
            let remaining = run.state.remaining();
            if remaining == 0 {
                return Ok(fresh);
            }

            let mut batch = Vec::with_capacity(remaining);
            for candidate in candidates.by_ref() {
                if !run.ledger.accept(candidate.identity_key()) {
                    run.duplicates_skipped += 1;
                    tracing::debug!("Skipping duplicate {}", candidate.url);
                    continue;
                }

                fresh += 1;
                batch.push(candidate);
                if batch.len() == remaining {
                    break;
                }
            }

            if batch.is_empty() {
                return Ok(fresh);
            }

            if enrich_listings {
                run.state.transition(RunPhase::Enriching);
                batch = self.enrich_batch(batch, run).await;
                run.state.transition(RunPhase::Extracting);
            }

            for record in batch {
                sink.send(record).await.map_err(|_| HarvestError::SinkClosed)?;
                run.state.record_accepted();
                self.emit(HarvestEvent::ListingAccepted {
                    accepted: run.state.accepted,
                })
                .await;
            }
        }
    }

    /// Enriches a batch concurrently and returns the listings to emit
    ///
    /// Results come back in batch order regardless of completion order.
    async fn enrich_batch(&self, mut batch: Vec<ListingRecord>, run: &mut HarvestRun) -> Vec<ListingRecord> {
        let limit = self.config.harvest.enrichment_concurrency;

        let results: Vec<std::result::Result<(), EnrichError>> = stream::iter(
            batch
                .iter_mut()
                .map(|record| enrich(&self.fetcher, &self.extractor, record)),
        )
        .buffered(limit)
        .collect()
        .await;

        let policy = self.config.harvest.on_enrichment_failure;
        let mut kept = Vec::with_capacity(batch.len());

        for (record, result) in batch.into_iter().zip(results) {
            match result {
                Ok(()) => kept.push(record),
                Err(error) => {
                    run.enrichment_failures += 1;
                    self.emit(HarvestEvent::EnrichmentFailed {
                        url: record.url.clone(),
                        error: error.to_string(),
                    })
                    .await;
                    match policy {
                        EnrichmentFailurePolicy::Drop => {
                            tracing::warn!("Dropping {}: {}", record.url, error);
                        }
                        EnrichmentFailurePolicy::KeepBase => {
                            tracing::warn!("Keeping base fields of {}: {}", record.url, error);
                            run.enrichment_fallbacks += 1;
                            kept.push(record);
                        }
                    }
                }
            }
        }

        kept
    }

    async fn emit(&self, event: HarvestEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event).await;
        }
    }
}

/// Moves the blocking CSV writer onto its own thread
fn spawn_writer(
    mut sink: CsvSink,
    mut records: mpsc::Receiver<ListingRecord>,
) -> JoinHandle<OutputResult<usize>> {
    tokio::task::spawn_blocking(move || {
        while let Some(record) = records.blocking_recv() {
            sink.append(&record)?;
        }
        sink.close()
    })
}

/// Runs a complete harvest with a freshly built coordinator
pub async fn run_harvest(config: Config, request: HarvestRequest) -> Result<HarvestSummary> {
    let coordinator = Coordinator::new(config)?;
    coordinator.harvest(&request).await
}
