//! Crawl orchestrator - the resumable region walk
//!
//! For every region of the work list that is not yet checkpointed, the
//! orchestrator walks the region's pagination chain. Each listing page yields
//! detail links; each detail page yields at most one company record, which is
//! enriched with a location and an industry reference and handed to the
//! company writer. A region is checkpointed as soon as its last page is walked.
//!
//! # Failure handling
//!
//! - A detail page that fails to fetch is logged and skipped.
//! - A listing page that fails to fetch aborts the run; the region stays
//!   unfinished and is walked again by the next run.
//! - Store lookup and reference-insert failures abort the run.
//!
//! Whatever happens, `harvest` flushes and closes all writers before returning.

use crate::classifier::{KeywordClassifier, KeywordTable, Signal};
use crate::config::Config;
use crate::crawler::extractor::{CompanyRecord, Extractor};
use crate::crawler::fetcher::RateLimitedFetcher;
use crate::state::{load_region_states, CheckpointStore, RegionCheckpoint, RegionState};
use crate::storage::{
    BufferedDedupWriter, DocumentStore, FlushOutcome, LocationRecord, PersistedCompanyRecord,
    WriterConfig,
};
use crate::{HarvestError, Result};
use chrono::Utc;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Counters for one run, logged when the run ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Regions in the work list
    pub regions_total: usize,

    /// Regions walked to their last page in this run
    pub regions_completed: usize,

    /// Regions skipped because an earlier run completed them
    pub regions_skipped: usize,

    /// Listing pages fetched
    pub pages_walked: usize,

    /// Detail pages fetched
    pub details_fetched: usize,

    /// Detail pages that failed to fetch and were skipped
    pub details_failed: usize,

    /// Detail pages that yielded no record or a record without a name
    pub details_empty: usize,

    /// Company records accepted by the company writer
    pub records_added: usize,

    /// Company records already stored or buffered
    pub duplicates: usize,
}

impl RunSummary {
    pub fn log(&self) {
        tracing::info!(
            regions_total = self.regions_total,
            regions_completed = self.regions_completed,
            regions_skipped = self.regions_skipped,
            pages = self.pages_walked,
            details = self.details_fetched,
            details_failed = self.details_failed,
            details_empty = self.details_empty,
            added = self.records_added,
            duplicates = self.duplicates,
            "Run summary"
        );
    }
}

/// Walks regions and loads their companies into the store
pub struct CrawlOrchestrator<E: Extractor, S: DocumentStore> {
    fetcher: RateLimitedFetcher,
    extractor: E,
    classifier: KeywordClassifier,
    checkpoints: CheckpointStore,
    companies: BufferedDedupWriter<S>,
    locations: BufferedDedupWriter<S>,
    industries: BufferedDedupWriter<S>,
    country: String,
    region_states: IndexMap<String, String>,
    min_pause: Duration,
    max_pause: Duration,
}

impl<E: Extractor, S: DocumentStore> CrawlOrchestrator<E, S> {
    /// Creates an orchestrator
    ///
    /// Loads the keyword table and the optional region-to-state lookup, opens
    /// one writer per collection over the shared store and builds the fetcher.
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `store` - The document store, opened by the caller
    /// * `extractor` - Site-specific page extraction
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOrchestrator)` - Ready to run
    /// * `Err(HarvestError)` - A file failed to load or a collection could not be created
    pub fn from_config(config: &Config, store: Arc<Mutex<S>>, extractor: E) -> Result<Self> {
        let table = KeywordTable::load(&config.files.keyword_table)?;
        tracing::info!(
            "Loaded {} categories from {}",
            table.len(),
            config.files.keyword_table.display()
        );

        let region_states = match &config.files.region_states {
            Some(path) => load_region_states(path)?,
            None => IndexMap::new(),
        };

        let companies = BufferedDedupWriter::open(
            Arc::clone(&store),
            WriterConfig::new(&config.store.company_collection)
                .with_buffer_size(config.store.buffer_size)
                .with_max_wait(config.store.max_wait()),
        )?;
        let locations = BufferedDedupWriter::open(
            Arc::clone(&store),
            WriterConfig::new(&config.store.location_collection),
        )?;
        let industries = BufferedDedupWriter::open(
            store,
            WriterConfig::new(&config.store.industry_collection),
        )?;

        let (min_pause, max_pause) =
            pause_bounds(config.crawler.min_pause_ms, config.crawler.max_pause_ms);

        Ok(Self {
            fetcher: RateLimitedFetcher::new(&config.fetcher)?,
            extractor,
            classifier: KeywordClassifier::new(table),
            checkpoints: CheckpointStore::new(
                &config.files.regions,
                &config.files.completed_regions,
            ),
            companies,
            locations,
            industries,
            country: config.location.country.clone(),
            region_states,
            min_pause,
            max_pause,
        })
    }

    /// Runs the harvest, then flushes and closes every writer
    ///
    /// The writers are closed on the error path too, so records buffered
    /// before a fatal error still reach the store. The error itself is left
    /// to the caller to report.
    pub async fn harvest(mut self) -> Result<RunSummary> {
        let result = self.run().await;

        if let Ok(summary) = &result {
            summary.log();
        }

        self.close();
        result
    }

    /// Walks every region not yet checkpointed
    ///
    /// Writers are left open; call `close` afterwards, or use `harvest`.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let regions = self.checkpoints.load_regions()?;
        let mut completed = self.checkpoints.load_completed()?;

        let mut summary = RunSummary {
            regions_total: regions.len(),
            ..RunSummary::default()
        };

        tracing::info!(
            "Starting harvest: {} regions, {} already completed",
            regions.len(),
            completed.len()
        );

        for region in &regions {
            if completed.contains(&region.region_name) {
                tracing::debug!(region = %region.region_name, "Already completed, skipping");
                summary.regions_skipped += 1;
                continue;
            }

            self.walk_region(region, &mut summary).await?;

            completed.mark_completed(region);
            self.checkpoints.persist_completed(&completed)?;
            summary.regions_completed += 1;
        }

        Ok(summary)
    }

    /// Flushes the remaining buffered records and releases the store handles
    pub fn close(self) {
        for writer in [self.companies, self.locations, self.industries] {
            let collection = writer.collection().to_string();
            if let FlushOutcome::Discarded(count) = writer.close() {
                tracing::error!("Lost {} buffered {} records on close", count, collection);
            }
        }
    }

    /// Walks one region's pagination chain to the page with no next link
    async fn walk_region(&mut self, region: &RegionCheckpoint, summary: &mut RunSummary) -> Result<()> {
        let name = region.region_name.as_str();
        let mut state = RegionState::Pending;
        advance(&mut state, RegionState::InProgress, name)?;

        tracing::info!(region = %name, url = %region.entry_url, "Walking region");

        let mut visited = HashSet::new();
        let mut next_page = Some(region.entry_url.clone());
        let mut failed_here = 0;

        while let Some(url) = next_page.take() {
            if !visited.insert(url.clone()) {
                tracing::warn!(region = %name, url = %url, "Next page already visited, ending region");
                break;
            }

            let page = self.fetcher.fetch(&url).await?;
            summary.pages_walked += 1;

            let links = self.extractor.extract_links(&page, name);
            tracing::info!(
                region = %name,
                url = %url,
                "Listing page {} has {} detail links",
                visited.len(),
                links.detail_links.len()
            );

            for link in &links.detail_links {
                self.pause().await;

                match self.process_detail(link, region, summary).await {
                    Ok(()) => {}
                    Err(HarvestError::Fetch(e)) => {
                        tracing::warn!(region = %name, url = %link, "Skipping detail page: {}", e);
                        summary.details_failed += 1;
                        failed_here += 1;
                    }
                    Err(e) => return Err(e),
                }
            }

            if links.next_page.is_some() {
                self.pause().await;
            }
            next_page = links.next_page;
        }

        advance(&mut state, RegionState::Completed, name)?;

        if failed_here > 0 {
            tracing::warn!(
                region = %name,
                "Region completed with {} detail pages skipped",
                failed_here
            );
        } else {
            tracing::info!(region = %name, "Region completed");
        }

        Ok(())
    }

    /// Fetches one detail page and stores its company
    async fn process_detail(
        &mut self,
        link: &str,
        region: &RegionCheckpoint,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let page = self.fetcher.fetch(link).await?;
        summary.details_fetched += 1;

        let Some(record) = self.extractor.extract_record(&page) else {
            tracing::debug!(url = %link, "No record on detail page");
            summary.details_empty += 1;
            return Ok(());
        };

        let Some(name) = record.dedup_name().map(str::to_string) else {
            tracing::warn!(url = %link, "Record has no name, skipping");
            summary.details_empty += 1;
            return Ok(());
        };

        let location = self.location_for(region, &record);
        let location_id = self.locations.insert(&location)?;

        let industry = self.classify(&record);
        let industry_id = self.industries.find_or_create(&industry)?;

        let company = PersistedCompanyRecord {
            name,
            size: record.size,
            revenue: String::new(),
            website: record.website,
            description: record.description,
            contact_numbers: record.contact_numbers,
            location_id,
            industry_id,
            created_at: Utc::now().to_rfc3339(),
        };

        if self.companies.add(&company)? {
            summary.records_added += 1;
            tracing::debug!(company = %company.name, industry = %industry, "Buffered company");
        } else {
            summary.duplicates += 1;
            tracing::debug!(company = %company.name, "Duplicate company skipped");
        }

        Ok(())
    }

    fn location_for(&self, region: &RegionCheckpoint, record: &CompanyRecord) -> LocationRecord {
        LocationRecord {
            country: self.country.clone(),
            city: region.region_name.clone(),
            state: self.region_states.get(&region.region_name).cloned(),
            latitude: record.latitude.clone(),
            longitude: record.longitude.clone(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Classifies by tags when there are any, by description otherwise
    fn classify(&self, record: &CompanyRecord) -> String {
        let signal = if record.tags.is_empty() {
            Signal::Description(record.description.as_deref().unwrap_or_default())
        } else {
            Signal::Tags(&record.tags)
        };
        self.classifier.classify(signal)
    }

    async fn pause(&self) {
        if self.max_pause.is_zero() {
            return;
        }

        let millis = rand::random_range(
            self.min_pause.as_millis() as u64..=self.max_pause.as_millis() as u64,
        );
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// Pause bounds with `max` raised to at least `min`
fn pause_bounds(min_ms: u64, max_ms: u64) -> (Duration, Duration) {
    (
        Duration::from_millis(min_ms),
        Duration::from_millis(max_ms.max(min_ms)),
    )
}

fn advance(state: &mut RegionState, next: RegionState, region: &str) -> Result<()> {
    if !state.can_transition_to(next) {
        return Err(HarvestError::InvalidTransition {
            region: region.to_string(),
            from: *state,
            to: next,
        });
    }

    tracing::debug!(region = %region, "{} -> {}", state, next);
    *state = next;
    Ok(())
}
