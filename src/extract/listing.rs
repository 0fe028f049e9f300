use super::fields::{submit_search, FieldReader};
use crate::core::config::{SessionConfig, Selectors, Timings};
use crate::model::{ListingRecord, RegionFilter, SearchTerm};
use crate::page::{PageQuery, Target};
use crate::stats::StatsTracker;
use crate::ScraperResult;
use log::{debug, info, warn};
use std::sync::Arc;
use url::Url;

/// Looks up one term and reads the listing it lands on.
pub struct ListingExtractor {
    search_url: Url,
    selectors: Selectors,
    timings: Timings,
    region: RegionFilter,
    stats: Arc<StatsTracker>,
}

impl ListingExtractor {
    pub fn new(config: &SessionConfig) -> ScraperResult<Self> {
        Ok(Self {
            search_url: config.search_url()?,
            selectors: config.selectors.clone(),
            timings: config.timings.clone(),
            region: RegionFilter::new(&config.region),
            stats: Arc::new(StatsTracker::new()),
        })
    }

    pub fn with_stats(mut self, stats: Arc<StatsTracker>) -> Self {
        self.stats = stats;
        self
    }

    pub fn region(&self) -> &RegionFilter {
        &self.region
    }

    /// Never fails: anything that goes wrong shows up as empty fields or as
    /// the not-found record.
    pub async fn extract(&self, term: &SearchTerm, page: &mut dyn PageQuery) -> ListingRecord {
        let sentinel = self.region.sentinel();
        let query = self.region.qualify(term.as_str());

        if let Err(e) = submit_search(
            page,
            &self.search_url,
            &self.selectors,
            &self.timings,
            &query,
        )
        .await
        {
            warn!("Error searching for {}: {}", term, e);
            return ListingRecord::not_found(term.as_str(), sentinel);
        }

        page.settle(
            &[
                self.selectors.first_result.as_str(),
                self.selectors.heading.as_str(),
            ],
            self.timings.results_settle(),
        )
        .await;
        self.open_first_result(page).await;

        let reader = FieldReader::new(&self.selectors, &self.timings, &self.stats);
        let mut record = ListingRecord::new(term.as_str());
        record.name = reader.name(page).await;
        let address = reader.address(page).await;

        if self.region.accepts(&address) {
            record.address = address;
            reader.contact(page, &mut record).await;
            info!("Found '{}' for {}", record.name, term);
        } else {
            debug!(
                "Rejecting '{}' for {}: address '{}' outside region",
                record.name, term, address
            );
            record.mark_not_found(sentinel);
        }

        record
    }

    async fn open_first_result(&self, page: &mut dyn PageQuery) {
        let first = &self.selectors.first_result;
        if !matches!(page.count(first).await, Ok(n) if n > 0) {
            return;
        }

        if let Err(e) = page.click(&Target::css(first.as_str())).await {
            debug!("Could not open first result: {}", e);
        }
        page.settle(&[self.selectors.heading.as_str()], self.timings.detail_settle())
            .await;
    }
}
