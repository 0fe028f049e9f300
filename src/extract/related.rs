use super::fields::{submit_search, wait_for_text_change, FieldReader};
use crate::core::config::SessionConfig;
use crate::model::{KnownTerms, ListingRecord};
use crate::page::{FieldRead, PageQuery, Target};
use crate::stats::StatsTracker;
use crate::ScraperResult;
use log::{debug, info, warn};
use std::sync::Arc;
use url::Url;

/// Where related listings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryScope<'a> {
    /// Cards already shown next to the open result.
    Siblings,
    /// Broadened searches for businesses in a locality.
    Locality(&'a str),
}

/// Records businesses near a found listing, skipping the run's own input terms.
pub struct RelatedDiscovery {
    search_url: Url,
    config: SessionConfig,
    stats: Arc<StatsTracker>,
}

impl RelatedDiscovery {
    pub fn new(config: &SessionConfig) -> ScraperResult<Self> {
        Ok(Self {
            search_url: config.search_url()?,
            config: config.clone(),
            stats: Arc::new(StatsTracker::new()),
        })
    }

    pub fn with_stats(mut self, stats: Arc<StatsTracker>) -> Self {
        self.stats = stats;
        self
    }

    /// Per-card failures skip that card only; discovery itself never fails.
    pub async fn discover(
        &self,
        page: &mut dyn PageQuery,
        scope: DiscoveryScope<'_>,
        known: &KnownTerms,
    ) -> Vec<ListingRecord> {
        let records = match scope {
            DiscoveryScope::Siblings => {
                let label = ListingRecord::related_label(None);
                self.sweep_cards(page, known, &label, false).await
            }
            DiscoveryScope::Locality(locality) => self.sweep_locality(page, locality, known).await,
        };

        if !records.is_empty() {
            info!("Discovered {} related listings", records.len());
        }
        records
    }

    async fn sweep_locality(
        &self,
        page: &mut dyn PageQuery,
        locality: &str,
        known: &KnownTerms,
    ) -> Vec<ListingRecord> {
        let label = ListingRecord::related_label(Some(locality));
        self.stats.record_locality_sweep();

        for query in self.config.locality_queries(locality) {
            if let Err(e) = submit_search(
                page,
                &self.search_url,
                &self.config.selectors,
                &self.config.timings,
                &query,
            )
            .await
            {
                warn!("Error searching for '{}': {}", query, e);
                continue;
            }

            let container = &self.config.selectors.results_container;
            if let Err(e) = page
                .wait_for(container, self.config.timings.results_settle())
                .await
            {
                debug!("No result list for '{}': {}", query, e);
                continue;
            }

            let cards = page.count(&self.config.selectors.result_card).await.unwrap_or(0);
            if cards == 0 {
                debug!("Result list for '{}' is empty", query);
                continue;
            }

            debug!("Sweeping {} cards for '{}'", cards, query);
            return self.sweep_cards(page, known, &label, true).await;
        }

        Vec::new()
    }

    async fn sweep_cards(
        &self,
        page: &mut dyn PageQuery,
        known: &KnownTerms,
        label: &str,
        return_to_list: bool,
    ) -> Vec<ListingRecord> {
        let cards = page.count(&self.config.selectors.result_card).await.unwrap_or(0);
        let mut records = Vec::new();

        for index in 0..cards {
            if let Some(record) = self
                .visit_card(page, index, known, label, return_to_list)
                .await
            {
                records.push(record);
            }
        }

        records
    }

    async fn visit_card(
        &self,
        page: &mut dyn PageQuery,
        index: usize,
        known: &KnownTerms,
        label: &str,
        return_to_list: bool,
    ) -> Option<ListingRecord> {
        let selectors = &self.config.selectors;
        let timings = &self.config.timings;
        let card = Target::css(selectors.result_card.as_str()).nth(index);
        let card_name = card.clone().descendant(selectors.card_name.as_str());

        let name = match FieldRead::from_result(page.read_text(&card_name).await) {
            FieldRead::Value(name) => name,
            FieldRead::Empty => return None,
            FieldRead::Unavailable(e) => {
                debug!("Card {} has no readable name: {}", index, e);
                return None;
            }
        };

        if known.contains(&name) {
            debug!("Skipping '{}': already an input term", name);
            self.stats.record_known_skip();
            return None;
        }

        let previous = FieldRead::from_result(
            page.read_text(&Target::css(selectors.heading.as_str())).await,
        )
        .into_text();
        if let Err(e) = page.click(&card).await {
            warn!("Could not open related listing '{}': {}", name, e);
            self.stats.record_card_failure();
            return None;
        }
        if let Err(e) =
            wait_for_text_change(page, &selectors.heading, &previous, timings.card_settle()).await
        {
            warn!("Related listing '{}' did not open: {}", name, e);
            self.stats.record_card_failure();
            return None;
        }

        let reader = FieldReader::new(selectors, timings, &self.stats);
        let record = reader.full(page, label).await;
        debug!("Related listing '{}' read as '{}'", name, record.name);

        if return_to_list {
            let back = Target::css(selectors.back_button.as_str());
            if let Err(e) = page.click(&back).await {
                debug!("No way back to the result list: {}", e);
            }
            page.settle(&[selectors.result_card.as_str()], timings.card_settle())
                .await;
        }

        Some(record)
    }
}
