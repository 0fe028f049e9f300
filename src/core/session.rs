use super::config::{DiscoveryMode, SessionConfig};
use super::control::{SessionState, StopHandle};
use super::events::{EventSender, SessionEvent};
use crate::extract::{DiscoveryScope, ListingExtractor, RelatedDiscovery};
use crate::model::{locality_of, KnownTerms, ListingRecord, LocalityTracker, RowTag, SearchTerm};
use crate::page::PageQuery;
use crate::stats::{ScrapingStats, StatsTracker};
use crate::storage::RecordSink;
use crate::ScraperResult;
use log::{debug, info, warn};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rows: usize,
    pub processed: usize,
    pub stopped: bool,
    pub stats: ScrapingStats,
}

/// Runs one pass over the input list with exclusive use of a page and a sink.
///
/// Terms are handled strictly one after another. For each: look it up, write
/// the row, optionally write related rows, then report progress. A stop
/// request is honoured between terms only.
pub struct ScrapeSession {
    config: SessionConfig,
    extractor: ListingExtractor,
    discovery: RelatedDiscovery,
    page: Box<dyn PageQuery>,
    sink: Box<dyn RecordSink>,
    control: StopHandle,
    events: EventSender,
    stats: Arc<StatsTracker>,
    localities: LocalityTracker,
}

impl ScrapeSession {
    pub fn new(
        config: SessionConfig,
        page: Box<dyn PageQuery>,
        sink: Box<dyn RecordSink>,
    ) -> ScraperResult<Self> {
        config.validate()?;
        let stats = Arc::new(StatsTracker::new());
        let extractor = ListingExtractor::new(&config)?.with_stats(Arc::clone(&stats));
        let discovery = RelatedDiscovery::new(&config)?.with_stats(Arc::clone(&stats));

        Ok(Self {
            config,
            extractor,
            discovery,
            page,
            sink,
            control: StopHandle::new(),
            events: EventSender::silent(),
            stats,
            localities: LocalityTracker::new(),
        })
    }

    pub fn with_events(mut self, events: impl Into<EventSender>) -> Self {
        self.events = events.into();
        self
    }

    /// Shares an externally created handle, so a stop can be requested
    /// before the session exists.
    pub fn with_stop_handle(mut self, control: StopHandle) -> Self {
        self.control = control;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.control.clone()
    }

    pub fn state(&self) -> SessionState {
        self.control.state()
    }

    pub fn stats(&self) -> Arc<StatsTracker> {
        Arc::clone(&self.stats)
    }

    pub async fn run(mut self, terms: Vec<SearchTerm>) -> RunSummary {
        self.control.begin();
        let known = KnownTerms::from_terms(&terms);
        let total = terms.len();

        info!(
            "Starting run over {} terms (discovery: {:?})",
            total, self.config.discovery
        );
        self.stats.start(total);
        self.events.send(SessionEvent::Started { total });

        let mut processed = 0;
        for term in &terms {
            if self.control.is_stop_requested() {
                info!("Stop requested after {} of {} terms", processed, total);
                break;
            }
            self.process(term, &known).await;
            processed += 1;
        }
        let stopped = processed < total;

        if let Err(e) = self.page.close().await {
            warn!("Failed to release the browser: {}", e);
        }

        let rows = self.sink.row_count();
        self.control.finish();
        self.stats.finish(stopped);
        self.events.send(SessionEvent::Done { rows, stopped });
        info!("Run finished: {} terms processed, {} rows written", processed, rows);
        self.stats.print_summary();

        RunSummary {
            rows,
            processed,
            stopped,
            stats: self.stats.get_stats(),
        }
    }

    async fn process(&mut self, term: &SearchTerm, known: &KnownTerms) {
        info!("Processing: {}", term);
        let record = self.extractor.extract(term, self.page.as_mut()).await;
        let tag = RowTag::for_primary(&record, self.extractor.region().sentinel());
        let found = tag == RowTag::PrimaryOk;

        self.stats.record_primary(found);
        self.write(&record, tag);

        if found {
            let related = self.discover(&record, known).await;
            self.stats.record_related(related.len());
            for related_record in &related {
                self.write(related_record, RowTag::Related);
            }
        }

        let outcome = if record.name.is_empty() {
            "(no name)".to_string()
        } else {
            record.name.clone()
        };
        self.events.send(SessionEvent::Progress {
            rows: self.sink.row_count(),
            term: term.to_string(),
            outcome,
        });
    }

    async fn discover(&mut self, record: &ListingRecord, known: &KnownTerms) -> Vec<ListingRecord> {
        match self.config.discovery {
            DiscoveryMode::Off => Vec::new(),
            DiscoveryMode::Siblings => {
                self.discovery
                    .discover(self.page.as_mut(), DiscoveryScope::Siblings, known)
                    .await
            }
            DiscoveryMode::Locality => {
                let locality = locality_of(&record.address);
                if locality.is_empty() {
                    debug!("No locality in '{}'", record.address);
                    return Vec::new();
                }
                if !self.localities.first_visit(&locality) {
                    debug!("Locality '{}' already swept", locality);
                    return Vec::new();
                }
                self.discovery
                    .discover(
                        self.page.as_mut(),
                        DiscoveryScope::Locality(&locality),
                        known,
                    )
                    .await
            }
        }
    }

    /// Appends and flushes one row. A failed write is logged and the run goes on.
    fn write(&mut self, record: &ListingRecord, tag: RowTag) {
        let result = self
            .sink
            .append(record, tag)
            .and_then(|_| self.sink.flush());
        if let Err(e) = result {
            warn!("Failed to record '{}': {}", record.queried_as, e);
            self.stats.record_sink_failure();
        }
    }
}
