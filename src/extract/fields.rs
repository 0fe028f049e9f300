use crate::core::config::{Selectors, Timings};
use crate::model::ListingRecord;
use crate::page::{FieldRead, PageError, PageQuery, PageResult, Target};
use crate::stats::StatsTracker;
use log::{debug, trace};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use url::Url;

/// Opens the search application and submits `query` from its search box.
pub(crate) async fn submit_search(
    page: &mut dyn PageQuery,
    search_url: &Url,
    selectors: &Selectors,
    timings: &Timings,
    query: &str,
) -> PageResult<()> {
    debug!("Searching for '{}'", query);
    page.navigate(search_url).await?;
    page.wait_for(&selectors.search_input, timings.search_input())
        .await?;
    page.fill(&selectors.search_input, query).await?;
    page.press_enter(&selectors.search_input).await?;
    Ok(())
}

/// Polls until the text under `selector` is non-empty and differs from
/// `previous`. Fails with `Timeout` once `budget` runs out.
pub(crate) async fn wait_for_text_change(
    page: &mut dyn PageQuery,
    selector: &str,
    previous: &str,
    budget: Duration,
) -> PageResult<()> {
    let started = Instant::now();
    loop {
        let current = FieldRead::from_result(page.read_text(&Target::css(selector)).await);
        if let FieldRead::Value(text) = current {
            if text != previous {
                return Ok(());
            }
        }
        let waited = started.elapsed();
        if waited >= budget {
            trace!("`{}` still shows '{}' after {:?}", selector, previous, budget);
            return Err(PageError::Timeout {
                selector: selector.to_string(),
                waited_ms: waited.as_millis() as u64,
            });
        }
        sleep(page.poll_interval()).await;
    }
}

/// Reads the detail pane of whichever listing is currently open.
///
/// An absent element is an empty field. Any other failure is counted as an
/// unavailable read and still yields an empty field.
pub(crate) struct FieldReader<'a> {
    selectors: &'a Selectors,
    timeout: Duration,
    stats: &'a StatsTracker,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(selectors: &'a Selectors, timings: &Timings, stats: &'a StatsTracker) -> Self {
        Self {
            selectors,
            timeout: timings.field(),
            stats,
        }
    }

    async fn present(&self, page: &mut dyn PageQuery, selector: &str) -> PageResult<()> {
        if self.timeout.is_zero() {
            return Ok(());
        }
        page.wait_for(selector, self.timeout).await
    }

    fn resolve(&self, read: FieldRead, selector: &str) -> String {
        match read {
            FieldRead::Unavailable(PageError::NotFound { .. })
            | FieldRead::Unavailable(PageError::Timeout { .. }) => String::new(),
            FieldRead::Unavailable(e) => {
                debug!("Field `{}` unavailable: {}", selector, e);
                self.stats.record_unavailable_field();
                String::new()
            }
            read => read.into_text(),
        }
    }

    pub(crate) async fn text(&self, page: &mut dyn PageQuery, selector: &str) -> String {
        let read = match self.present(page, selector).await {
            Ok(()) => FieldRead::from_result(page.read_text(&Target::css(selector)).await),
            Err(e) => FieldRead::Unavailable(e),
        };
        self.resolve(read, selector)
    }

    pub(crate) async fn attribute(
        &self,
        page: &mut dyn PageQuery,
        selector: &str,
        name: &str,
    ) -> String {
        let read = match self.present(page, selector).await {
            Ok(()) => FieldRead::from_result(
                page.read_attribute(&Target::css(selector), name).await,
            ),
            Err(e) => FieldRead::Unavailable(e),
        };
        self.resolve(read, selector)
    }

    pub(crate) async fn name(&self, page: &mut dyn PageQuery) -> String {
        self.text(page, &self.selectors.heading).await
    }

    pub(crate) async fn address(&self, page: &mut dyn PageQuery) -> String {
        self.text(page, &self.selectors.address).await
    }

    /// Fills phone, website, page URL and category.
    pub(crate) async fn contact(&self, page: &mut dyn PageQuery, record: &mut ListingRecord) {
        record.phone = self.text(page, &self.selectors.phone).await;
        record.website = self
            .attribute(
                page,
                &self.selectors.website,
                &self.selectors.website_attribute,
            )
            .await;
        record.maps_url = self.resolve(
            FieldRead::from_result(page.current_url().await.map(Some)),
            "current url",
        );
        record.category = self.text(page, &self.selectors.category).await;
    }

    /// Every field of the open listing, without any region check.
    pub(crate) async fn full(&self, page: &mut dyn PageQuery, queried_as: &str) -> ListingRecord {
        let mut record = ListingRecord::new(queried_as);
        record.name = self.name(page).await;
        record.address = self.address(page).await;
        self.contact(page, &mut record).await;
        record
    }
}
