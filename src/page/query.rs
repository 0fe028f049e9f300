use async_trait::async_trait;
use log::trace;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use url::Url;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("no element matches `{selector}`")]
    NotFound { selector: String },
    #[error("`{selector}` did not appear within {waited_ms}ms")]
    Timeout { selector: String, waited_ms: u64 },
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    #[error("driver error: {0}")]
    Driver(String),
}

pub type PageResult<T> = Result<T, PageError>;

/// Addresses one element: the `nth` match of `selector`, optionally narrowed
/// to the first match of `descendant` inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub selector: String,
    pub nth: usize,
    pub descendant: Option<String>,
}

impl Target {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            nth: 0,
            descendant: None,
        }
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.nth = index;
        self
    }

    pub fn descendant(mut self, selector: impl Into<String>) -> Self {
        self.descendant = Some(selector.into());
        self
    }

    pub(crate) fn not_found(&self) -> PageError {
        let selector = match &self.descendant {
            Some(inner) => format!("{}[{}] {}", self.selector, self.nth, inner),
            None => format!("{}[{}]", self.selector, self.nth),
        };
        PageError::NotFound { selector }
    }
}

/// Outcome of reading a single field off the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRead {
    Value(String),
    Empty,
    Unavailable(PageError),
}

impl FieldRead {
    pub fn from_result(result: PageResult<Option<String>>) -> Self {
        match result {
            Ok(Some(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    FieldRead::Empty
                } else {
                    FieldRead::Value(text.to_string())
                }
            }
            Ok(None) => FieldRead::Empty,
            Err(e) => FieldRead::Unavailable(e),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            FieldRead::Value(text) => text,
            _ => String::new(),
        }
    }
}

/// Narrow capability over a browser-controlled page.
///
/// Every operation reports failure through [`PageError`] instead of panicking
/// so callers decide per field whether a failure matters.
#[async_trait]
pub trait PageQuery: Send {
    async fn navigate(&mut self, url: &Url) -> PageResult<()>;
    async fn fill(&mut self, selector: &str, text: &str) -> PageResult<()>;
    async fn press_enter(&mut self, selector: &str) -> PageResult<()>;
    async fn click(&mut self, target: &Target) -> PageResult<()>;
    async fn count(&mut self, selector: &str) -> PageResult<usize>;
    async fn read_text(&mut self, target: &Target) -> PageResult<Option<String>>;
    async fn read_attribute(&mut self, target: &Target, name: &str)
        -> PageResult<Option<String>>;
    async fn current_url(&mut self) -> PageResult<String>;
    async fn close(&mut self) -> PageResult<()>;

    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Polls until `selector` matches at least one element or `timeout` runs out.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> PageResult<()> {
        let started = Instant::now();
        loop {
            if self.count(selector).await? > 0 {
                return Ok(());
            }
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(PageError::Timeout {
                    selector: selector.to_string(),
                    waited_ms: waited.as_millis() as u64,
                });
            }
            sleep(self.poll_interval().min(timeout - waited)).await;
        }
    }

    /// Waits for the page to settle: returns as soon as any of `selectors`
    /// is present, or after `budget` without error. Returns the index of the
    /// selector that appeared.
    async fn settle(&mut self, selectors: &[&str], budget: Duration) -> Option<usize> {
        let started = Instant::now();
        loop {
            for (i, selector) in selectors.iter().enumerate() {
                if matches!(self.count(selector).await, Ok(n) if n > 0) {
                    trace!("Page settled on `{}` after {:?}", selector, started.elapsed());
                    return Some(i);
                }
            }
            let waited = started.elapsed();
            if waited >= budget {
                trace!("Page did not settle within {:?}", budget);
                return None;
            }
            sleep(self.poll_interval().min(budget - waited)).await;
        }
    }
}
