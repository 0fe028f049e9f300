pub mod chromium;
pub mod fixture;
mod query;

pub use chromium::{ChromiumLauncher, ChromiumPage};
pub use fixture::{FixturePage, FixtureSite, Journal, PageAction};
pub use query::{FieldRead, PageError, PageQuery, PageResult, Target};

use crate::core::config::SessionConfig;
use crate::ScraperResult;
use async_trait::async_trait;

/// Opens the page a run drives. The run owns the page until it closes it.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, config: &SessionConfig) -> ScraperResult<Box<dyn PageQuery>>;
}
