pub mod app;
pub mod core;
pub mod extract;
pub mod input;
pub mod model;
pub mod page;
pub mod stats;
pub mod storage;

pub use app::Controller;
pub use self::core::{
    DiscoveryMode, EventSender, RunSummary, ScrapeSession, ScraperError, ScraperResult,
    SessionConfig, SessionEvent, SessionState, StopHandle,
};
pub use extract::{ListingExtractor, RelatedDiscovery};
pub use model::{ListingRecord, RegionConfig, RowTag, SearchTerm};
pub use page::{BrowserLauncher, ChromiumLauncher, PageQuery};
pub use stats::StatsTracker;
pub use storage::{RecordSink, XlsxSink};
