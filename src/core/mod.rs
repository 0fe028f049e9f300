pub mod config;
mod control;
mod errors;
mod events;
mod session;


pub use config::{BrowserSettings, DiscoveryMode, SessionConfig, Selectors, Timings};
pub use control::{SessionState, StopHandle};
pub use errors::{ScraperError, ScraperResult};
pub use events::{EventSender, SessionEvent};
pub use session::{RunSummary, ScrapeSession};
