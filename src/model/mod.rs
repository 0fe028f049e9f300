pub mod locality;
pub mod record;
pub mod region;
pub mod terms;

pub use locality::{locality_of, LocalityTracker};
pub use record::{ListingRecord, RowTag, RELATED_LABEL};
pub use region::{RegionConfig, RegionFilter};
pub use terms::{KnownTerms, SearchTerm};
