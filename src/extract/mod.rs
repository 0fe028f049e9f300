mod fields;
pub mod listing;
pub mod related;

#[cfg(test)]
mod tests;

pub use listing::ListingExtractor;
pub use related::{DiscoveryScope, RelatedDiscovery};
