use crate::model::SearchTerm;
use crate::ScraperResult;
use log::info;
use std::fs;
use std::path::Path;

/// Reads one company name per line, skipping blank lines.
pub fn load_terms<P: AsRef<Path>>(path: P) -> ScraperResult<Vec<SearchTerm>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let terms = parse_terms(&content);
    info!("Loaded {} terms from {}", terms.len(), path.display());
    Ok(terms)
}

pub fn parse_terms(content: &str) -> Vec<SearchTerm> {
    content
        .trim_start_matches('\u{feff}')
        .lines()
        .filter_map(SearchTerm::parse)
        .collect()
}
