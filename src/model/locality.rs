use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static POSTAL_LOCALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{5}\s+(.+)$").expect("postal code pattern is a valid regex")
});

/// Derives the town an address belongs to.
///
/// Looks for a `<postal code> <locality>` segment first, then falls back to
/// the second-to-last comma separated segment. Addresses with fewer than two
/// segments yield an empty string.
pub fn locality_of(address: &str) -> String {
    let segments: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if segments.len() < 2 {
        return String::new();
    }

    for segment in &segments {
        if let Some(caps) = POSTAL_LOCALITY.captures(segment) {
            return caps[1].trim().to_string();
        }
    }

    segments[segments.len() - 2].to_string()
}

/// Localities that already had a related-business sweep during this run.
#[derive(Debug, Default)]
pub struct LocalityTracker {
    visited: HashSet<String>,
}

impl LocalityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a locality is seen (case-insensitive).
    pub fn first_visit(&mut self, locality: &str) -> bool {
        let key = locality.trim().to_lowercase();
        if key.is_empty() {
            return false;
        }
        self.visited.insert(key)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}
