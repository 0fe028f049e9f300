use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Substring an address must contain to count as inside the region.
    pub marker: String,
    /// Appended to every search query.
    pub qualifier: String,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            marker: "España".to_string(),
            qualifier: "España".to_string(),
        }
    }
}

impl RegionConfig {
    pub fn named(region: &str) -> Self {
        Self {
            marker: region.to_string(),
            qualifier: region.to_string(),
        }
    }
}

/// Accepts a listing only if its address mentions the target region.
#[derive(Debug, Clone)]
pub struct RegionFilter {
    marker: String,
    qualifier: String,
    sentinel: String,
}

impl RegionFilter {
    pub fn new(config: &RegionConfig) -> Self {
        Self {
            marker: config.marker.to_lowercase(),
            qualifier: config.qualifier.clone(),
            sentinel: format!("No se encontró esta empresa en {}", config.marker),
        }
    }

    pub fn accepts(&self, address: &str) -> bool {
        !address.trim().is_empty() && address.to_lowercase().contains(&self.marker)
    }

    pub fn qualify(&self, query: &str) -> String {
        if self.qualifier.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query, self.qualifier)
        }
    }

    /// Name written in place of a listing rejected by the filter.
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }
}

impl Default for RegionFilter {
    fn default() -> Self {
        Self::new(&RegionConfig::default())
    }
}
