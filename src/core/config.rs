use crate::model::RegionConfig;
use crate::{ScraperError, ScraperResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// How related businesses are discovered after a primary lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Primary records only.
    Off,
    /// Other cards already listed next to a found result.
    #[default]
    Siblings,
    /// One broadened search per newly seen locality.
    Locality,
}

/// Wait budgets in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub search_input_ms: u64,
    pub results_settle_ms: u64,
    pub detail_settle_ms: u64,
    pub card_settle_ms: u64,
    pub field_ms: u64,
    pub poll_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            search_input_ms: 3000,
            results_settle_ms: 4000,
            detail_settle_ms: 3000,
            card_settle_ms: 2000,
            field_ms: 1000,
            poll_ms: 100,
        }
    }
}

impl Timings {
    /// Budgets small enough for scripted pages.
    pub fn instant() -> Self {
        Self {
            search_input_ms: 5,
            results_settle_ms: 5,
            detail_settle_ms: 5,
            card_settle_ms: 5,
            field_ms: 0,
            poll_ms: 1,
        }
    }

    pub fn search_input(&self) -> Duration {
        Duration::from_millis(self.search_input_ms)
    }

    pub fn results_settle(&self) -> Duration {
        Duration::from_millis(self.results_settle_ms)
    }

    pub fn detail_settle(&self) -> Duration {
        Duration::from_millis(self.detail_settle_ms)
    }

    pub fn card_settle(&self) -> Duration {
        Duration::from_millis(self.card_settle_ms)
    }

    pub fn field(&self) -> Duration {
        Duration::from_millis(self.field_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

/// Page markup the extraction relies on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub search_input: String,
    pub first_result: String,
    pub heading: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub website_attribute: String,
    pub category: String,
    pub result_card: String,
    pub card_name: String,
    pub results_container: String,
    pub back_button: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            search_input: "input[name='q']".to_string(),
            first_result: ".hfpxzc".to_string(),
            heading: "h1.DUwDvf.lfPIob".to_string(),
            address: "button[data-item-id=\"address\"]".to_string(),
            phone: "button[data-item-id^=\"phone:\"]".to_string(),
            website: "a[data-item-id=\"authority\"]".to_string(),
            website_attribute: "href".to_string(),
            category: "button.DkEaL".to_string(),
            result_card: "div.Nv2PK".to_string(),
            card_name: "div[role=\"link\"] span".to_string(),
            results_container: "div[role=\"feed\"]".to_string(),
            back_button: "button[jsaction*=\"back\"]".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub executable: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub search_url: String,
    pub region: RegionConfig,
    pub discovery: DiscoveryMode,
    pub timings: Timings,
    pub selectors: Selectors,
    /// `{locality}` and `{region}` are substituted.
    pub locality_query_templates: Vec<String>,
    pub browser: BrowserSettings,
    pub output_file_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.google.com/maps".to_string(),
            region: RegionConfig::default(),
            discovery: DiscoveryMode::default(),
            timings: Timings::default(),
            selectors: Selectors::default(),
            locality_query_templates: vec![
                "Empresas en {locality} {region}".to_string(),
                "Negocios en {locality} {region}".to_string(),
            ],
            browser: BrowserSettings::default(),
            output_file_name: "empresas_info.xlsx".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ScraperResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ScraperResult<()> {
        self.search_url()?;
        if self.output_file_name.trim().is_empty() {
            return Err(ScraperError::ConfigError(
                "output_file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn search_url(&self) -> ScraperResult<Url> {
        Ok(Url::parse(&self.search_url)?)
    }

    pub fn with_search_url(mut self, url: &str) -> Self {
        self.search_url = url.to_string();
        self
    }

    pub fn with_region(mut self, region: RegionConfig) -> Self {
        self.region = region;
        self
    }

    pub fn with_discovery(mut self, mode: DiscoveryMode) -> Self {
        self.discovery = mode;
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }

    pub fn locality_queries(&self, locality: &str) -> Vec<String> {
        self.locality_query_templates
            .iter()
            .map(|t| {
                t.replace("{locality}", locality)
                    .replace("{region}", &self.region.qualifier)
                    .trim()
                    .to_string()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"discovery": "locality", "timings": {{"field_ms": 250}}, "region": {{"marker": "Portugal"}}}}"#
        )
        .unwrap();

        let config = SessionConfig::from_json_file(file.path()).unwrap();

        assert_eq!(config.discovery, DiscoveryMode::Locality);
        assert_eq!(config.timings.field_ms, 250);
        assert_eq!(config.timings.search_input_ms, 3000);
        assert_eq!(config.region.marker, "Portugal");
        assert_eq!(config.region.qualifier, "España");
        assert_eq!(config.selectors.heading, "h1.DUwDvf.lfPIob");
        assert_eq!(config.output_file_name, "empresas_info.xlsx");
    }

    #[test]
    fn test_invalid_search_url_is_rejected() {
        let config = SessionConfig::default().with_search_url("not a url");
        assert!(matches!(config.validate(), Err(ScraperError::UrlError(_))));
    }

    #[test]
    fn test_locality_queries() {
        let config = SessionConfig::default();
        assert_eq!(
            config.locality_queries("Tudela"),
            vec![
                "Empresas en Tudela España".to_string(),
                "Negocios en Tudela España".to_string()
            ]
        );
    }
}
