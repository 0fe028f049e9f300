//! Chromium-backed page using chromiumoxide.

use super::query::{PageError, PageQuery, PageResult, Target};
use super::BrowserLauncher;
use crate::core::config::{BrowserSettings, SessionConfig};
use crate::{ScraperError, ScraperResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ChromiumPage {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    poll_interval: Duration,
}

impl ChromiumPage {
    pub async fn launch(settings: &BrowserSettings, poll_interval: Duration) -> ScraperResult<Self> {
        let mut builder = BrowserConfig::builder().window_size(1280, 900);
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(ScraperError::BrowserError)?;

        info!(
            "Launching Chromium ({})",
            if settings.headless { "headless" } else { "visible" }
        );
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::BrowserError(format!("failed to launch Chromium: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserError(format!("failed to open page: {}", e)))?;

        Ok(Self {
            browser,
            page,
            handler,
            poll_interval,
        })
    }

    async fn element(&self, target: &Target) -> PageResult<Element> {
        let mut matches = self
            .page
            .find_elements(target.selector.as_str())
            .await
            .map_err(|e| lookup_error(e, target))?;
        if target.nth >= matches.len() {
            return Err(target.not_found());
        }
        let element = matches.swap_remove(target.nth);

        match &target.descendant {
            Some(inner) => element
                .find_element(inner.as_str())
                .await
                .map_err(|e| lookup_error(e, target)),
            None => Ok(element),
        }
    }
}

fn driver(e: impl std::fmt::Display) -> PageError {
    PageError::Driver(e.to_string())
}

/// Only a missing node counts as an absent element. A bad selector or a
/// broken connection is reported as such.
fn lookup_error(e: CdpError, target: &Target) -> PageError {
    match e {
        CdpError::NotFound => target.not_found(),
        CdpError::Chrome(err) if is_missing_node(&err.message) => target.not_found(),
        CdpError::Chrome(err) if err.message.contains("is not a valid selector") => {
            PageError::InvalidSelector(err.message)
        }
        e => driver(e),
    }
}

fn is_missing_node(message: &str) -> bool {
    message.contains("Could not find node") || message.contains("No node with given id")
}

#[async_trait]
impl PageQuery for ChromiumPage {
    async fn navigate(&mut self, url: &Url) -> PageResult<()> {
        match tokio::time::timeout(NAVIGATION_TIMEOUT, self.page.goto(url.as_str())).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(PageError::Navigation(e.to_string())),
            Err(_) => Err(PageError::Navigation(format!(
                "timed out after {}s loading {}",
                NAVIGATION_TIMEOUT.as_secs(),
                url
            ))),
        }
    }

    async fn fill(&mut self, selector: &str, text: &str) -> PageResult<()> {
        let element = self.element(&Target::css(selector)).await?;
        element.click().await.map_err(driver)?;
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await
            .map_err(driver)?;
        element.type_str(text).await.map_err(driver)?;
        Ok(())
    }

    async fn press_enter(&mut self, selector: &str) -> PageResult<()> {
        let element = self.element(&Target::css(selector)).await?;
        element.press_key("Enter").await.map_err(driver)?;
        Ok(())
    }

    async fn click(&mut self, target: &Target) -> PageResult<()> {
        let element = self.element(target).await?;
        element.click().await.map_err(driver)?;
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> PageResult<usize> {
        match self.page.find_elements(selector).await {
            Ok(elements) => Ok(elements.len()),
            Err(e) => match lookup_error(e, &Target::css(selector)) {
                PageError::NotFound { .. } => Ok(0),
                e => Err(e),
            },
        }
    }

    async fn read_text(&mut self, target: &Target) -> PageResult<Option<String>> {
        let element = self.element(target).await?;
        element.inner_text().await.map_err(driver)
    }

    async fn read_attribute(
        &mut self,
        target: &Target,
        name: &str,
    ) -> PageResult<Option<String>> {
        let element = self.element(target).await?;
        element.attribute(name).await.map_err(driver)
    }

    async fn current_url(&mut self) -> PageResult<String> {
        self.page
            .url()
            .await
            .map(|url| url.unwrap_or_default())
            .map_err(driver)
    }

    async fn close(&mut self) -> PageResult<()> {
        if let Err(e) = self.page.clone().close().await {
            warn!("Failed to close page: {}", e);
        }
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        info!("Browser closed");
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher;

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, config: &SessionConfig) -> ScraperResult<Box<dyn PageQuery>> {
        let page = ChromiumPage::launch(&config.browser, config.timings.poll()).await?;
        Ok(Box::new(page))
    }
}
