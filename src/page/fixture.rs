//! Scripted stand-in for a browser page.
//!
//! A [`FixtureSite`] maps search queries and listing names to HTML fragments.
//! [`FixturePage`] walks those fragments the way the map application behaves:
//! submitting a query shows a result screen, clicking a listing opens its
//! detail pane next to the results, and clicking an element carrying a
//! `data-back` attribute closes the pane again. Queries run against the
//! rendered fragments with real CSS selectors.

use super::query::{PageError, PageQuery, PageResult, Target};
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default)]
struct Screen {
    url: String,
    html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Navigate(String),
    Fill { selector: String, text: String },
    Submit(String),
    Open(String),
    Back,
    Close,
}

/// Shared record of every action a [`FixturePage`] performed.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<PageAction>>>);

impl Journal {
    fn push(&self, action: PageAction) {
        self.0.lock().push(action);
    }

    pub fn actions(&self) -> Vec<PageAction> {
        self.0.lock().clone()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter_map(|a| match a {
                PageAction::Submit(query) => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn opened(&self) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter_map(|a| match a {
                PageAction::Open(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn closed(&self) -> bool {
        self.0.lock().iter().any(|a| *a == PageAction::Close)
    }
}

#[derive(Debug, Clone)]
pub struct FixtureSite {
    home: Screen,
    searches: HashMap<String, Screen>,
    listings: HashMap<String, Screen>,
    broken_selectors: HashSet<String>,
    navigation_error: Option<String>,
}

impl Default for FixtureSite {
    fn default() -> Self {
        Self::new(r#"<form><input name="q" type="text"></form>"#)
    }
}

impl FixtureSite {
    pub fn new(home_html: impl Into<String>) -> Self {
        Self {
            home: Screen {
                url: "https://maps.example/".to_string(),
                html: home_html.into(),
            },
            searches: HashMap::new(),
            listings: HashMap::new(),
            broken_selectors: HashSet::new(),
            navigation_error: None,
        }
    }

    /// Screen shown after submitting `query` (matched case-insensitively).
    pub fn with_search(mut self, query: &str, html: impl Into<String>) -> Self {
        let url = format!(
            "https://maps.example/search/{}",
            query.replace(' ', "+")
        );
        self.searches.insert(
            query.to_lowercase(),
            Screen {
                url,
                html: html.into(),
            },
        );
        self
    }

    /// Detail pane opened by clicking an element labelled `name`.
    pub fn with_listing(mut self, name: &str, html: impl Into<String>) -> Self {
        let url = format!("https://maps.example/place/{}", name.replace(' ', "+"));
        self.listings.insert(
            name.to_lowercase(),
            Screen {
                url,
                html: html.into(),
            },
        );
        self
    }

    /// Reads against `selector` fail with a driver error.
    pub fn with_broken_selector(mut self, selector: &str) -> Self {
        self.broken_selectors.insert(selector.to_string());
        self
    }

    pub fn with_navigation_error(mut self, message: &str) -> Self {
        self.navigation_error = Some(message.to_string());
        self
    }
}

pub struct FixturePage {
    site: FixtureSite,
    base: Screen,
    detail: Option<Screen>,
    history: Vec<Option<Screen>>,
    pending: Option<String>,
    journal: Journal,
    poll_interval: Duration,
}

impl FixturePage {
    pub fn new(site: FixtureSite) -> Self {
        Self {
            site,
            base: Screen::default(),
            detail: None,
            history: Vec::new(),
            pending: None,
            journal: Journal::default(),
            poll_interval: Duration::from_millis(1),
        }
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    fn render(&self) -> Html {
        let detail = self.detail.as_ref().map(|s| s.html.as_str()).unwrap_or("");
        Html::parse_document(&format!(
            "<html><body><div id=\"fixture-base\">{}</div><div id=\"fixture-detail\">{}</div></body></html>",
            self.base.html, detail
        ))
    }

    fn check_broken(&self, selector: &str) -> PageResult<()> {
        if self.site.broken_selectors.contains(selector) {
            return Err(PageError::Driver(format!("read of `{}` failed", selector)));
        }
        Ok(())
    }

    fn with_element<T>(
        &self,
        target: &Target,
        f: impl FnOnce(ElementRef<'_>) -> T,
    ) -> PageResult<T> {
        self.check_broken(&target.selector)?;
        if let Some(inner) = &target.descendant {
            self.check_broken(inner)?;
        }

        let document = self.render();
        let outer = parse_selector(&target.selector)?;
        let element = document
            .select(&outer)
            .nth(target.nth)
            .ok_or_else(|| target.not_found())?;

        let element = match &target.descendant {
            Some(inner) => {
                let inner = parse_selector(inner)?;
                element
                    .select(&inner)
                    .next()
                    .ok_or_else(|| target.not_found())?
            }
            None => element,
        };

        Ok(f(element))
    }
}

fn parse_selector(selector: &str) -> PageResult<Selector> {
    Selector::parse(selector).map_err(|e| PageError::InvalidSelector(format!("{}: {}", selector, e)))
}

enum ClickEffect {
    Back,
    Open(String),
    Inert,
}

fn click_effect(element: ElementRef<'_>) -> ClickEffect {
    if element.value().attr("data-back").is_some() {
        return ClickEffect::Back;
    }

    if let Some(label) = element.value().attr("aria-label") {
        return ClickEffect::Open(label.trim().to_string());
    }

    let labelled = Selector::parse("[aria-label]")
        .ok()
        .and_then(|s| element.select(&s).next())
        .and_then(|e| e.value().attr("aria-label"));
    if let Some(label) = labelled {
        return ClickEffect::Open(label.trim().to_string());
    }

    let text = element.text().collect::<String>();
    if text.trim().is_empty() {
        ClickEffect::Inert
    } else {
        ClickEffect::Open(text.trim().to_string())
    }
}

#[async_trait]
impl PageQuery for FixturePage {
    async fn navigate(&mut self, url: &Url) -> PageResult<()> {
        self.journal.push(PageAction::Navigate(url.to_string()));
        if let Some(message) = &self.site.navigation_error {
            return Err(PageError::Navigation(message.clone()));
        }

        self.base = Screen {
            url: url.to_string(),
            html: self.site.home.html.clone(),
        };
        self.detail = None;
        self.history.clear();
        self.pending = None;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, text: &str) -> PageResult<()> {
        self.with_element(&Target::css(selector), |_| ())?;
        self.journal.push(PageAction::Fill {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        self.pending = Some(text.to_string());
        Ok(())
    }

    async fn press_enter(&mut self, selector: &str) -> PageResult<()> {
        self.with_element(&Target::css(selector), |_| ())?;
        let query = self.pending.take().unwrap_or_default();
        self.journal.push(PageAction::Submit(query.clone()));

        self.base = match self.site.searches.get(&query.to_lowercase()) {
            Some(screen) => screen.clone(),
            None => Screen {
                url: format!("https://maps.example/search/{}", query.replace(' ', "+")),
                html: String::new(),
            },
        };
        self.detail = None;
        self.history.clear();
        Ok(())
    }

    async fn click(&mut self, target: &Target) -> PageResult<()> {
        match self.with_element(target, click_effect)? {
            ClickEffect::Back => {
                self.journal.push(PageAction::Back);
                self.detail = self.history.pop().flatten();
            }
            ClickEffect::Open(label) => match self.site.listings.get(&label.to_lowercase()) {
                Some(screen) => {
                    self.journal.push(PageAction::Open(label));
                    let previous = self.detail.replace(screen.clone());
                    self.history.push(previous);
                }
                None => debug!("Fixture click on `{}` leads nowhere", label),
            },
            ClickEffect::Inert => {}
        }
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> PageResult<usize> {
        let document = self.render();
        let selector = parse_selector(selector)?;
        let count = document.select(&selector).count();
        Ok(count)
    }

    async fn read_text(&mut self, target: &Target) -> PageResult<Option<String>> {
        self.with_element(target, |e| Some(e.text().collect::<String>()))
    }

    async fn read_attribute(
        &mut self,
        target: &Target,
        name: &str,
    ) -> PageResult<Option<String>> {
        self.with_element(target, |e| e.value().attr(name).map(str::to_string))
    }

    async fn current_url(&mut self) -> PageResult<String> {
        Ok(match &self.detail {
            Some(screen) => screen.url.clone(),
            None => self.base.url.clone(),
        })
    }

    async fn close(&mut self) -> PageResult<()> {
        self.journal.push(PageAction::Close);
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
