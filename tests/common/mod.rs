//! Scripted in-memory renderer shared by the integration tests
//!
//! A `FakeSite` maps URLs to a sequence of HTML snapshots. Navigating shows
//! the first snapshot; clicking a matching element advances to the next one.
//! DOM queries run against the current snapshot with `scraper`.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_harvest::config::{Config, SiteConfig};
use catalog_harvest::render::{
    BrowserHandle, BrowserLauncher, HeaderSet, PageQuery, RenderError, RenderResult,
};
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const INDEX_URL: &str = "https://shop.example/gb/index.html";
pub const LINK_BASE: &str = "https://shop.example/gb/";

/// Builds a config whose checkpoints live in `dir` and whose waits are instant
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::new(SiteConfig {
        index_url: INDEX_URL.to_string(),
        link_base: LINK_BASE.to_string(),
    });
    config.paths.base_urls_file = dir.path().join("base_urls").join("base_urls.txt");
    config.paths.endpoints_dir = dir.path().join("product_endpoints");
    config.paths.products_file = dir.path().join("data").join("products_data.txt");
    config.crawler.click_settle_ms = 0;
    config.crawler.post_click_ms = 0;
    config
}

#[derive(Default)]
struct Script {
    snapshots: HashMap<String, Vec<String>>,
    failing_navigation: HashSet<String>,
    blank_visits: HashMap<String, usize>,
    failing_clicks: HashSet<String>,
    delays: HashMap<String, Duration>,
}

/// Counters and scripted pages behind every fake browser
#[derive(Default)]
pub struct FakeSite {
    script: Mutex<Script>,
    pub launches: AtomicUsize,
    pub browser_closes: AtomicUsize,
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub clicks: AtomicUsize,
    open_pages: AtomicUsize,
    max_open_pages: AtomicUsize,
    visits: Mutex<Vec<String>>,
    headers: Mutex<Vec<HeaderSet>>,
}

impl FakeSite {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serves `html` for `url`
    pub fn page(&self, url: &str, html: impl Into<String>) -> &Self {
        self.pages(url, vec![html.into()])
    }

    /// Serves `snapshots[0]` for `url`, advancing one snapshot per click
    pub fn pages(&self, url: &str, snapshots: Vec<String>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .snapshots
            .insert(url.to_string(), snapshots);
        self
    }

    /// Makes navigation to `url` fail
    pub fn fail_navigation(&self, url: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .failing_navigation
            .insert(url.to_string());
        self
    }

    /// Serves an empty document for the first `visits` navigations to `url`
    pub fn blank_first_visits(&self, url: &str, visits: usize) -> &Self {
        self.script
            .lock()
            .unwrap()
            .blank_visits
            .insert(url.to_string(), visits);
        self
    }

    /// Makes clicks on `selector` fail
    pub fn fail_clicks_on(&self, selector: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .failing_clicks
            .insert(selector.to_string());
        self
    }

    /// Makes navigation to `url` take `delay` before it resolves
    pub fn delay_navigation(&self, url: &str, delay: Duration) -> &Self {
        self.script
            .lock()
            .unwrap()
            .delays
            .insert(url.to_string(), delay);
        self
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn browser_closes(&self) -> usize {
        self.browser_closes.load(Ordering::SeqCst)
    }

    pub fn pages_opened(&self) -> usize {
        self.pages_opened.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.pages_closed.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    /// Most pages that were open at the same time
    pub fn max_open_pages(&self) -> usize {
        self.max_open_pages.load(Ordering::SeqCst)
    }

    /// URLs navigated to, in order
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    /// Header sets installed on pages, in order
    pub fn headers(&self) -> Vec<HeaderSet> {
        self.headers.lock().unwrap().clone()
    }

    fn navigate(&self, url: &str) -> RenderResult<Vec<String>> {
        self.visits.lock().unwrap().push(url.to_string());

        let mut script = self.script.lock().unwrap();
        if script.failing_navigation.contains(url) {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        if let Some(remaining) = script.blank_visits.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(vec!["<html><body></body></html>".to_string()]);
            }
        }
        script
            .snapshots
            .get(url)
            .cloned()
            .ok_or_else(|| RenderError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })
    }

    fn delay_for(&self, url: &str) -> Option<Duration> {
        self.script.lock().unwrap().delays.get(url).copied()
    }

    fn click_fails(&self, selector: &str) -> bool {
        self.script.lock().unwrap().failing_clicks.contains(selector)
    }
}

pub struct FakeLauncher {
    pub site: Arc<FakeSite>,
}

impl FakeLauncher {
    pub fn new(site: Arc<FakeSite>) -> Self {
        Self { site }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    type Browser = FakeBrowser;

    async fn launch(&self) -> RenderResult<FakeBrowser> {
        self.site.launches.fetch_add(1, Ordering::SeqCst);
        Ok(FakeBrowser {
            site: Arc::clone(&self.site),
        })
    }
}

pub struct FakeBrowser {
    site: Arc<FakeSite>,
}

#[async_trait]
impl BrowserHandle for FakeBrowser {
    type Page = FakePage;

    async fn new_page(&self) -> RenderResult<FakePage> {
        self.site.pages_opened.fetch_add(1, Ordering::SeqCst);
        let open = self.site.open_pages.fetch_add(1, Ordering::SeqCst) + 1;
        self.site.max_open_pages.fetch_max(open, Ordering::SeqCst);
        Ok(FakePage {
            site: Arc::clone(&self.site),
            state: Mutex::new(PageState::default()),
        })
    }

    async fn close(self) -> RenderResult<()> {
        self.site.browser_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct PageState {
    snapshots: Vec<String>,
    current: usize,
}

impl PageState {
    fn html(&self) -> String {
        self.snapshots
            .get(self.current)
            .cloned()
            .unwrap_or_else(|| "<html></html>".to_string())
    }
}

pub struct FakePage {
    site: Arc<FakeSite>,
    state: Mutex<PageState>,
}

impl FakePage {
    fn matches(&self, selector: &str) -> RenderResult<usize> {
        let selector = Selector::parse(selector)
            .map_err(|e| RenderError::Script(format!("bad selector: {:?}", e)))?;
        let html = self.state.lock().unwrap().html();
        Ok(Html::parse_document(&html).select(&selector).count())
    }
}

#[async_trait]
impl PageQuery for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> RenderResult<()> {
        if let Some(delay) = self.site.delay_for(url) {
            tokio::time::sleep(delay).await;
        }
        let snapshots = self.site.navigate(url)?;
        *self.state.lock().unwrap() = PageState {
            snapshots,
            current: 0,
        };
        Ok(())
    }

    async fn content(&self) -> RenderResult<String> {
        Ok(self.state.lock().unwrap().html())
    }

    async fn is_present(&self, selector: &str) -> RenderResult<bool> {
        Ok(self.matches(selector)? > 0)
    }

    async fn count(&self, selector: &str) -> RenderResult<usize> {
        self.matches(selector)
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> RenderResult<()> {
        if self.matches(selector)? > 0 {
            Ok(())
        } else {
            Err(RenderError::timeout(format!("'{}' to be visible", selector), timeout))
        }
    }

    async fn wait_hidden(&self, selector: &str, timeout: Duration) -> RenderResult<()> {
        if self.matches(selector)? == 0 {
            Ok(())
        } else {
            Err(RenderError::timeout(format!("'{}' to be hidden", selector), timeout))
        }
    }

    async fn scroll_into_view(&self, selector: &str) -> RenderResult<()> {
        if self.matches(selector)? == 0 {
            return Err(RenderError::ElementNotFound(selector.to_string()));
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> RenderResult<()> {
        if self.matches(selector)? == 0 {
            return Err(RenderError::ElementNotFound(selector.to_string()));
        }
        if self.site.click_fails(selector) {
            return Err(RenderError::Interaction {
                selector: selector.to_string(),
                message: "element is not clickable".to_string(),
            });
        }

        self.site.clicks.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.current + 1 < state.snapshots.len() {
            state.current += 1;
        }
        Ok(())
    }

    async fn remove_all(&self, _selector: &str) -> RenderResult<()> {
        Ok(())
    }

    async fn set_extra_headers(&self, headers: &HeaderSet) -> RenderResult<()> {
        self.site.headers.lock().unwrap().push(headers.clone());
        Ok(())
    }

    async fn close(&self) -> RenderResult<()> {
        self.site.pages_closed.fetch_add(1, Ordering::SeqCst);
        self.site.open_pages.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Index page listing the given category hrefs
pub fn index_page(hrefs: &[&str]) -> String {
    let items: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<li class="link-list__item"><a class="link-list__text" href="{}">cat</a></li>"#,
                href
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="thomann-page-content-wrapper"><ul>{}</ul></div></body></html>"#,
        items
    )
}

/// Category listing with the given product hrefs and an optional load-more button
pub fn category_page(hrefs: &[&str], load_more: bool) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a class="js-item" href="{}">p</a>"#, href))
        .collect();
    let button = if load_more {
        r#"<button class="fx-product-grid__button js-button-more">Load more</button>"#
    } else {
        ""
    };
    format!(
        r#"<html><body><div class="js-content-wrapper"><div><div class="js-articles">{}</div></div></div>{}</body></html>"#,
        anchors, button
    )
}

/// Product page with the given title and price
pub fn product_page(title: &str, price: &str) -> String {
    format!(
        r#"<html><body><div class="thomann-page-content-wrapper">
        <div class="product-main-content fx-content-product-grid__col">
          <div class="fx-grid fx-grid--prod">
            <div class="fx-grid__col fx-col--lg-8">
              <div class="product-title"><h1 class="product-title__title">{}</h1></div>
            </div>
            <div class="fx-grid__col fx-col--lg-4">
              <div class="fx-position-sticky"><div class="product-price-box"><div class="price-and-availability">
                <div class="price-wrapper"><span class="price">{}</span></div>
              </div></div></div>
            </div>
          </div>
        </div>
        </div></body></html>"#,
        title, price
    )
}
