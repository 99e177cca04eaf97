use crate::jitter::{random_small_timeout, randomize_timeout};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stages: StageConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl Config {
    /// Builds a configuration for `site` with every other section defaulted
    pub fn new(site: SiteConfig) -> Self {
        Self {
            stages: StageConfig::default(),
            site,
            paths: PathsConfig::default(),
            crawler: CrawlerConfig::default(),
            timeouts: TimeoutConfig::default(),
            browser: BrowserConfig::default(),
            selectors: SelectorConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

/// Per-stage enable flags
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Probe the diagnostics database before crawling
    pub diagnostics: bool,

    /// Collect category landing pages from the index page
    #[serde(rename = "collect-base-urls")]
    pub collect_base_urls: bool,

    /// Paginate every category and record product page URLs
    #[serde(rename = "collect-endpoints")]
    pub collect_endpoints: bool,

    /// Fetch product pages and extract product records
    #[serde(rename = "process-products")]
    pub process_products: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            diagnostics: false,
            collect_base_urls: true,
            collect_endpoints: true,
            process_products: true,
        }
    }
}

/// The crawled site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Page listing every top-level category
    #[serde(rename = "index-url")]
    pub index_url: String,

    /// Base that relative product links are resolved against
    #[serde(rename = "link-base")]
    pub link_base: String,
}

/// Checkpoint file locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    #[serde(rename = "base-urls-file")]
    pub base_urls_file: PathBuf,

    #[serde(rename = "endpoints-dir")]
    pub endpoints_dir: PathBuf,

    #[serde(rename = "products-file")]
    pub products_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_urls_file: PathBuf::from("base_urls/base_urls.txt"),
            endpoints_dir: PathBuf::from("product_endpoints"),
            products_file: PathBuf::from("data/products_data.txt"),
        }
    }
}

/// Crawl behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Attempts per category before giving up on it
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Product pages fetched concurrently per batch
    pub concurrency: usize,

    /// Pause between scrolling to "load more" and clicking it (milliseconds)
    #[serde(rename = "click-settle-ms")]
    pub click_settle_ms: u64,

    /// Pause after the loading overlay is gone, before recounting (milliseconds)
    #[serde(rename = "post-click-ms")]
    pub post_click_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            concurrency: 3,
            click_settle_ms: 1000,
            post_click_ms: 2000,
        }
    }
}

impl CrawlerConfig {
    /// Settle pause jittered up to half again its configured length
    pub fn click_settle(&self) -> Duration {
        random_small_timeout(
            self.click_settle_ms,
            self.click_settle_ms.saturating_mul(3) / 2,
        )
    }

    pub fn post_click(&self) -> Duration {
        Duration::from_millis(self.post_click_ms)
    }
}

/// Inclusive millisecond bounds for a randomized timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimeoutRange {
    pub min: u64,
    pub max: u64,
}

impl TimeoutRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// A range that always yields the same value
    pub const fn fixed(ms: u64) -> Self {
        Self { min: ms, max: ms }
    }

    /// Draws a jittered duration from this range
    pub fn pick(&self) -> Duration {
        randomize_timeout(self.min, self.max)
    }
}

/// Timeout bounds per operation class, all in milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    #[serde(rename = "index-navigation")]
    pub index_navigation: TimeoutRange,

    #[serde(rename = "index-content")]
    pub index_content: TimeoutRange,

    #[serde(rename = "category-navigation")]
    pub category_navigation: TimeoutRange,

    #[serde(rename = "category-grid")]
    pub category_grid: TimeoutRange,

    #[serde(rename = "product-navigation")]
    pub product_navigation: TimeoutRange,

    #[serde(rename = "product-content")]
    pub product_content: TimeoutRange,

    pub consent: TimeoutRange,

    pub overlay: TimeoutRange,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            index_navigation: TimeoutRange::fixed(30_000),
            index_content: TimeoutRange::fixed(30_000),
            category_navigation: TimeoutRange::new(60_000, 80_000),
            category_grid: TimeoutRange::new(30_000, 50_000),
            product_navigation: TimeoutRange::new(40_000, 60_000),
            product_content: TimeoutRange::fixed(30_000),
            consent: TimeoutRange::fixed(5_000),
            overlay: TimeoutRange::fixed(10_000),
        }
    }
}

/// Headless browser launch options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,

    /// Path to a Chrome/Chromium executable; auto-detected when unset
    pub executable: Option<PathBuf>,

    /// Extra command-line switches passed to the browser
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            args: vec![
                "--disable-web-security".to_string(),
                "--disable-features=IsolateOrigins,site-per-process".to_string(),
            ],
        }
    }
}

/// CSS selectors the crawl depends on
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    #[serde(rename = "content-wrapper")]
    pub content_wrapper: String,

    #[serde(rename = "category-link")]
    pub category_link: String,

    #[serde(rename = "article-grid")]
    pub article_grid: String,

    #[serde(rename = "article-anchor")]
    pub article_anchor: String,

    #[serde(rename = "load-more")]
    pub load_more: String,

    #[serde(rename = "loading-overlay")]
    pub loading_overlay: String,

    #[serde(rename = "loading-indicator")]
    pub loading_indicator: String,

    #[serde(rename = "consent-button")]
    pub consent_button: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            content_wrapper: ".thomann-page-content-wrapper".to_string(),
            category_link: ".link-list__item a.link-list__text".to_string(),
            article_grid: "div.js-content-wrapper div div.js-articles".to_string(),
            article_anchor: "div.js-content-wrapper div.js-articles a.js-item".to_string(),
            load_more: "button.fx-product-grid__button.js-button-more".to_string(),
            loading_overlay: "div.js-content-wrapper.fx-overlay-loading.fx-overlay-loading--vanilla.fx-overlay-loading--bottom".to_string(),
            loading_indicator: "img.fx-overlay-loading__indicator".to_string(),
            consent_button:
                "button.spicy-consent-bar__action.spicy-consent-bar__action--as-text.consent-button"
                    .to_string(),
        }
    }
}

/// Diagnostics database handshake
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Environment variable holding the connection string
    #[serde(rename = "connection-env")]
    pub connection_env: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            connection_env: "CATALOG_HARVEST_DB".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_settle_jitter_bounds() {
        let crawler = CrawlerConfig::default();
        for _ in 0..50 {
            let settle = crawler.click_settle().as_millis() as u64;
            assert!((1000..=1500).contains(&settle));
            assert_eq!((settle - 1000) % 150, 0);
        }
    }

    #[test]
    fn test_click_settle_huge_value_does_not_overflow() {
        let crawler = CrawlerConfig {
            click_settle_ms: u64::MAX,
            ..CrawlerConfig::default()
        };
        assert_eq!(crawler.click_settle(), Duration::from_millis(u64::MAX));
    }
}
