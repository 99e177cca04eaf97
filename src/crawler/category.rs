//! Category endpoint crawling
//!
//! Every category listing shows a first page of products and a "load more"
//! button. The crawler clicks through it, persisting newly revealed product
//! URLs after each step, until the button disappears or a click stops
//! producing new products.
//!
//! Each attempt runs in a freshly launched browser. Only a grid that never
//! shows up (or an error) triggers another attempt.

use crate::config::Config;
use crate::crawler::parser::collect_resolved_links;
use crate::progress::Progress;
use crate::render::{dismiss_consent, wait_for_overlay, BrowserHandle, BrowserLauncher, PageQuery};
use crate::state::PaginationEnd;
use crate::storage::{load_base_urls, EndpointStore, StorageResult};
use crate::url::extract_endpoint_name;
use crate::Result;
use std::collections::HashSet;
use tokio::time::sleep;
use tracing::{error, info, warn};
use url::Url;

/// What happened to one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub base_url: String,
    pub slug: String,

    /// Attempts started, including the successful one
    pub attempts: u32,

    /// Distinct endpoints seen during this run
    pub endpoints: usize,

    /// Rows appended to the category's table
    pub new_rows: usize,

    /// Writes that appended at least one row
    pub persist_writes: usize,

    /// Terminal pagination state; `None` if every attempt failed
    pub end: Option<PaginationEnd>,
}

impl CategoryReport {
    fn new(base_url: &str, slug: String) -> Self {
        Self {
            base_url: base_url.to_string(),
            slug,
            attempts: 0,
            endpoints: 0,
            new_rows: 0,
            persist_writes: 0,
            end: None,
        }
    }
}

/// Paginates category listings and records their product URLs
pub struct CategoryCrawler<'a, L: BrowserLauncher> {
    config: &'a Config,
    launcher: &'a L,
    progress: &'a dyn Progress,
    store: EndpointStore,
    link_base: Url,
}

impl<'a, L: BrowserLauncher> CategoryCrawler<'a, L> {
    pub fn new(config: &'a Config, launcher: &'a L, progress: &'a dyn Progress) -> Result<Self> {
        Ok(Self {
            config,
            launcher,
            progress,
            store: EndpointStore::new(&config.paths.endpoints_dir),
            link_base: Url::parse(&config.site.link_base)?,
        })
    }

    /// Crawls every category listed in the base-URL file
    pub async fn run(&self) -> Result<Vec<CategoryReport>> {
        let base_urls = load_base_urls(&self.config.paths.base_urls_file)?;
        if base_urls.is_empty() {
            info!("No valid base URLs to process");
            return Ok(Vec::new());
        }

        let reports = self.crawl_all(&base_urls).await;
        info!("Endpoints extraction complete");
        Ok(reports)
    }

    /// Crawls `base_urls` one after the other
    pub async fn crawl_all(&self, base_urls: &[String]) -> Vec<CategoryReport> {
        let mut reports = Vec::with_capacity(base_urls.len());
        for base_url in base_urls {
            reports.push(self.crawl_category(base_url).await);
        }
        reports
    }

    /// Crawls one category, retrying with a new browser up to `max-retries` times
    pub async fn crawl_category(&self, base_url: &str) -> CategoryReport {
        let slug = extract_endpoint_name(base_url);
        let mut report = CategoryReport::new(base_url, slug.clone());
        let mut endpoints = HashSet::new();

        while report.attempts < self.config.crawler.max_retries {
            report.attempts += 1;
            let attempt = report.attempts;

            info!("> Extracting endpoints for {} (attempt {})", base_url, attempt);
            self.progress.start(&format!("Paginating {}", slug));

            let result = match self.launcher.launch().await {
                Ok(browser) => {
                    let result = self
                        .attempt(&browser, base_url, &mut endpoints, &mut report)
                        .await;
                    if let Err(e) = browser.close().await {
                        warn!("Failed to close browser: {}", e);
                    }
                    result
                }
                Err(e) => Err(e.into()),
            };

            self.progress.stop();

            match result {
                Ok(Some(end)) => {
                    info!("Pagination of {} ended: {}", slug, end);
                    report.end = Some(end);
                    break;
                }
                Ok(None) => continue,
                Err(e) => {
                    error!("Attempt {} for {} failed: {}", attempt, base_url, e);
                }
            }
        }

        if endpoints.is_empty() {
            info!("No endpoints found for {}", base_url);
        } else if let Err(e) = self.persist(&endpoints, &mut report) {
            error!("Final save for {} failed: {}", slug, e);
        }

        report.endpoints = endpoints.len();
        report
    }

    /// Runs one attempt in `browser`
    ///
    /// Returns `Ok(None)` when the article grid never became visible.
    async fn attempt(
        &self,
        browser: &L::Browser,
        base_url: &str,
        endpoints: &mut HashSet<String>,
        report: &mut CategoryReport,
    ) -> Result<Option<PaginationEnd>> {
        let timeouts = &self.config.timeouts;
        let selectors = &self.config.selectors;

        let page = browser.new_page().await?;
        page.goto(base_url, timeouts.category_navigation.pick()).await?;
        dismiss_consent(&page, &selectors.consent_button, timeouts.consent.pick()).await;

        if let Err(e) = page
            .wait_visible(&selectors.article_grid, timeouts.category_grid.pick())
            .await
        {
            if e.is_timeout() {
                error!(
                    "Article grid not visible (attempt {}): {}",
                    report.attempts, e
                );
                return Ok(None);
            }
            return Err(e.into());
        }

        let html = page.content().await?;
        endpoints.extend(collect_resolved_links(
            &html,
            &selectors.article_anchor,
            &self.link_base,
        ));
        info!("Initial endpoints collected: {}", endpoints.len());
        self.persist(endpoints, report)?;

        let end = self.paginate(&page, endpoints, report).await?;
        Ok(Some(end))
    }

    async fn paginate<P: PageQuery>(
        &self,
        page: &P,
        endpoints: &mut HashSet<String>,
        report: &mut CategoryReport,
    ) -> Result<PaginationEnd> {
        let selectors = &self.config.selectors;
        let crawler = &self.config.crawler;

        let mut known_count = page.count(&selectors.article_anchor).await?;

        loop {
            if !page.is_present(&selectors.load_more).await? {
                info!("No more button found");
                return Ok(PaginationEnd::NoMorePages);
            }

            if let Err(e) = page.scroll_into_view(&selectors.load_more).await {
                warn!("Could not scroll to load more button: {}", e);
                return Ok(PaginationEnd::ClickFailed);
            }
            sleep(crawler.click_settle()).await;

            if let Err(e) = page.click(&selectors.load_more).await {
                warn!("Load more click failed: {}", e);
                return Ok(PaginationEnd::ClickFailed);
            }

            wait_for_overlay(
                page,
                &selectors.loading_overlay,
                &selectors.loading_indicator,
                self.config.timeouts.overlay.pick(),
            )
            .await;
            sleep(crawler.post_click()).await;

            let current_count = page.count(&selectors.article_anchor).await?;
            if current_count <= known_count {
                info!("No new elements added after button click");
                return Ok(PaginationEnd::NoGrowth);
            }

            let html = page.content().await?;
            let fresh: HashSet<String> =
                collect_resolved_links(&html, &selectors.article_anchor, &self.link_base)
                    .into_iter()
                    .filter(|url| !endpoints.contains(url))
                    .collect();

            if fresh.is_empty() {
                info!("No new endpoints found after button click");
                return Ok(PaginationEnd::StalePage);
            }

            info!("Additional endpoints collected: {}", fresh.len());
            endpoints.extend(fresh);
            self.persist(endpoints, report)?;
            known_count = current_count;
        }
    }

    fn persist(&self, endpoints: &HashSet<String>, report: &mut CategoryReport) -> StorageResult<()> {
        let written = self.store.save(&report.slug, endpoints)?;
        if written > 0 {
            report.new_rows += written;
            report.persist_writes += 1;
        }
        Ok(())
    }
}
