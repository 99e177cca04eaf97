//! Product pipeline: fetch product pages in bounded batches and store records
//!
//! All pages of a batch are fetched concurrently from one browser context
//! whose headers are drawn once per pipeline. Batches run strictly one after
//! another, and every page of a batch is closed before the next one starts.

use crate::config::Config;
use crate::extract::{extract_product_data, ProductData};
use crate::progress::Progress;
use crate::render::{
    dismiss_consent, BrowserContext, BrowserHandle, BrowserLauncher, HeaderSet, PageQuery,
    RenderError,
};
use crate::storage::{EndpointStore, ProductStore, SaveOutcome, StorageResult};
use crate::{HarvestError, Result};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

/// Counters for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Pages that yielded a product
    pub fetched: usize,

    /// Records appended to the product store
    pub saved: usize,

    /// Records skipped because an identical one was already saved
    pub duplicates: usize,

    /// URLs whose fetch, extraction or save failed, in input order
    pub retries: Vec<String>,
}

impl PipelineReport {
    /// True iff at least one record was newly persisted
    pub fn succeeded(&self) -> bool {
        self.saved > 0
    }
}

pub struct ProductPipeline<'a, L: BrowserLauncher> {
    config: &'a Config,
    launcher: &'a L,
    progress: &'a dyn Progress,
    store: ProductStore,
    headers: HeaderSet,
}

impl<'a, L: BrowserLauncher> ProductPipeline<'a, L> {
    pub fn new(config: &'a Config, launcher: &'a L, progress: &'a dyn Progress) -> Self {
        Self::with_headers(
            config,
            launcher,
            progress,
            HeaderSet::referred_navigation(&config.site.link_base),
        )
    }

    pub fn with_headers(
        config: &'a Config,
        launcher: &'a L,
        progress: &'a dyn Progress,
        headers: HeaderSet,
    ) -> Self {
        Self {
            config,
            launcher,
            progress,
            store: ProductStore::new(&config.paths.products_file),
            headers,
        }
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Every product URL recorded by the endpoint crawler, deduplicated
    pub fn load_endpoints(&self) -> StorageResult<Vec<String>> {
        EndpointStore::new(&self.config.paths.endpoints_dir).load_all()
    }

    /// Loads the recorded endpoints and processes them
    pub async fn run(&self) -> Result<PipelineReport> {
        let endpoints = self.load_endpoints()?;
        if endpoints.is_empty() {
            info!("No product endpoints to process");
            return Ok(PipelineReport::default());
        }

        self.process_endpoints(&endpoints, self.config.crawler.concurrency)
            .await
    }

    /// Fetches `endpoints` in batches of `concurrency` and saves each product
    ///
    /// A failing URL lands in the report's retry list without affecting the
    /// rest of its batch. Only a browser that cannot be launched fails the
    /// whole call.
    pub async fn process_endpoints(
        &self,
        endpoints: &[String],
        concurrency: usize,
    ) -> Result<PipelineReport> {
        let browser = self.launcher.launch().await?;
        let context = BrowserContext::new(&browser, self.headers.clone());

        let mut report = PipelineReport::default();
        let batches = endpoints.chunks(concurrency.max(1));
        let total = batches.len();

        for (index, batch) in batches.enumerate() {
            self.progress
                .start(&format!("Downloading batch {}/{}", index + 1, total));
            self.process_batch(&context, batch, &mut report).await;
            self.progress.stop();
        }

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser: {}", e);
        }

        info!(
            "Successfully processed {} endpoints ({} saved, {} duplicates, {} to retry)",
            report.fetched,
            report.saved,
            report.duplicates,
            report.retries.len()
        );
        Ok(report)
    }

    async fn process_batch(
        &self,
        context: &BrowserContext<'_, L::Browser>,
        batch: &[String],
        report: &mut PipelineReport,
    ) {
        let mut pages = Vec::with_capacity(batch.len());
        for _ in batch {
            pages.push(context.new_page().await);
        }

        let fetches = batch.iter().zip(&pages).map(|(url, page)| async move {
            match page {
                Ok(page) => self.fetch_product(page, url).await,
                Err(e) => Err(HarvestError::Render(RenderError::Protocol(format!(
                    "could not open page: {}",
                    e
                )))),
            }
        });
        let results = join_all(fetches).await;

        for page in pages.iter().flatten() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }

        for (url, result) in batch.iter().zip(results) {
            match result {
                Ok(data) => {
                    report.fetched += 1;
                    match self.store.save(&data) {
                        Ok(SaveOutcome::Saved) => report.saved += 1,
                        Ok(SaveOutcome::Duplicate) => report.duplicates += 1,
                        Err(e) => {
                            error!("Failed to save product from {}: {}", url, e);
                            report.retries.push(url.clone());
                        }
                    }
                }
                Err(e) => {
                    error!("Error fetching {}: {}", url, e);
                    report.retries.push(url.clone());
                }
            }
        }
    }

    async fn fetch_product<P: PageQuery>(&self, page: &P, url: &str) -> Result<ProductData> {
        let timeouts = &self.config.timeouts;
        let selectors = &self.config.selectors;

        debug!("Downloading {}", url);
        page.goto(url, timeouts.product_navigation.pick()).await?;
        dismiss_consent(page, &selectors.consent_button, timeouts.consent.pick()).await;
        page.wait_visible(&selectors.content_wrapper, timeouts.product_content.pick())
            .await?;

        let html = page.content().await?;
        match extract_product_data(&html) {
            Some(data) if !data.is_empty() => Ok(data),
            _ => Err(HarvestError::EmptyExtraction {
                url: url.to_string(),
            }),
        }
    }
}
