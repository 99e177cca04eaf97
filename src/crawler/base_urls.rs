//! Base-URL collection: the category landing pages linked from the index

use crate::config::Config;
use crate::crawler::parser::collect_absolute_links;
use crate::progress::Progress;
use crate::render::{dismiss_consent, BrowserHandle, BrowserLauncher, PageQuery};
use crate::state::{CollectorOutcome, CollectorState};
use crate::storage::save_base_urls;
use tracing::{error, info, warn};

/// One-shot crawl of the index page
pub struct BaseUrlCollector<'a, L: BrowserLauncher> {
    config: &'a Config,
    launcher: &'a L,
    progress: &'a dyn Progress,
}

impl<'a, L: BrowserLauncher> BaseUrlCollector<'a, L> {
    pub fn new(config: &'a Config, launcher: &'a L, progress: &'a dyn Progress) -> Self {
        Self {
            config,
            launcher,
            progress,
        }
    }

    /// Collects category URLs and overwrites the base-URL file
    ///
    /// Never fails: every error is logged and folded into the outcome. The
    /// browser is closed on every path.
    pub async fn collect(&self, enabled: bool) -> CollectorOutcome {
        if !enabled {
            info!("Base-URL collection disabled");
            return CollectorOutcome::Disabled;
        }

        self.progress.start("Collecting base URLs");

        let outcome = match self.launcher.launch().await {
            Ok(browser) => {
                let outcome = self.collect_with(&browser).await;
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {}", e);
                }
                outcome
            }
            Err(e) => CollectorOutcome::Failed {
                state: CollectorState::Navigating,
                message: e.to_string(),
            },
        };

        self.progress.stop();

        match &outcome {
            CollectorOutcome::Success(_) => info!("Base URLs successfully scraped and saved"),
            CollectorOutcome::Empty => warn!("No valid URLs found"),
            CollectorOutcome::Failed { .. } => error!("Base-URL collection {}", outcome),
            CollectorOutcome::Disabled => {}
        }
        outcome
    }

    async fn collect_with(&self, browser: &L::Browser) -> CollectorOutcome {
        let failed = |state: CollectorState, e: &dyn std::fmt::Display| CollectorOutcome::Failed {
            state,
            message: e.to_string(),
        };

        let page = match browser.new_page().await {
            Ok(page) => page,
            Err(e) => return failed(CollectorState::Navigating, &e),
        };

        let index_url = &self.config.site.index_url;
        let timeouts = &self.config.timeouts;
        let selectors = &self.config.selectors;

        info!("Navigating to {}", index_url);
        if let Err(e) = page.goto(index_url, timeouts.index_navigation.pick()).await {
            return failed(CollectorState::Navigating, &e);
        }

        if let Err(e) = page
            .wait_visible(&selectors.content_wrapper, timeouts.index_content.pick())
            .await
        {
            return failed(CollectorState::WaitingContent, &e);
        }
        dismiss_consent(&page, &selectors.consent_button, timeouts.consent.pick()).await;

        let html = match page.content().await {
            Ok(html) => html,
            Err(e) => return failed(CollectorState::Extracting, &e),
        };

        let urls = collect_absolute_links(&html, &selectors.category_link);
        if urls.is_empty() {
            return CollectorOutcome::Empty;
        }

        match save_base_urls(&self.config.paths.base_urls_file, &urls) {
            Ok(written) => CollectorOutcome::Success(written),
            Err(e) => failed(CollectorState::Extracting, &e),
        }
    }
}
