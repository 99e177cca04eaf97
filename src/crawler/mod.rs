//! Crawl stages and their orchestration
//!
//! Stages run in a fixed order and talk only through file checkpoints:
//! - `BaseUrlCollector` writes the base-URL file
//! - `CategoryCrawler` reads it and fills the endpoint tables
//! - `ProductPipeline` reads the tables and appends product records
//!
//! A failing stage is logged and recorded in the [`RunReport`]; later
//! stages still run against whatever checkpoints exist.

mod base_urls;
mod category;
mod parser;
mod pipeline;

pub use base_urls::BaseUrlCollector;
pub use category::{CategoryCrawler, CategoryReport};
pub use parser::{collect_absolute_links, collect_resolved_links, extract_hrefs};
pub use pipeline::{PipelineReport, ProductPipeline};

use crate::config::{Config, StageConfig};
use crate::diagnostics::{self, ServerInfo};
use crate::progress::Progress;
use crate::render::BrowserLauncher;
use crate::state::CollectorOutcome;
use tracing::{error, info};

/// A stage that ended in an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: &'static str,
    pub message: String,
}

/// Everything the stages of one run reported
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub diagnostics: Option<ServerInfo>,
    pub base_urls: Option<CollectorOutcome>,
    pub categories: Option<Vec<CategoryReport>>,
    pub products: Option<PipelineReport>,
    pub failures: Vec<StageFailure>,
}

impl RunReport {
    fn fail(&mut self, stage: &'static str, message: impl ToString) {
        let message = message.to_string();
        error!("Stage {} failed: {}", stage, message);
        self.failures.push(StageFailure { stage, message });
    }
}

/// Runs the enabled stages in order
pub async fn run_stages<L: BrowserLauncher>(
    config: &Config,
    stages: &StageConfig,
    launcher: &L,
    progress: &dyn Progress,
) -> RunReport {
    let mut report = RunReport::default();

    if stages.diagnostics {
        match diagnostics::probe(&config.diagnostics) {
            Ok(server) => report.diagnostics = Some(server),
            Err(e) => report.fail("diagnostics", e),
        }
    } else {
        info!("Connection to diagnostics database is disabled");
    }

    let outcome = BaseUrlCollector::new(config, launcher, progress)
        .collect(stages.collect_base_urls)
        .await;
    if let CollectorOutcome::Failed { .. } = &outcome {
        report.fail("collect-base-urls", &outcome);
    }
    report.base_urls = Some(outcome);

    if stages.collect_endpoints {
        let result = match CategoryCrawler::new(config, launcher, progress) {
            Ok(crawler) => crawler.run().await,
            Err(e) => Err(e),
        };
        match result {
            Ok(categories) => report.categories = Some(categories),
            Err(e) => report.fail("collect-endpoints", e),
        }
    } else {
        info!("Product endpoint collection disabled");
    }

    if stages.process_products {
        match ProductPipeline::new(config, launcher, progress).run().await {
            Ok(products) => report.products = Some(products),
            Err(e) => report.fail("process-products", e),
        }
    } else {
        info!("Product processing is disabled");
    }

    report
}
