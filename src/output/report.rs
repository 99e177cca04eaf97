//! End-of-run report
//!
//! Formats what every stage of a run reported as a markdown summary.

use crate::crawler::{CategoryReport, RunReport};
use crate::state::CollectorOutcome;
use chrono::{DateTime, Utc};

/// When and with which configuration a run happened
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: String,
}

impl RunInfo {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Formats a run report as markdown
pub fn format_run_report(report: &RunReport, info: &RunInfo) -> String {
    let mut md = String::new();

    md.push_str("# Catalog-Harvest Run Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", info.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", info.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        info.duration_seconds()
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", info.config_hash));

    if let Some(server) = &report.diagnostics {
        md.push_str("## Diagnostics\n\n");
        md.push_str(&format!("- {}\n\n", server));
    }

    md.push_str("## Base URLs\n\n");
    match &report.base_urls {
        Some(CollectorOutcome::Success(written)) => {
            md.push_str(&format!("- **Written**: {}\n\n", written))
        }
        Some(outcome) => md.push_str(&format!("- **Result**: {}\n\n", outcome)),
        None => md.push_str("- not run\n\n"),
    }

    md.push_str("## Categories\n\n");
    match &report.categories {
        Some(categories) if !categories.is_empty() => {
            md.push_str("| Category | Attempts | Endpoints | New Rows | Ended |\n");
            md.push_str("|----------|----------|-----------|----------|-------|\n");
            for category in categories {
                md.push_str(&category_row(category));
            }
            let new_rows: usize = categories.iter().map(|c| c.new_rows).sum();
            md.push_str(&format!(
                "\n- **Total New Rows**: {}\n\n",
                new_rows
            ));
        }
        Some(_) => md.push_str("- no categories crawled\n\n"),
        None => md.push_str("- not run\n\n"),
    }

    md.push_str("## Products\n\n");
    match &report.products {
        Some(products) => {
            md.push_str(&format!("- **Fetched**: {}\n", products.fetched));
            md.push_str(&format!("- **Saved**: {}\n", products.saved));
            md.push_str(&format!("- **Duplicates**: {}\n", products.duplicates));
            md.push_str(&format!("- **To Retry**: {}\n\n", products.retries.len()));

            if !products.retries.is_empty() {
                md.push_str("### Retry List\n\n");
                for url in &products.retries {
                    md.push_str(&format!("- {}\n", url));
                }
                md.push('\n');
            }
        }
        None => md.push_str("- not run\n\n"),
    }

    if !report.failures.is_empty() {
        md.push_str("## Failed Stages\n\n");
        for failure in &report.failures {
            md.push_str(&format!("- **{}**: {}\n", failure.stage, failure.message));
        }
        md.push('\n');
    }

    md
}

fn category_row(category: &CategoryReport) -> String {
    let ended = category
        .end
        .map(|end| end.as_str())
        .unwrap_or("gave up");
    format!(
        "| {} | {} | {} | {} | {} |\n",
        category.slug, category.attempts, category.endpoints, category.new_rows, ended
    )
}

/// Prints a run report to stdout
pub fn print_run_report(report: &RunReport, info: &RunInfo) {
    print!("{}", format_run_report(report, info));
}
