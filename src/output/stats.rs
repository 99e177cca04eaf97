//! Statistics over the persisted checkpoints
//!
//! Read-only: nothing here launches a browser or writes a file.

use crate::config::Config;
use crate::storage::{count_lines, load_base_urls, read_table, EndpointStore};
use crate::HarvestError;

/// Summary of what earlier runs left on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointStatistics {
    /// Lines in the base-URL file
    pub base_urls: usize,

    /// Rows per endpoint table, sorted by table name
    pub endpoint_tables: Vec<(String, usize)>,

    /// Distinct endpoints across all tables
    pub unique_endpoints: usize,

    /// Lines in the product store
    pub products: usize,
}

impl CheckpointStatistics {
    pub fn total_endpoint_rows(&self) -> usize {
        self.endpoint_tables.iter().map(|(_, rows)| rows).sum()
    }
}

/// Loads statistics for the checkpoint files named in `config`
pub fn load_statistics(config: &Config) -> Result<CheckpointStatistics, HarvestError> {
    let base_urls = if config.paths.base_urls_file.is_file() {
        load_base_urls(&config.paths.base_urls_file)?.len()
    } else {
        0
    };

    let store = EndpointStore::new(&config.paths.endpoints_dir);
    let mut endpoint_tables = Vec::new();
    let mut unique_endpoints = 0;
    if store.dir().is_dir() {
        for path in store.table_paths()? {
            let rows = if std::fs::metadata(&path)?.len() == 0 {
                0
            } else {
                match read_table(&path) {
                    Ok(rows) => rows.len(),
                    Err(e) => {
                        tracing::warn!("Skipping {}: {}", path.display(), e);
                        0
                    }
                }
            };
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            endpoint_tables.push((name, rows));
        }
        unique_endpoints = store.load_all()?.len();
    }

    let products = count_lines(&config.paths.products_file)?;

    Ok(CheckpointStatistics {
        base_urls,
        endpoint_tables,
        unique_endpoints,
        products,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CheckpointStatistics) {
    println!("=== Checkpoint Statistics ===\n");

    println!("Overview:");
    println!("  Base URLs: {}", stats.base_urls);
    println!(
        "  Endpoint rows: {} ({} unique)",
        stats.total_endpoint_rows(),
        stats.unique_endpoints
    );
    println!("  Product records: {}", stats.products);
    println!();

    if !stats.endpoint_tables.is_empty() {
        println!("Endpoint Tables ({}):", stats.endpoint_tables.len());
        let mut tables: Vec<_> = stats.endpoint_tables.iter().collect();
        tables.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (name, rows) in tables {
            println!("  {}: {}", name, rows);
        }
        println!();
    }

    let coverage = if stats.unique_endpoints > 0 {
        (stats.products as f64 / stats.unique_endpoints as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Coverage: {:.1}% ({} / {} endpoints have a record)",
        coverage.min(100.0),
        stats.products,
        stats.unique_endpoints
    );
}
