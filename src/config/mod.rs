//! Configuration module for Catalog-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Product batches hold {} pages", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, CrawlerConfig, DiagnosticsConfig, PathsConfig, SelectorConfig,
    SiteConfig, StageConfig, TimeoutConfig, TimeoutRange,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
