//! Catalog-Harvest: a staged product catalog crawler
//!
//! This crate discovers the category structure of a shop, paginates every
//! category listing through its "load more" control to collect product page
//! URLs, and extracts structured product records from each product page.
//!
//! Each stage persists its output to a file checkpoint that the next stage
//! consumes, so stages can be re-run independently.

pub mod config;
pub mod crawler;
pub mod diagnostics;
pub mod extract;
pub mod jitter;
pub mod output;
pub mod progress;
pub mod render;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Renderer error: {0}")]
    Render(#[from] render::RenderError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Diagnostics error: {0}")]
    Diagnostics(#[from] diagnostics::DiagnosticsError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("No product data could be extracted from {url}")]
    EmptyExtraction { url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{extract_product_data, ProductData, ProductRecord};
pub use state::{CollectorOutcome, PaginationEnd};
pub use crate::url::{extract_endpoint_name, is_valid_url};
