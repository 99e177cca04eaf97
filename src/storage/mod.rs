//! File checkpoints shared between crawl stages
//!
//! - `base_urls`: the category landing pages, one URL per line
//! - `endpoints`: per-category CSV tables of product page URLs
//! - `products`: extracted product records as JSON lines

mod base_urls;
mod endpoints;
mod error;
mod products;

pub use base_urls::{load_base_urls, save_base_urls};
pub use endpoints::{EndpointStore, ENDPOINT_COLUMN};
pub use error::{StorageError, StorageResult};
pub use products::{count_lines, ProductStore, SaveOutcome};

pub(crate) use endpoints::read_table;
