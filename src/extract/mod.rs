//! Product page extraction
//!
//! [`extract_product_data`] turns rendered HTML into raw [`ProductData`];
//! [`ProductRecord`] is its cleaned, persistable form with a content
//! fingerprint for deduplication.

mod product;
mod record;

pub use product::{extract_product_data, parse_product, ProductData, RankingData};
pub use record::{collapse_whitespace, fingerprint, ProductRecord, RankingRecord, NULL_SENTINEL};

use thiserror::Error;

/// Reasons a page is rejected as a product page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("{0} not found")]
    MissingContainer(&'static str),
}
