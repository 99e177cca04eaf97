//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PaginationEnd`: why a category's "load more" loop stopped
//! - `CollectorState` / `CollectorOutcome`: phases and result of base-URL collection

mod collector;
mod pagination;

// Re-export main types
pub use collector::{CollectorOutcome, CollectorState};
pub use pagination::PaginationEnd;
