//! Output module for reports and checkpoint statistics
//!
//! This module handles:
//! - Formatting the end-of-run report
//! - Summarizing the persisted checkpoint files (`--stats`)

mod report;
pub mod stats;

pub use report::{format_run_report, print_run_report, RunInfo};
pub use stats::{load_statistics, print_statistics, CheckpointStatistics};
