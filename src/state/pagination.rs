//! Terminal states of the category pagination loop
//!
//! Reaching any of these ends the attempt successfully; only a grid-wait
//! timeout or an error makes the crawler try the category again.

use std::fmt;

/// Why pagination of a category stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginationEnd {
    /// The "load more" control is no longer on the page
    NoMorePages,

    /// Clicking "load more" failed; treated as no progress
    ClickFailed,

    /// New anchors rendered but every URL was already known
    StalePage,

    /// The anchor count did not increase after a click
    NoGrowth,
}

impl PaginationEnd {
    /// Returns the label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoMorePages => "no_more_pages",
            Self::ClickFailed => "click_failed",
            Self::StalePage => "stale_page",
            Self::NoGrowth => "no_growth",
        }
    }

    /// Parses a label produced by [`PaginationEnd::as_str`]
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "no_more_pages" => Some(Self::NoMorePages),
            "click_failed" => Some(Self::ClickFailed),
            "stale_page" => Some(Self::StalePage),
            "no_growth" => Some(Self::NoGrowth),
            _ => None,
        }
    }

    /// Returns true if the catalog was exhausted rather than cut short
    pub fn reached_end_of_catalog(&self) -> bool {
        matches!(self, Self::NoMorePages | Self::StalePage)
    }

    /// Returns all terminal states
    pub fn all() -> [Self; 4] {
        [
            Self::NoMorePages,
            Self::ClickFailed,
            Self::StalePage,
            Self::NoGrowth,
        ]
    }
}

impl fmt::Display for PaginationEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
