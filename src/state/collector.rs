//! Base-URL collection phases
//!
//! A disabled collector returns `CollectorOutcome::Disabled` without
//! launching a browser; otherwise it walks
//! `Navigating -> WaitingContent -> Extracting` and finishes in one of the
//! terminal outcomes.

use std::fmt;

/// Phase the collector is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorState {
    Navigating,
    WaitingContent,
    Extracting,
}

impl fmt::Display for CollectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Navigating => "navigating",
            Self::WaitingContent => "waiting_content",
            Self::Extracting => "extracting",
        };
        write!(f, "{}", label)
    }
}

/// How a base-URL collection run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorOutcome {
    /// The stage was switched off
    Disabled,

    /// This many URLs were written
    Success(usize),

    /// The page loaded but held no valid category links
    Empty,

    /// An error stopped the collection in the given phase
    Failed {
        state: CollectorState,
        message: String,
    },
}

impl CollectorOutcome {
    /// True iff at least one URL was written
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Success(n) if *n > 0)
    }
}

impl fmt::Display for CollectorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Success(n) => write!(f, "{} base URLs written", n),
            Self::Empty => write!(f, "no valid URLs found"),
            Self::Failed { state, message } => write!(f, "failed while {}: {}", state, message),
        }
    }
}
