//! Rendering layer: headless browser sessions behind a page-query interface
//!
//! Crawl logic never touches the browser directly. It talks to three traits:
//! - [`BrowserLauncher`] starts a browser process
//! - [`BrowserHandle`] opens pages and shuts the browser down
//! - [`PageQuery`] is the narrow DOM capability a crawl stage needs
//!
//! [`chromium`] implements them over the Chrome DevTools Protocol; tests
//! implement them with scripted HTML.

pub mod chromium;
mod headers;
mod session;

pub use chromium::{ChromiumBrowser, ChromiumLauncher, ChromiumPage};
pub use headers::{HeaderSet, USER_AGENTS};
pub use session::{dismiss_consent, wait_for_overlay, BrowserContext};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a renderer
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {}ms waiting for {what}", .after.as_millis())]
    Timeout { what: String, after: Duration },

    #[error("No element matches '{0}'")]
    ElementNotFound(String),

    #[error("Interaction with '{selector}' failed: {message}")]
    Interaction { selector: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),
}

impl RenderError {
    /// Returns true for timeouts, which callers usually treat as retryable
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            after,
        }
    }
}

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

/// DOM operations available on an open page
#[async_trait]
pub trait PageQuery: Send + Sync {
    /// Navigates to `url`, failing if loading takes longer than `timeout`
    async fn goto(&self, url: &str, timeout: Duration) -> RenderResult<()>;

    /// Returns the current serialized DOM
    async fn content(&self) -> RenderResult<String>;

    /// Returns true if any element matches `selector`
    async fn is_present(&self, selector: &str) -> RenderResult<bool>;

    /// Counts the elements matching `selector`
    async fn count(&self, selector: &str) -> RenderResult<usize>;

    /// Waits until an element matching `selector` is visible
    async fn wait_visible(&self, selector: &str, timeout: Duration) -> RenderResult<()>;

    /// Waits until no visible element matches `selector`
    async fn wait_hidden(&self, selector: &str, timeout: Duration) -> RenderResult<()>;

    /// Scrolls the first element matching `selector` into view
    async fn scroll_into_view(&self, selector: &str) -> RenderResult<()>;

    /// Clicks the first element matching `selector`
    async fn click(&self, selector: &str) -> RenderResult<()>;

    /// Removes every element matching `selector` from the DOM
    async fn remove_all(&self, selector: &str) -> RenderResult<()>;

    /// Sends `headers` with every request this page makes
    async fn set_extra_headers(&self, headers: &HeaderSet) -> RenderResult<()>;

    /// Closes the page
    async fn close(&self) -> RenderResult<()>;
}

/// A running browser
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    type Page: PageQuery;

    /// Opens a blank page
    async fn new_page(&self) -> RenderResult<Self::Page>;

    /// Shuts the browser down, closing every page it owns
    async fn close(self) -> RenderResult<()>;
}

/// Starts browsers
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Browser: BrowserHandle;

    async fn launch(&self) -> RenderResult<Self::Browser>;
}
