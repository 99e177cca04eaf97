//! Page lifecycle helpers shared by every crawl stage

use super::{BrowserHandle, HeaderSet, PageQuery, RenderResult};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Dismisses the cookie consent bar if it shows up within `timeout`
///
/// Returns true only when a button was found and clicked. Failures are
/// logged and reported as false; they never abort the caller.
pub async fn dismiss_consent<P>(page: &P, selector: &str, timeout: Duration) -> bool
where
    P: PageQuery + ?Sized,
{
    match page.wait_visible(selector, timeout).await {
        Ok(()) => {}
        Err(e) if e.is_timeout() => {
            debug!("No consent button within {}ms", timeout.as_millis());
            return false;
        }
        Err(e) => {
            warn!("Could not look for consent button: {}", e);
            return false;
        }
    }

    match page.click(selector).await {
        Ok(()) => {
            info!("Consent banner dismissed");
            true
        }
        Err(e) => {
            warn!("Error interacting with consent banner: {}", e);
            false
        }
    }
}

/// Removes the loading spinner and waits for the overlay to go away
///
/// A timeout is logged and swallowed; the caller recounts the grid either way.
pub async fn wait_for_overlay<P>(page: &P, overlay: &str, indicator: &str, timeout: Duration)
where
    P: PageQuery + ?Sized,
{
    if let Err(e) = page.remove_all(indicator).await {
        debug!("Could not remove loading indicator: {}", e);
    }

    match page.wait_hidden(overlay, timeout).await {
        Ok(()) => debug!("Overlay disappeared"),
        Err(e) if e.is_timeout() => warn!("Overlay did not disappear within the timeout"),
        Err(e) => warn!("Overlay wait failed: {}", e),
    }
}

/// Pages opened through this context share one header set
pub struct BrowserContext<'a, B: BrowserHandle> {
    browser: &'a B,
    headers: HeaderSet,
}

impl<'a, B: BrowserHandle> BrowserContext<'a, B> {
    pub fn new(browser: &'a B, headers: HeaderSet) -> Self {
        Self { browser, headers }
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Opens a page carrying the context headers
    pub async fn new_page(&self) -> RenderResult<B::Page> {
        let page = self.browser.new_page().await?;
        if !self.headers.is_empty() {
            if let Err(e) = page.set_extra_headers(&self.headers).await {
                let _ = page.close().await;
                return Err(e);
            }
        }
        Ok(page)
    }
}
