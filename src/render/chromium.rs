//! Chromium backend over the DevTools protocol

use super::{BrowserHandle, BrowserLauncher, HeaderSet, PageQuery, RenderError, RenderResult};
use crate::config::BrowserConfig as BrowserSettings;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

/// Interval between DOM polls while waiting on a selector
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches local Chromium processes
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self) -> RenderResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder().args(self.settings.args.iter().cloned());
        if !self.settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.settings.executable {
            builder = builder.chrome_executable(executable);
        }
        builder.build().map_err(RenderError::Launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    type Browser = ChromiumBrowser;

    async fn launch(&self) -> RenderResult<ChromiumBrowser> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        debug!("Browser launched");
        Ok(ChromiumBrowser {
            browser,
            handler_task,
        })
    }
}

/// A running Chromium process and its event loop
pub struct ChromiumBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserHandle for ChromiumBrowser {
    type Page = ChromiumPage;

    async fn new_page(&self) -> RenderResult<ChromiumPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Protocol(e.to_string()))?;
        Ok(ChromiumPage { page })
    }

    async fn close(self) -> RenderResult<()> {
        let Self {
            mut browser,
            handler_task,
        } = self;

        let closed = browser
            .close()
            .await
            .map_err(|e| RenderError::Protocol(e.to_string()));
        if let Err(e) = browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        handler_task.abort();
        debug!("Browser closed");
        closed.map(|_| ())
    }
}

/// One Chromium tab
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> RenderResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| RenderError::Script(e.to_string()))
    }

    /// Re-evaluates `script` until it yields true or `limit` elapses
    async fn poll_until(&self, script: String, limit: Duration, what: String) -> RenderResult<()> {
        let deadline = Instant::now() + limit;
        loop {
            if self.eval::<bool>(script.clone()).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(RenderError::timeout(what, limit));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

/// JS string literal for `selector`
fn js_selector(selector: &str) -> String {
    serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string())
}

/// JS expression that is true when some element matching `selector` is visible
fn visible_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            return Array.from(document.querySelectorAll({})).some(el => {{
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return style.display !== 'none'
                    && style.visibility !== 'hidden'
                    && (rect.width > 0 || rect.height > 0);
            }});
        }})()"#,
        js_selector(selector)
    )
}

#[async_trait]
impl PageQuery for ChromiumPage {
    async fn goto(&self, url: &str, limit: Duration) -> RenderResult<()> {
        match timeout(limit, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(RenderError::timeout(format!("navigation to {}", url), limit)),
        }
    }

    async fn content(&self) -> RenderResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| RenderError::Protocol(e.to_string()))
    }

    async fn is_present(&self, selector: &str) -> RenderResult<bool> {
        self.eval(format!(
            "document.querySelector({}) !== null",
            js_selector(selector)
        ))
        .await
    }

    async fn count(&self, selector: &str) -> RenderResult<usize> {
        self.eval(format!(
            "document.querySelectorAll({}).length",
            js_selector(selector)
        ))
        .await
    }

    async fn wait_visible(&self, selector: &str, limit: Duration) -> RenderResult<()> {
        self.poll_until(visible_script(selector), limit, format!("'{}' to be visible", selector))
            .await
    }

    async fn wait_hidden(&self, selector: &str, limit: Duration) -> RenderResult<()> {
        let script = format!("!{}", visible_script(selector));
        self.poll_until(script, limit, format!("'{}' to be hidden", selector))
            .await
    }

    async fn scroll_into_view(&self, selector: &str) -> RenderResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| RenderError::ElementNotFound(selector.to_string()))?;
        element
            .scroll_into_view()
            .await
            .map_err(|e| RenderError::Interaction {
                selector: selector.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> RenderResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| RenderError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(|e| RenderError::Interaction {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn remove_all(&self, selector: &str) -> RenderResult<()> {
        let removed: usize = self
            .eval(format!(
                "(() => {{ const els = document.querySelectorAll({}); els.forEach(el => el.remove()); return els.length; }})()",
                js_selector(selector)
            ))
            .await?;
        debug!("Removed {} element(s) matching '{}'", removed, selector);
        Ok(())
    }

    async fn set_extra_headers(&self, headers: &HeaderSet) -> RenderResult<()> {
        let value =
            serde_json::to_value(headers).map_err(|e| RenderError::Protocol(e.to_string()))?;
        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(value)))
            .await
            .map_err(|e| RenderError::Protocol(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> RenderResult<()> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| RenderError::Protocol(e.to_string()))
    }
}
