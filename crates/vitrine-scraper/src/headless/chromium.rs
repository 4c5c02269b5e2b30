//! Chromium over the DevTools protocol.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::future::BoxFuture;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::config::ScraperConfig;

use super::{HeadlessError, HeadlessRenderer, RenderedPage};

/// Launches a fresh browser for every render and always tears it down.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    user_agent: String,
    accept_language: String,
    nav_timeout: Duration,
    settle: Duration,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            nav_timeout: config.headless_nav_timeout,
            settle: config.headless_settle,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, HeadlessError> {
        let lang = self
            .accept_language
            .split(',')
            .next()
            .unwrap_or("pt-BR")
            .trim()
            .to_owned();
        BrowserConfig::builder()
            .no_sandbox()
            .args(vec![
                "--disable-dev-shm-usage".to_owned(),
                "--disable-gpu".to_owned(),
                "--no-first-run".to_owned(),
                format!("--lang={lang}"),
                format!("--user-agent={}", self.user_agent),
            ])
            .build()
            .map_err(HeadlessError::Launch)
    }

    async fn render_page(&self, url: &str) -> Result<RenderedPage, HeadlessError> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| HeadlessError::Launch(e.to_string()))?;
        let session = BrowserSession {
            browser,
            _handler: HandlerTask(tokio::spawn(async move {
                while handler.next().await.is_some() {}
            })),
        };

        let outcome = self.capture(&session.browser, url).await;
        session.close().await;
        outcome
    }

    async fn capture(&self, browser: &Browser, url: &str) -> Result<RenderedPage, HeadlessError> {
        let navigation = async {
            let page = browser.new_page("about:blank").await?;
            page.goto(url).await?;
            Ok::<_, chromiumoxide::error::CdpError>(page)
        };
        let page = tokio::time::timeout(self.nav_timeout, navigation)
            .await
            .map_err(|_| HeadlessError::NavigationTimeout {
                url: url.to_owned(),
                secs: self.nav_timeout.as_secs(),
            })?
            .map_err(|e| HeadlessError::Browser(e.to_string()))?;

        // Client-side rendering keeps mutating the DOM after the load event.
        tokio::time::sleep(self.settle).await;

        let final_url = page
            .url()
            .await
            .map_err(|e| HeadlessError::Browser(e.to_string()))?
            .unwrap_or_else(|| url.to_owned());
        let html = page
            .content()
            .await
            .map_err(|e| HeadlessError::Browser(e.to_string()))?;

        Ok(RenderedPage { final_url, html })
    }
}

/// A launched browser and its CDP event loop.
///
/// Dropping the session, including when the render future is cancelled,
/// kills the browser process and aborts the event loop.
struct BrowserSession {
    browser: Browser,
    _handler: HandlerTask,
}

impl BrowserSession {
    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!(error = %e, "browser close failed");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "browser process wait failed");
        }
    }
}

/// Aborts the wrapped task on drop.
struct HandlerTask(JoinHandle<()>);

impl Drop for HandlerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl HeadlessRenderer for ChromiumRenderer {
    fn render<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RenderedPage, HeadlessError>> {
        Box::pin(self.render_page(url))
    }
}
