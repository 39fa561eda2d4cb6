use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::OnceCell;

use crate::app::{Result, SitewatchError};

/// Headless-Chrome fetcher for pages that assemble their content in
/// JavaScript. The browser is launched lazily on first use so sweeps
/// over static-only sites never start Chrome.
pub struct RenderFetcher {
    settle: Duration,
    browser: OnceCell<Arc<Browser>>,
}

impl RenderFetcher {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            browser: OnceCell::new(),
        }
    }

    async fn launch() -> Result<Arc<Browser>> {
        let browser_config = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(|e| SitewatchError::Render(format!("failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            SitewatchError::Render(format!(
                "failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Drain browser events
            }
        });

        Ok(Arc::new(browser))
    }

    async fn browser(&self) -> Result<&Arc<Browser>> {
        self.browser.get_or_try_init(Self::launch).await
    }

    /// Navigate to `url`, wait for the page to settle and return the
    /// rendered document.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let browser = self.browser().await?;

        let page = browser
            .new_page(url)
            .await
            .map_err(|e| SitewatchError::Render(format!("failed to create page: {}", e)))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| SitewatchError::Render(format!("navigation failed: {}", e)))?;

        tokio::time::sleep(self.settle).await;

        let html = page
            .content()
            .await
            .map_err(|e| SitewatchError::Render(format!("failed to read page content: {}", e)))?;

        let _ = page.close().await;

        Ok(html)
    }
}
