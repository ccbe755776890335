//! Headless-Chrome fetch strategy for pages that inject values with
//! scripts. The browser is launched once per monitoring session and
//! released deterministically when the session ends.

use crate::error::FetchError;
use crate::page::fetch::PageFetcher;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct BrowserFetcher {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Launches a headless browser and establishes the CDP connection.
    /// Failure here is fatal for the session.
    pub async fn launch(timeout: Duration) -> Result<Self, FetchError> {
        let config = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-extensions")
            .arg("--disable-sync")
            .window_size(1280, 720)
            .build()
            .map_err(FetchError::BackendUnavailable)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::BackendUnavailable(e.to_string()))?;

        // CDP messages must be drained for the connection to make progress.
        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        info!("Browser backend started");

        Ok(Self { browser, handler_task, timeout })
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("Rendering {}", url);

        let render = async {
            let page = self
                .browser
                .new_page(url)
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;

            page.wait_for_navigation()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;

            let content =
                page.content().await.map_err(|e| FetchError::Network(e.to_string()))?;

            if let Err(e) = page.close().await {
                warn!("Failed to close page: {}", e);
            }

            Ok(content)
        };

        tokio::time::timeout(self.timeout, render)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        let result = self.browser.close().await;
        self.handler_task.abort();
        info!("Browser backend released");
        result.map(|_| ()).map_err(|e| FetchError::Network(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}
