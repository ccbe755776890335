//! One-shot probe command implementation.

use crate::config::Config;
use crate::format::Formatter;
use crate::monitor::models::{ProbeReport, TargetSpec};
use crate::page::fetch::{self, PageFetcher};
use crate::page::{locator, DomTree};
use crate::value;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Fetches a page once, locates the target value, and reports the
/// synthesized locator. Useful for verifying a target before starting
/// a long session.
pub struct CheckCommand {
    config: Config,
}

impl CheckCommand {
    /// Creates a new check command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the probe and returns formatted output.
    pub async fn execute(&self, url: &str, value: &str) -> Result<String> {
        let mut fetcher =
            fetch::build(&self.config).await.context("Failed to start fetch backend")?;

        let result = self.execute_with_fetcher(fetcher.as_mut(), url, value).await;

        if let Err(e) = fetcher.close().await {
            warn!("Failed to release fetch backend: {}", e);
        }

        result
    }

    /// Runs the probe with a provided fetcher (for testing).
    pub async fn execute_with_fetcher(
        &self,
        fetcher: &mut dyn PageFetcher,
        url: &str,
        value: &str,
    ) -> Result<String> {
        let spec = TargetSpec::new(url, value)?;

        info!("Probing {} for '{}'", spec.url, spec.raw_value);

        let html = fetcher.fetch(&spec.url).await?;
        let tree = DomTree::parse(&html);

        let loc = locator::resolve(&tree, &spec.raw_value)
            .with_context(|| format!("'{}' was not found on the page", spec.raw_value))?;
        let text = locator::reresolve(&tree, &loc)
            .context("Synthesized locator failed to re-resolve")?;
        let canonical = value::normalize(&text).ok();

        let report = ProbeReport {
            url: spec.url.clone(),
            target: spec.raw_value.clone(),
            locator: loc.to_string(),
            text,
            canonical,
        };

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_probe(&report))
    }
}
