//! Watch command implementation.

use crate::audit::AuditLog;
use crate::config::Config;
use crate::format::Formatter;
use crate::monitor::models::{validate_operator, SessionSummary, TargetSpec};
use crate::monitor::MonitorEngine;
use crate::page::fetch::{self, PageFetcher};
use anyhow::{Context, Result};
use std::future::Future;
use tracing::info;

/// Runs a monitoring session until cancelled or the cycle budget runs
/// out.
pub struct WatchCommand {
    config: Config,
}

impl WatchCommand {
    /// Creates a new watch command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Starts the session, cancelled by ctrl-c, and returns formatted
    /// totals.
    pub async fn execute(&self, url: &str, value: &str) -> Result<String> {
        let summary = self
            .execute_until(url, value, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_summary(&summary))
    }

    /// Starts the session with an explicit shutdown future (for
    /// testing and embedding).
    pub async fn execute_until(
        &self,
        url: &str,
        value: &str,
        shutdown: impl Future<Output = ()>,
    ) -> Result<SessionSummary> {
        let spec = TargetSpec::new(url, value)?;
        if let Some(operator) = &self.config.operator {
            validate_operator(operator)?;
        }

        let audit = AuditLog::open(&self.config.audit_log).with_context(|| {
            format!("Failed to open audit log: {}", self.config.audit_log.display())
        })?;
        info!("Audit log: {}", audit.path().display());

        let fetcher: Box<dyn PageFetcher> =
            fetch::build(&self.config).await.context("Failed to start fetch backend")?;

        let mut engine = MonitorEngine::new(fetcher, audit, self.config.clone());
        Ok(engine.run(&spec, shutdown).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.audit_log = dir.path().join("audit.log");
        config.max_cycles = Some(1);
        config.retry_delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn test_watch_rejects_invalid_url() {
        let dir = TempDir::new().unwrap();
        let cmd = WatchCommand::new(test_config(&dir));

        let err = cmd
            .execute_until("file:///etc/passwd", "42", std::future::pending())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[tokio::test]
    async fn test_watch_rejects_invalid_value() {
        let dir = TempDir::new().unwrap();
        let cmd = WatchCommand::new(test_config(&dir));

        let err = cmd
            .execute_until("https://example.com", "abc", std::future::pending())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[tokio::test]
    async fn test_watch_rejects_invalid_operator() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.operator = Some("x1".to_string());
        let cmd = WatchCommand::new(config);

        let err = cmd
            .execute_until("https://example.com", "42", std::future::pending())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("operator"));
    }

    #[tokio::test]
    async fn test_watch_rejects_unwritable_audit_path() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.audit_log = dir.path().join("missing-dir").join("audit.log");
        let cmd = WatchCommand::new(config);

        let err = cmd
            .execute_until("https://example.com", "42", std::future::pending())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("audit log"));
    }
}
