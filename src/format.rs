//! Output formatting for probe reports and session summaries.

use crate::config::OutputFormat;
use crate::monitor::models::{ProbeReport, SessionSummary};

/// Formats results for the console.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a one-shot probe result.
    pub fn format_probe(&self, report: &ProbeReport) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Text => {
                let mut lines = Vec::new();
                lines.push(format!("URL:       {}", report.url));
                lines.push(format!("Target:    {}", report.target));
                lines.push(format!("Locator:   {}", report.locator));
                lines.push(format!("Observed:  {}", report.text));
                match &report.canonical {
                    Some(canonical) => lines.push(format!("Canonical: {}", canonical)),
                    None => lines.push("Canonical: N/A (not a number)".to_string()),
                }
                lines.join("\n")
            }
        }
    }

    /// Formats a finished session's totals.
    pub fn format_summary(&self, summary: &SessionSummary) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Text => {
                let ending = if summary.cancelled { "cancelled" } else { "completed" };
                format!(
                    "Session {}: {} cycles, {} changes detected.",
                    ending, summary.cycles, summary.changes
                )
            }
        }
    }
}
