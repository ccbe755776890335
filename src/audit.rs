//! Append-only audit sink.
//!
//! One JSON object per line, flushed on every record so the log
//! survives a kill. The sink is an explicitly passed value with a
//! scoped lifetime, never process-global state.

use crate::error::FetchError;
use crate::monitor::models::{ChangeEvent, SessionSummary, TargetSpec};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One structured audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    /// session_start, baseline, changed, unchanged, reappeared, lost,
    /// fetch_error, session_end
    pub event: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

impl AuditRecord {
    fn base(event: &str, url: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.to_string(),
            url: url.to_string(),
            cycle: None,
            previous: None,
            current: None,
            locator: None,
            error: None,
            error_kind: None,
            operator: None,
        }
    }

    pub fn session_start(spec: &TargetSpec, operator: Option<&str>) -> Self {
        Self {
            current: Some(spec.canonical_value.clone()),
            operator: operator.map(String::from),
            ..Self::base("session_start", &spec.url)
        }
    }

    pub fn baseline(spec: &TargetSpec, cycle: u64, value: &str, locator: Option<String>) -> Self {
        Self {
            cycle: Some(cycle),
            current: Some(value.to_string()),
            locator,
            ..Self::base("baseline", &spec.url)
        }
    }

    pub fn change(spec: &TargetSpec, cycle: u64, event: &ChangeEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            cycle: Some(cycle),
            previous: event.previous.clone(),
            current: event.current.clone(),
            ..Self::base(&event.kind.to_string(), &spec.url)
        }
    }

    pub fn fetch_failure(spec: &TargetSpec, cycle: u64, error: &FetchError) -> Self {
        Self {
            cycle: Some(cycle),
            error: Some(error.to_string()),
            error_kind: Some(error.classification().to_string()),
            ..Self::base("fetch_error", &spec.url)
        }
    }

    pub fn session_end(spec: &TargetSpec, summary: &SessionSummary) -> Self {
        Self {
            cycle: Some(summary.cycles),
            error: summary.cancelled.then(|| "cancelled by operator".to_string()),
            ..Self::base("session_end", &spec.url)
        }
    }
}

/// Append-only JSON-lines sink backed by a file.
pub struct AuditLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl AuditLog {
    /// Opens (or creates) the log file for appending.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Audit log open: {}", path.display());
        Ok(Self { writer: BufWriter::new(file), path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record and flushes it to disk.
    pub fn record(&mut self, record: &AuditRecord) -> io::Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()
    }
}
