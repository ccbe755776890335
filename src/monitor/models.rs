//! Data model for monitoring sessions.

use crate::error::InputError;
use crate::value;
use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static OPERATOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z ]{2,}$").unwrap());

/// Validates an operator name: at least 3 characters, letters and
/// spaces only.
pub fn validate_operator(name: &str) -> Result<(), InputError> {
    let name = name.trim();
    if OPERATOR_NAME.is_match(name) {
        Ok(())
    } else {
        Err(InputError::InvalidOperator(name.to_string()))
    }
}

/// What to watch: a URL plus the target value as the operator typed it
/// and in canonical form. Immutable once the session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Page to monitor
    pub url: String,
    /// Target value exactly as supplied (used for the text scan)
    pub raw_value: String,
    /// Canonical decimal form of the target value
    pub canonical_value: String,
}

impl TargetSpec {
    /// Builds a spec from validated input. Rejects non-http(s) URLs and
    /// values that do not parse in either decimal convention.
    pub fn new(url: &str, raw_value: &str) -> Result<Self, InputError> {
        let url = url.trim();
        let scheme_ok = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .is_some_and(|rest| !rest.is_empty());
        if !scheme_ok {
            return Err(InputError::InvalidUrl(url.to_string()));
        }

        let raw_value = raw_value.trim();
        let canonical_value = value::normalize(raw_value)
            .map_err(|_| InputError::InvalidValue(raw_value.to_string()))?;

        Ok(Self {
            url: url.to_string(),
            raw_value: raw_value.to_string(),
            canonical_value,
        })
    }
}

/// What one polling cycle observed. A single instance is kept as the
/// last known state and overwritten every cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedState {
    pub timestamp: DateTime<Utc>,
    /// Raw node text, when the target node was found
    pub raw_text: Option<String>,
    /// Canonical value derived from the raw text
    pub canonical: Option<String>,
    /// Whether the stored locator resolved without a fallback scan
    pub locator_valid: bool,
}

/// Classification of one cycle's observation against the last state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Unchanged,
    Changed,
    Reappeared,
    Lost,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Unchanged => "unchanged",
            ChangeKind::Changed => "changed",
            ChangeKind::Reappeared => "reappeared",
            ChangeKind::Lost => "lost",
        };
        write!(f, "{}", name)
    }
}

/// A classified change, emitted once and never retained in memory
/// beyond the cycle that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub timestamp: DateTime<Utc>,
    pub previous: Option<String>,
    pub current: Option<String>,
    pub kind: ChangeKind,
}

/// Result of a one-shot probe (`valwatch check`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub url: String,
    pub target: String,
    /// Synthesized structural path
    pub locator: String,
    /// Text of the located element
    pub text: String,
    /// Canonical value, when the text parses as a number
    pub canonical: Option<String>,
}

/// Totals for a finished monitoring session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Cycles attempted, including failed ones
    pub cycles: u64,
    /// Changed + reappeared + lost events
    pub changes: u64,
    /// True when the session ended on operator cancellation
    pub cancelled: bool,
}
