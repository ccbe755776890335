//! The polling loop: fetch, locate, normalize, classify, log.
//!
//! Cycles are strictly sequential. A new fetch never starts before the
//! previous cycle finished, and the cadence is measured from cycle
//! start, so a slow cycle delays its successors without compounding.
//! The loop never gives up on transient failures; it retries after a
//! short delay until cancelled or a configured cycle budget runs out.

use crate::audit::{AuditLog, AuditRecord};
use crate::config::Config;
use crate::monitor::detector::ChangeDetector;
use crate::monitor::models::{ChangeKind, ObservedState, SessionSummary, TargetSpec};
use crate::page::fetch::PageFetcher;
use crate::page::locator::{self, Locator};
use crate::page::DomTree;
use crate::value;
use chrono::Utc;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Outcome of one polling cycle.
enum CycleOutcome {
    /// The target value was observed (present)
    Observed(Option<ChangeKind>),
    /// Fetch failed or the value was absent; retry after a short delay
    Transient(Option<ChangeKind>),
}

/// Drives one monitoring session over a single target.
pub struct MonitorEngine {
    fetcher: Box<dyn PageFetcher>,
    detector: ChangeDetector,
    audit: AuditLog,
    config: Config,
    locator: Option<Locator>,
    /// Raw text of the most recent sighting; anchors the fallback scan
    /// once the page has moved on from the original target value
    last_raw: Option<String>,
    last_state: Option<ObservedState>,
}

impl MonitorEngine {
    pub fn new(fetcher: Box<dyn PageFetcher>, audit: AuditLog, config: Config) -> Self {
        Self {
            fetcher,
            detector: ChangeDetector::new(),
            audit,
            config,
            locator: None,
            last_raw: None,
            last_state: None,
        }
    }

    /// The state observed by the most recent cycle.
    pub fn last_state(&self) -> Option<&ObservedState> {
        self.last_state.as_ref()
    }

    /// Runs the session until `shutdown` resolves or the cycle budget
    /// is exhausted. The fetch backend is released on every exit path.
    pub async fn run(
        &mut self,
        spec: &TargetSpec,
        shutdown: impl Future<Output = ()>,
    ) -> SessionSummary {
        tokio::pin!(shutdown);

        info!("Monitoring {} for '{}' via {} engine", spec.url, spec.raw_value, self.fetcher.name());
        self.write(AuditRecord::session_start(spec, self.config.operator.as_deref()));

        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut summary = SessionSummary::default();
        let mut retrying = false;

        loop {
            if let Some(max) = self.config.max_cycles {
                if summary.cycles >= max {
                    info!("Cycle budget of {} reached, ending session", max);
                    break;
                }
            }

            // Failed cycles retry after a short fixed delay instead of
            // waiting out the full interval.
            if retrying {
                tokio::select! {
                    _ = &mut shutdown => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = self.backoff() => {}
                }
            } else {
                tokio::select! {
                    _ = &mut shutdown => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = ticker.tick() => {}
                }
            }

            summary.cycles += 1;

            let outcome = tokio::select! {
                _ = &mut shutdown => {
                    summary.cancelled = true;
                    break;
                }
                outcome = self.run_cycle(spec, summary.cycles) => outcome,
            };

            let event = match outcome {
                CycleOutcome::Observed(event) => {
                    retrying = false;
                    event
                }
                CycleOutcome::Transient(event) => {
                    retrying = true;
                    event
                }
            };

            if matches!(
                event,
                Some(ChangeKind::Changed | ChangeKind::Reappeared | ChangeKind::Lost)
            ) {
                summary.changes += 1;
            }
        }

        if summary.cancelled {
            info!("Session cancelled by operator after {} cycles", summary.cycles);
        }

        // Release the backend exactly once, whatever ended the loop.
        if let Err(e) = self.fetcher.close().await {
            warn!("Failed to release fetch backend: {}", e);
        }
        self.write(AuditRecord::session_end(spec, &summary));

        summary
    }

    /// One fetch-resolve-classify-log iteration.
    async fn run_cycle(&mut self, spec: &TargetSpec, cycle: u64) -> CycleOutcome {
        debug!("Cycle {} starting", cycle);

        let html = match self.fetcher.fetch(&spec.url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Cycle {}: fetch failed: {}", cycle, e);
                self.write(AuditRecord::fetch_failure(spec, cycle, &e));
                return CycleOutcome::Transient(None);
            }
        };

        let tree = DomTree::parse(&html);
        let (raw_text, locator_valid) = self.locate(&tree, spec, cycle);

        let canonical = raw_text.as_deref().and_then(|text| match value::normalize(text) {
            Ok(canonical) => Some(canonical),
            Err(e) => {
                warn!("Cycle {}: located node no longer holds a number: {}", cycle, e);
                None
            }
        });

        let state = ObservedState {
            timestamp: Utc::now(),
            raw_text: raw_text.clone(),
            canonical: canonical.clone(),
            locator_valid,
        };

        let first_sighting = !self.detector.has_baseline() && state.canonical.is_some();
        let event = self.detector.observe(&state);

        if state.canonical.is_some() {
            self.last_raw = state.raw_text.clone();
        }

        if first_sighting {
            let value = state.canonical.as_deref().unwrap_or_default();
            info!("Cycle {}: baseline value {} recorded", cycle, value);
            self.write(AuditRecord::baseline(
                spec,
                cycle,
                value,
                self.locator.as_ref().map(|l| l.to_string()),
            ));
        }

        let kind = event.as_ref().map(|e| e.kind);
        if let Some(event) = event {
            match event.kind {
                ChangeKind::Unchanged => {
                    debug!("Cycle {}: no change", cycle);
                    if self.config.log_unchanged {
                        self.write(AuditRecord::change(spec, cycle, &event));
                    }
                }
                ChangeKind::Changed => {
                    info!(
                        "Cycle {}: value changed: {} -> {}",
                        cycle,
                        event.previous.as_deref().unwrap_or("?"),
                        event.current.as_deref().unwrap_or("?")
                    );
                    self.write(AuditRecord::change(spec, cycle, &event));
                }
                ChangeKind::Reappeared => {
                    info!(
                        "Cycle {}: value reappeared: {}",
                        cycle,
                        event.current.as_deref().unwrap_or("?")
                    );
                    self.write(AuditRecord::change(spec, cycle, &event));
                }
                ChangeKind::Lost => {
                    error!("Cycle {}: target value lost from page", cycle);
                    self.write(AuditRecord::change(spec, cycle, &event));
                }
            }
        }

        let present = state.canonical.is_some();
        self.last_state = Some(state);

        if present {
            CycleOutcome::Observed(kind)
        } else {
            debug!("Cycle {}: value absent, retrying shortly", cycle);
            CycleOutcome::Transient(kind)
        }
    }

    /// Finds the target node's text, preferring the cheap path descent
    /// and falling back to a full-content scan when the path is stale.
    /// Returns the text (if any) and whether the stored locator held.
    fn locate(&mut self, tree: &DomTree, spec: &TargetSpec, cycle: u64) -> (Option<String>, bool) {
        if let Some(loc) = &self.locator {
            match locator::reresolve(tree, loc) {
                Ok(text) => return (Some(text), true),
                Err(e) => {
                    warn!("Cycle {}: {}; falling back to full scan", cycle, e);
                }
            }
        }

        // The page may have moved on from the original target value, so
        // the most recent sighting anchors the scan.
        let needle = self.last_raw.as_deref().unwrap_or(&spec.raw_value);
        match locator::resolve(tree, needle) {
            Ok(loc) => {
                let text = locator::reresolve(tree, &loc).ok();
                info!("Cycle {}: locator synthesized: {}", cycle, loc);
                self.locator = Some(loc);
                (text, false)
            }
            Err(e) => {
                debug!("Cycle {}: {}", cycle, e);
                // Keep any stored locator: the value may reappear at
                // the same position on a later cycle.
                (None, false)
            }
        }
    }

    async fn backoff(&self) {
        let jitter = if self.config.retry_jitter_ms > 0 {
            rand::rng().random_range(0..=self.config.retry_jitter_ms)
        } else {
            0
        };

        let total_delay = self.config.retry_delay_ms + jitter;
        debug!("Retrying in {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }

    /// Audit failures must not kill the session; the console still
    /// shows every event.
    fn write(&mut self, record: AuditRecord) {
        if let Err(e) = self.audit.record(&record) {
            warn!("Failed to write audit record: {}", e);
        }
    }
}
