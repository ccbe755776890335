//! Change classification across polling cycles.
//!
//! A state machine over two logical states, Present and Absent, fed
//! one observation per cycle. Comparisons use canonical values only,
//! so "100" and "100,00" never produce a spurious change.

use crate::monitor::models::{ChangeEvent, ChangeKind, ObservedState};

/// Classifies each cycle's observation against the last known state.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    /// Canonical value currently considered present on the page
    last: Option<String>,
    /// Whether any value has been sighted this session
    seen_any: bool,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical value from the most recent Present state.
    pub fn last_value(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// True once a baseline has been recorded this session.
    pub fn has_baseline(&self) -> bool {
        self.seen_any
    }

    /// Feeds one observation through the state machine.
    ///
    /// The first sighting establishes the baseline and emits no event;
    /// Absent-to-Absent cycles emit no event either.
    pub fn observe(&mut self, state: &ObservedState) -> Option<ChangeEvent> {
        let current = state.canonical.as_deref();

        let kind = match (self.last.as_deref(), current) {
            (None, Some(_)) if !self.seen_any => None,
            (None, Some(_)) => Some(ChangeKind::Reappeared),
            (Some(previous), Some(value)) if previous == value => Some(ChangeKind::Unchanged),
            (Some(_), Some(_)) => Some(ChangeKind::Changed),
            (Some(_), None) => Some(ChangeKind::Lost),
            (None, None) => None,
        };

        let event = kind.map(|kind| ChangeEvent {
            timestamp: state.timestamp,
            previous: self.last.clone(),
            current: current.map(String::from),
            kind,
        });

        if current.is_some() {
            self.seen_any = true;
        }
        self.last = current.map(String::from);

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn observed(canonical: Option<&str>) -> ObservedState {
        ObservedState {
            timestamp: Utc::now(),
            raw_text: canonical.map(String::from),
            canonical: canonical.map(String::from),
            locator_valid: true,
        }
    }

    #[test]
    fn test_first_sighting_is_baseline() {
        let mut detector = ChangeDetector::new();
        assert!(!detector.has_baseline());

        let event = detector.observe(&observed(Some("100")));
        assert!(event.is_none());
        assert!(detector.has_baseline());
        assert_eq!(detector.last_value(), Some("100"));
    }

    #[test]
    fn test_unchanged() {
        let mut detector = ChangeDetector::new();
        detector.observe(&observed(Some("100")));

        let event = detector.observe(&observed(Some("100"))).unwrap();
        assert_eq!(event.kind, ChangeKind::Unchanged);
        assert_eq!(event.previous.as_deref(), Some("100"));
        assert_eq!(event.current.as_deref(), Some("100"));
    }

    #[test]
    fn test_changed() {
        let mut detector = ChangeDetector::new();
        detector.observe(&observed(Some("100")));

        let event = detector.observe(&observed(Some("150"))).unwrap();
        assert_eq!(event.kind, ChangeKind::Changed);
        assert_eq!(event.previous.as_deref(), Some("100"));
        assert_eq!(event.current.as_deref(), Some("150"));
    }

    #[test]
    fn test_lost_then_reappeared() {
        let mut detector = ChangeDetector::new();
        detector.observe(&observed(Some("100")));

        let event = detector.observe(&observed(None)).unwrap();
        assert_eq!(event.kind, ChangeKind::Lost);
        assert_eq!(event.previous.as_deref(), Some("100"));
        assert!(event.current.is_none());

        let event = detector.observe(&observed(Some("100"))).unwrap();
        assert_eq!(event.kind, ChangeKind::Reappeared);
        assert!(event.previous.is_none());
        assert_eq!(event.current.as_deref(), Some("100"));
    }

    #[test]
    fn test_absent_before_baseline_emits_nothing() {
        let mut detector = ChangeDetector::new();
        assert!(detector.observe(&observed(None)).is_none());
        assert!(detector.observe(&observed(None)).is_none());
        assert!(!detector.has_baseline());

        // First actual sighting is still the baseline, not a reappearance.
        assert!(detector.observe(&observed(Some("42"))).is_none());
    }

    #[test]
    fn test_absent_to_absent_emits_nothing() {
        let mut detector = ChangeDetector::new();
        detector.observe(&observed(Some("100")));
        detector.observe(&observed(None));
        assert!(detector.observe(&observed(None)).is_none());
    }

    #[test]
    fn test_canonical_comparison_ignores_formatting() {
        // The engine normalizes before observing; equal canonical forms
        // must classify as unchanged.
        let mut detector = ChangeDetector::new();
        detector.observe(&observed(Some(&crate::value::normalize("100").unwrap())));
        let event = detector
            .observe(&observed(Some(&crate::value::normalize("100.0").unwrap())))
            .unwrap();
        assert_eq!(event.kind, ChangeKind::Unchanged);
    }
}
