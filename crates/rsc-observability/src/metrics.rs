//! Navigation lifecycle metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rsc_core::{NavigationKind, NavigationObserver, NavigationPhase};
use serde::{Deserialize, Serialize};

/// Counters for one navigation session.
///
/// Register with the controller as its observer; every phase it reports is
/// counted here.
#[derive(Debug, Default)]
pub struct NavigationMetrics {
    started: AtomicU64,
    committed: AtomicU64,
    superseded: AtomicU64,
    failed: AtomicU64,
    pops: AtomicU64,
    actions: AtomicU64,
    commit_total_us: AtomicU64,
    commit_max_us: AtomicU64,
}

/// Point-in-time copy of [`NavigationMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Navigations started, of every kind.
    pub started: u64,
    /// Navigations that became visible.
    pub committed: u64,
    /// Navigations discarded because a later one started first.
    pub superseded: u64,
    /// Navigations whose fetch failed.
    pub failed: u64,
    /// Pop events handled.
    pub pops: u64,
    /// Server actions invoked.
    pub actions: u64,
    /// Mean time from start to commit (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_commit_us: Option<u64>,
    /// Slowest time from start to commit (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_commit_us: Option<u64>,
}

impl NavigationMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a phase for a navigation of `kind`.
    pub fn record(&self, kind: NavigationKind, phase: &NavigationPhase, elapsed: Duration) {
        match phase {
            NavigationPhase::Started => {
                self.started.fetch_add(1, Ordering::Relaxed);
                match kind {
                    NavigationKind::Pop => {
                        self.pops.fetch_add(1, Ordering::Relaxed);
                    }
                    NavigationKind::Action => {
                        self.actions.fetch_add(1, Ordering::Relaxed);
                    }
                    _ => {}
                }
            }
            NavigationPhase::Committed => {
                self.committed.fetch_add(1, Ordering::Relaxed);
                let us = elapsed.as_micros() as u64;
                self.commit_total_us.fetch_add(us, Ordering::Relaxed);
                self.commit_max_us.fetch_max(us, Ordering::Relaxed);
            }
            NavigationPhase::Superseded => {
                self.superseded.fetch_add(1, Ordering::Relaxed);
            }
            NavigationPhase::Failed(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Navigations started but not yet committed, superseded or failed.
    pub fn in_flight(&self) -> u64 {
        let snapshot = self.snapshot();
        snapshot
            .started
            .saturating_sub(snapshot.committed + snapshot.superseded + snapshot.failed)
    }

    /// Copy the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let committed = self.committed.load(Ordering::Relaxed);
        let (mean_commit_us, max_commit_us) = if committed == 0 {
            (None, None)
        } else {
            (
                Some(self.commit_total_us.load(Ordering::Relaxed) / committed),
                Some(self.commit_max_us.load(Ordering::Relaxed)),
            )
        };

        MetricsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            committed,
            superseded: self.superseded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            pops: self.pops.load(Ordering::Relaxed),
            actions: self.actions.load(Ordering::Relaxed),
            mean_commit_us,
            max_commit_us,
        }
    }
}

impl NavigationObserver for NavigationMetrics {
    fn on_phase(&self, kind: NavigationKind, phase: &NavigationPhase, elapsed: Duration) {
        self.record(kind, phase, elapsed);
    }
}

impl MetricsSnapshot {
    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_phase_and_kind() {
        let metrics = NavigationMetrics::new();

        metrics.record(NavigationKind::Push, &NavigationPhase::Started, Duration::ZERO);
        metrics.record(NavigationKind::Pop, &NavigationPhase::Started, Duration::ZERO);
        metrics.record(NavigationKind::Action, &NavigationPhase::Started, Duration::ZERO);
        metrics.record(
            NavigationKind::Push,
            &NavigationPhase::Superseded,
            Duration::from_millis(5),
        );
        metrics.record(
            NavigationKind::Pop,
            &NavigationPhase::Failed("timeout".to_string()),
            Duration::from_millis(5),
        );

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.started, 3);
        assert_eq!(snapshot.pops, 1);
        assert_eq!(snapshot.actions, 1);
        assert_eq!(snapshot.superseded, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.committed, 0);
        assert_eq!(snapshot.mean_commit_us, None);
        assert_eq!(metrics.in_flight(), 1);
    }

    #[test]
    fn test_commit_latency() {
        let metrics = NavigationMetrics::new();

        metrics.record(
            NavigationKind::Push,
            &NavigationPhase::Committed,
            Duration::from_micros(100),
        );
        metrics.record(
            NavigationKind::Replace,
            &NavigationPhase::Committed,
            Duration::from_micros(300),
        );

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.committed, 2);
        assert_eq!(snapshot.mean_commit_us, Some(200));
        assert_eq!(snapshot.max_commit_us, Some(300));
    }

    #[test]
    fn test_observer_records() {
        let metrics = NavigationMetrics::new();
        let observer: &dyn NavigationObserver = &metrics;

        observer.on_phase(NavigationKind::Initial, &NavigationPhase::Started, Duration::ZERO);

        assert_eq!(metrics.snapshot().started, 1);
    }

    #[test]
    fn test_snapshot_json_skips_empty_latency() {
        let json = NavigationMetrics::new().snapshot().to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["started"], 0);
        assert!(value.get("mean_commit_us").is_none());
    }
}
