//! Metrics collection for engine monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Engine metrics.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Groups created.
    pub groups_created: AtomicU64,
    /// Members joined after creation.
    pub members_joined: AtomicU64,
    /// Expenses registered.
    pub expenses_registered: AtomicU64,
    /// Debt increases recorded by expenses.
    pub debt_increases: AtomicU64,
    /// Simplification commitments stored.
    pub commitments: AtomicU64,
    /// Commitments that overwrote a pending one.
    pub commitments_overwritten: AtomicU64,
    /// Simplifications applied.
    pub simplifications_applied: AtomicU64,
    /// Settlements completed.
    pub settlements_success: AtomicU64,
    /// Settlements rejected by the value ledger.
    pub settlements_failed: AtomicU64,
    /// Calls rejected before any state change.
    pub calls_rejected: AtomicU64,
}

impl EngineMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            groups_created: AtomicU64::new(0),
            members_joined: AtomicU64::new(0),
            expenses_registered: AtomicU64::new(0),
            debt_increases: AtomicU64::new(0),
            commitments: AtomicU64::new(0),
            commitments_overwritten: AtomicU64::new(0),
            simplifications_applied: AtomicU64::new(0),
            settlements_success: AtomicU64::new(0),
            settlements_failed: AtomicU64::new(0),
            calls_rejected: AtomicU64::new(0),
        }
    }

    pub fn group_created(&self) {
        self.groups_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn member_joined(&self) {
        self.members_joined.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an expense and the number of increases it produced.
    pub fn expense_registered(&self, increases: usize) {
        self.expenses_registered.fetch_add(1, Ordering::Relaxed);
        self.debt_increases
            .fetch_add(increases as u64, Ordering::Relaxed);
    }

    /// Record a commitment; `overwrote` is true when a pending one was replaced.
    pub fn commitment_stored(&self, overwrote: bool) {
        self.commitments.fetch_add(1, Ordering::Relaxed);
        if overwrote {
            self.commitments_overwritten.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn simplification_applied(&self) {
        self.simplifications_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn settlement_success(&self) {
        self.settlements_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn settlement_failed(&self) {
        self.settlements_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn call_rejected(&self) {
        self.calls_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            groups_created: self.groups_created.load(Ordering::Relaxed),
            members_joined: self.members_joined.load(Ordering::Relaxed),
            expenses_registered: self.expenses_registered.load(Ordering::Relaxed),
            debt_increases: self.debt_increases.load(Ordering::Relaxed),
            commitments: self.commitments.load(Ordering::Relaxed),
            commitments_overwritten: self.commitments_overwritten.load(Ordering::Relaxed),
            simplifications_applied: self.simplifications_applied.load(Ordering::Relaxed),
            settlements_success: self.settlements_success.load(Ordering::Relaxed),
            settlements_failed: self.settlements_failed.load(Ordering::Relaxed),
            calls_rejected: self.calls_rejected.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let counters = [
            ("groups_created", "Total groups created", snapshot.groups_created),
            ("members_joined", "Total members joined after creation", snapshot.members_joined),
            ("expenses_registered", "Total expenses registered", snapshot.expenses_registered),
            ("debt_increases", "Total debt increases recorded", snapshot.debt_increases),
            ("commitments", "Total simplification commitments", snapshot.commitments),
            (
                "commitments_overwritten",
                "Commitments that replaced a pending one",
                snapshot.commitments_overwritten,
            ),
            (
                "simplifications_applied",
                "Total simplifications applied",
                snapshot.simplifications_applied,
            ),
            ("settlements_success", "Total successful settlements", snapshot.settlements_success),
            ("settlements_failed", "Settlements rejected by the value ledger", snapshot.settlements_failed),
            ("calls_rejected", "Calls rejected without state change", snapshot.calls_rejected),
        ];

        let mut out = String::new();
        for (name, help, value) in counters {
            out.push_str(&format!(
                "# HELP splitsettle_{name} {help}\n# TYPE splitsettle_{name} counter\nsplitsettle_{name} {value}\n\n"
            ));
        }
        out
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub groups_created: u64,
    pub members_joined: u64,
    pub expenses_registered: u64,
    pub debt_increases: u64,
    pub commitments: u64,
    pub commitments_overwritten: u64,
    pub simplifications_applied: u64,
    pub settlements_success: u64,
    pub settlements_failed: u64,
    pub calls_rejected: u64,
}

impl MetricsSnapshot {
    /// Render the snapshot as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<EngineMetrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_increment() {
        let metrics = EngineMetrics::new();

        metrics.expense_registered(2);
        metrics.expense_registered(3);
        metrics.commitment_stored(false);
        metrics.commitment_stored(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.expenses_registered, 2);
        assert_eq!(snapshot.debt_increases, 5);
        assert_eq!(snapshot.commitments, 2);
        assert_eq!(snapshot.commitments_overwritten, 1);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = EngineMetrics::new();
        metrics.settlement_success();

        let output = metrics.to_prometheus();
        assert!(output.contains("splitsettle_settlements_success 1"));
        assert!(output.contains("# TYPE splitsettle_groups_created counter"));
    }

    #[test]
    fn test_snapshot_json() {
        let metrics = EngineMetrics::new();
        metrics.group_created();

        let json = metrics.snapshot().to_json().unwrap();
        assert!(json.contains("\"groups_created\": 1"));
    }
}
