//! Simulation metrics.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use splitsettle_common::Amount;

/// Simulation metrics.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationMetrics {
    /// Expenses registered.
    pub expenses: u64,
    /// Simplifications applied.
    pub simplifications: u64,
    /// Debt entries removed by simplification.
    pub entries_removed: u64,
    /// Applies rejected because another commit overtook them.
    pub overtaken_applies: u64,
    /// Settlements attempted.
    pub total_settlements: u64,
    /// Successful settlements.
    pub successful_settlements: u64,
    /// Failed settlements.
    pub failed_settlements: u64,
    /// Value moved by settlements.
    pub value_settled: Amount,
    /// Assertions that held.
    pub assertions_passed: u64,
    /// Descriptions of assertions that failed.
    pub assertion_failures: Vec<String>,
    /// Events seen on the engine feed, by name.
    pub events: BTreeMap<String, u64>,
    /// Events dropped because the feed lagged.
    pub events_missed: u64,
    /// Settlement latency samples (microseconds).
    #[serde(skip)]
    latency_samples: VecDeque<u64>,
    #[serde(skip)]
    max_samples: usize,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self {
            expenses: 0,
            simplifications: 0,
            entries_removed: 0,
            overtaken_applies: 0,
            total_settlements: 0,
            successful_settlements: 0,
            failed_settlements: 0,
            value_settled: 0,
            assertions_passed: 0,
            assertion_failures: Vec::new(),
            events: BTreeMap::new(),
            events_missed: 0,
            latency_samples: VecDeque::with_capacity(10000),
            max_samples: 10000,
        }
    }

    /// Record a successful settlement.
    pub fn record_settlement(&mut self, amount: Amount, latency_us: u64) {
        self.total_settlements += 1;
        self.successful_settlements += 1;
        self.value_settled = self.value_settled.saturating_add(amount);

        if self.latency_samples.len() >= self.max_samples {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(latency_us);
    }

    /// Record a failed settlement.
    pub fn record_failure(&mut self) {
        self.total_settlements += 1;
        self.failed_settlements += 1;
    }

    /// Record an assertion outcome.
    pub fn record_assertion(&mut self, passed: bool, description: impl Into<String>) {
        if passed {
            self.assertions_passed += 1;
        } else {
            self.assertion_failures.push(description.into());
        }
    }

    /// Count one event from the engine feed.
    pub fn record_event(&mut self, name: &str) {
        *self.events.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Whether every assertion held.
    pub fn all_passed(&self) -> bool {
        self.assertion_failures.is_empty()
    }

    /// Get average settlement latency in microseconds.
    pub fn average_latency_us(&self) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let sum: u64 = self.latency_samples.iter().sum();
        sum / self.latency_samples.len() as u64
    }

    /// Get p99 settlement latency in microseconds.
    pub fn p99_latency_us(&self) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let mut sorted: Vec<_> = self.latency_samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (sorted.len() * 99 / 100).min(sorted.len() - 1);
        sorted[idx]
    }

    /// Get settlement success rate.
    pub fn success_rate(&self) -> f64 {
        if self.total_settlements == 0 {
            return 0.0;
        }

        self.successful_settlements as f64 / self.total_settlements as f64
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let mut metrics = SimulationMetrics::new();

        metrics.record_settlement(10, 100);
        metrics.record_settlement(20, 200);
        metrics.record_settlement(30, 150);
        metrics.record_failure();

        assert_eq!(metrics.total_settlements, 4);
        assert_eq!(metrics.successful_settlements, 3);
        assert_eq!(metrics.failed_settlements, 1);
        assert_eq!(metrics.value_settled, 60);
        assert_eq!(metrics.average_latency_us(), 150);
        assert_eq!(metrics.p99_latency_us(), 200);
        assert_eq!(metrics.success_rate(), 0.75);
    }

    #[test]
    fn test_assertions() {
        let mut metrics = SimulationMetrics::new();
        metrics.record_assertion(true, "ok");
        assert!(metrics.all_passed());

        metrics.record_assertion(false, "debt mismatch");
        assert!(!metrics.all_passed());
        assert_eq!(metrics.assertion_failures, vec!["debt mismatch".to_string()]);
    }
}
