//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring record commits.
//!
//! # Metrics
//!
//! - `record_transitions_total` - Total transitions committed
//! - `record_conflicts_total` - Transitions lost to a version conflict
//! - `record_rejections_total` - Transitions rejected by the oracle
//! - `record_commit_duration_seconds` - Histogram of commit latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total transitions committed
    pub transitions_total: IntCounter,

    /// Transitions lost to a version conflict
    pub conflicts_total: IntCounter,

    /// Transitions rejected by the oracle
    pub rejections_total: IntCounter,

    /// Commit latency histogram
    pub commit_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transitions_total = IntCounter::with_opts(Opts::new(
            "record_transitions_total",
            "Total transitions committed",
        ))?;
        registry.register(Box::new(transitions_total.clone()))?;

        let conflicts_total = IntCounter::with_opts(Opts::new(
            "record_conflicts_total",
            "Transitions lost to a version conflict",
        ))?;
        registry.register(Box::new(conflicts_total.clone()))?;

        let rejections_total = IntCounter::with_opts(Opts::new(
            "record_rejections_total",
            "Transitions rejected by the oracle",
        ))?;
        registry.register(Box::new(rejections_total.clone()))?;

        let commit_duration = Histogram::with_opts(
            HistogramOpts::new(
                "record_commit_duration_seconds",
                "Histogram of commit latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(commit_duration.clone()))?;

        Ok(Self {
            transitions_total,
            conflicts_total,
            rejections_total,
            commit_duration,
            registry,
        })
    }

    /// Record a committed transition
    pub fn record_commit(&self, duration_seconds: f64) {
        self.transitions_total.inc();
        self.commit_duration.observe(duration_seconds);
    }

    /// Record a version conflict
    pub fn record_conflict(&self) {
        self.conflicts_total.inc();
    }

    /// Record an oracle rejection
    pub fn record_rejection(&self) {
        self.rejections_total.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.transitions_total.get(), 0);
        assert_eq!(metrics.conflicts_total.get(), 0);
    }

    #[test]
    fn test_record_commit() {
        let metrics = Metrics::new().unwrap();
        metrics.record_commit(0.002);
        metrics.record_commit(0.004);
        assert_eq!(metrics.transitions_total.get(), 2);
    }

    #[test]
    fn test_record_conflict() {
        let metrics = Metrics::new().unwrap();
        metrics.record_conflict();
        assert_eq!(metrics.conflicts_total.get(), 1);
    }

    #[test]
    fn test_independent_registries() {
        // Each instance owns a registry, so two collectors can coexist
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_commit(0.001);
        assert_eq!(a.transitions_total.get(), 1);
        assert_eq!(b.transitions_total.get(), 0);
    }
}
