// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The OrthoIndex Authors

//! Instrumentation hooks for index queries.
//!
//! Every query path takes a `&dyn MetricsCollector`. Callers that don't care
//! pass [`NoOpMetricsCollector`]; tests and benchmarks pass a
//! [`LocalMetricsCollector`] to assert pruning behavior (e.g. that a disjoint
//! rectangle visits far fewer than n nodes).

use std::sync::atomic::{AtomicUsize, Ordering};

pub trait MetricsCollector: Send + Sync {
    /// Record that `count` tree nodes were visited during a traversal.
    fn record_nodes_visited(&self, count: usize);

    /// Record that `count` coordinate comparisons were performed.
    fn record_comparisons(&self, count: usize);
}

/// A metrics collector that does nothing.
#[derive(Debug, Default)]
pub struct NoOpMetricsCollector;

impl MetricsCollector for NoOpMetricsCollector {
    fn record_nodes_visited(&self, _count: usize) {}
    fn record_comparisons(&self, _count: usize) {}
}

/// Accumulates counters locally. Cheap enough to use in tests and benches.
#[derive(Debug, Default)]
pub struct LocalMetricsCollector {
    nodes_visited: AtomicUsize,
    comparisons: AtomicUsize,
}

impl LocalMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes_visited(&self) -> usize {
        self.nodes_visited.load(Ordering::Relaxed)
    }

    pub fn comparisons(&self) -> usize {
        self.comparisons.load(Ordering::Relaxed)
    }
}

impl MetricsCollector for LocalMetricsCollector {
    fn record_nodes_visited(&self, count: usize) {
        self.nodes_visited.fetch_add(count, Ordering::Relaxed);
    }

    fn record_comparisons(&self, count: usize) {
        self.comparisons.fetch_add(count, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_collector_accumulates() {
        let metrics = LocalMetricsCollector::new();
        metrics.record_nodes_visited(3);
        metrics.record_nodes_visited(4);
        metrics.record_comparisons(10);
        assert_eq!(metrics.nodes_visited(), 7);
        assert_eq!(metrics.comparisons(), 10);
    }
}
