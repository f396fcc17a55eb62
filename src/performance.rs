//! Timing and counter collection for server operations
//!
//! Disabled by default; `lmc.server.enableBenchmarking` turns it on and
//! `lmc.server.getBenchmarkReport` renders what was collected.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Clone, Default)]
pub struct PerformanceTracker {
    measurements: Arc<Mutex<HashMap<String, Vec<Duration>>>>,
    counters: Arc<Mutex<HashMap<String, u64>>>,
    enabled: Arc<Mutex<bool>>,
}

/// Summary of all recorded durations of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationStats {
    pub calls: usize,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
    pub p50: Duration,
    pub p95: Duration,
}

impl OperationStats {
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let mut sorted = samples.to_vec();
        sorted.sort();
        let calls = sorted.len();
        let min = *sorted.first()?;
        let max = *sorted.last()?;
        let percentile = |p: f64| sorted[((calls as f64 * p) as usize).min(calls - 1)];

        Some(OperationStats {
            calls,
            total: sorted.iter().sum(),
            min,
            max,
            p50: percentile(0.5),
            p95: percentile(0.95),
        })
    }

    pub fn average(&self) -> Duration {
        self.total / self.calls as u32
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.lock()
    }

    /// Enabling starts a fresh collection
    pub fn set_enabled(&self, enabled: bool) {
        *self.enabled.lock() = enabled;
        if enabled {
            self.reset();
        }
    }

    pub fn record(&self, operation: &str, duration: Duration) {
        if !self.is_enabled() {
            return;
        }

        self.measurements
            .lock()
            .entry(operation.to_string())
            .or_default()
            .push(duration);
    }

    pub fn increment(&self, counter: &str, amount: u64) {
        if !self.is_enabled() {
            return;
        }

        *self.counters.lock().entry(counter.to_string()).or_insert(0) += amount;
    }

    pub fn stats(&self, operation: &str) -> Option<OperationStats> {
        let measurements = self.measurements.lock();
        OperationStats::from_samples(measurements.get(operation)?)
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    pub fn reset(&self) {
        self.measurements.lock().clear();
        self.counters.lock().clear();
    }

    pub fn generate_report(&self) -> String {
        let rule = "=".repeat(72);
        let mut report = format!("{}\nLMC Language Server Performance Report\n{}\n\n", rule, rule);

        report.push_str("TIMING\n");
        let mut operations: Vec<String> = self.measurements.lock().keys().cloned().collect();
        operations.sort();
        let operations: Vec<_> = operations
            .into_iter()
            .filter_map(|name| Some((self.stats(&name)?, name)))
            .collect();

        if operations.is_empty() {
            report.push_str("  No timing data collected\n");
        }
        for (stats, operation) in operations {
            report.push_str(&format!(
                "  {}: {} calls, total {:.2}ms, avg {:.2}ms, min {:.2}ms, max {:.2}ms, p50 {:.2}ms, p95 {:.2}ms\n",
                operation,
                stats.calls,
                millis(stats.total),
                millis(stats.average()),
                millis(stats.min),
                millis(stats.max),
                millis(stats.p50),
                millis(stats.p95),
            ));
        }

        report.push_str("\nCOUNTERS\n");
        let mut names: Vec<String> = self.counters.lock().keys().cloned().collect();
        names.sort();
        if names.is_empty() {
            report.push_str("  No counter data collected\n");
        }
        for name in names {
            report.push_str(&format!("  {}: {}\n", name, self.counter(&name)));
        }

        report.push_str(&rule);
        report.push('\n');
        report
    }
}

/// RAII guard for automatic timing
pub struct TimingGuard {
    tracker: PerformanceTracker,
    operation: &'static str,
    start: Instant,
}

impl TimingGuard {
    pub fn new(tracker: &PerformanceTracker, operation: &'static str) -> Self {
        Self {
            tracker: tracker.clone(),
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        self.tracker.record(self.operation, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracker_records_nothing() {
        let tracker = PerformanceTracker::new();
        tracker.record("analyze", Duration::from_millis(3));
        tracker.increment("cache_hits", 1);
        assert!(tracker.stats("analyze").is_none());
        assert_eq!(tracker.counter("cache_hits"), 0);
    }

    #[test]
    fn stats_summarize_samples() {
        let tracker = PerformanceTracker::new();
        tracker.set_enabled(true);
        for ms in [4, 1, 3, 2] {
            tracker.record("analyze", Duration::from_millis(ms));
        }
        let stats = tracker.stats("analyze").unwrap();
        assert_eq!(stats.calls, 4);
        assert_eq!(stats.min, Duration::from_millis(1));
        assert_eq!(stats.max, Duration::from_millis(4));
        assert_eq!(stats.total, Duration::from_millis(10));
        assert_eq!(stats.p50, Duration::from_millis(3));
    }

    #[test]
    fn enabling_resets_and_guard_records() {
        let tracker = PerformanceTracker::new();
        tracker.set_enabled(true);
        tracker.increment("cache_hits", 2);
        tracker.set_enabled(true);
        assert_eq!(tracker.counter("cache_hits"), 0);

        {
            let _guard = TimingGuard::new(&tracker, "hover");
        }
        assert_eq!(tracker.stats("hover").map(|s| s.calls), Some(1));
        let report = tracker.generate_report();
        assert!(report.contains("hover: 1 calls"));
        assert!(report.contains("No counter data collected"));
    }

    #[test]
    fn report_lists_counters_in_name_order() {
        let tracker = PerformanceTracker::new();
        tracker.set_enabled(true);
        tracker.increment("lmc.server.diagnostics.cache_misses", 1);
        tracker.increment("lmc.server.diagnostics.cache_hits", 2);
        tracker.increment("lmc.server.diagnostics.cache_hits", 1);
        let report = tracker.generate_report();
        let hits = report.find("lmc.server.diagnostics.cache_hits: 3").unwrap();
        let misses = report.find("lmc.server.diagnostics.cache_misses: 1").unwrap();
        assert!(hits < misses);
        assert!(report.contains("No timing data collected"));
    }
}
