//! Render-cycle timing metrics.
//!
//! A fixed-capacity ring of recent cycle durations plus lifetime counters,
//! allocation-free on the record path so it can sit inside the 20 ms loop.
//! The seconds-lamp fade makes cadence jitter directly visible on the
//! device, which is why the loop is measured at all.

use std::time::Duration;

/// Cycle execution metrics with a ring buffer for latency tracking.
#[derive(Debug)]
pub struct CycleMetrics {
    /// Ring buffer of recent cycle durations in nanoseconds.
    samples: Box<[u64]>,
    /// Next write position in the ring.
    write_pos: usize,
    /// Number of valid samples (saturates at the ring capacity).
    sample_count: usize,
    /// Lifetime cycle count.
    total_cycles: u64,
    /// Lifetime minimum cycle time in nanoseconds.
    min_ns: u64,
    /// Lifetime maximum cycle time in nanoseconds.
    max_ns: u64,
    /// Lifetime sum for the mean.
    sum_ns: u64,
    /// Cycles that exceeded the deadline.
    late_cycles: u64,
    /// Cycle deadline in nanoseconds (cycle time plus allowed overrun).
    deadline_ns: u64,
}

impl CycleMetrics {
    /// Create a collector keeping `histogram_size` recent samples; cycles
    /// longer than `deadline` count as late.
    #[must_use]
    pub fn new(histogram_size: usize, deadline: Duration) -> Self {
        Self {
            samples: vec![0u64; histogram_size.max(1)].into_boxed_slice(),
            write_pos: 0,
            sample_count: 0,
            total_cycles: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            sum_ns: 0,
            late_cycles: 0,
            deadline_ns: deadline.as_nanos() as u64,
        }
    }

    /// Record one cycle's execution time.
    pub fn record(&mut self, duration: Duration) {
        let ns = duration.as_nanos() as u64;

        self.samples[self.write_pos] = ns;
        self.write_pos = (self.write_pos + 1) % self.samples.len();
        self.sample_count = self.sample_count.saturating_add(1).min(self.samples.len());

        self.total_cycles += 1;
        self.min_ns = self.min_ns.min(ns);
        self.max_ns = self.max_ns.max(ns);
        self.sum_ns = self.sum_ns.wrapping_add(ns);

        if ns > self.deadline_ns {
            self.late_cycles += 1;
        }
    }

    /// Lifetime cycle count.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Lifetime minimum cycle time, if any cycle has run.
    #[must_use]
    pub fn min(&self) -> Option<Duration> {
        (self.total_cycles > 0).then(|| Duration::from_nanos(self.min_ns))
    }

    /// Lifetime maximum cycle time, if any cycle has run.
    #[must_use]
    pub fn max(&self) -> Option<Duration> {
        (self.total_cycles > 0).then(|| Duration::from_nanos(self.max_ns))
    }

    /// Lifetime mean cycle time, if any cycle has run.
    #[must_use]
    pub fn mean(&self) -> Option<Duration> {
        (self.total_cycles > 0).then(|| Duration::from_nanos(self.sum_ns / self.total_cycles))
    }

    /// Cycles that exceeded the deadline.
    #[must_use]
    pub fn late_cycles(&self) -> u64 {
        self.late_cycles
    }

    /// Percentile over the retained window, 0.0..=100.0.
    ///
    /// Returns `None` with no samples or an out-of-range/NaN percentile.
    #[must_use]
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.sample_count == 0 || !(0.0..=100.0).contains(&percentile) {
            return None;
        }

        let mut sorted: Vec<u64> = self.samples[..self.sample_count].to_vec();
        sorted.sort_unstable();

        let idx = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        Some(Duration::from_nanos(sorted[idx.min(sorted.len() - 1)]))
    }

    /// Immutable snapshot for reporting.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let seen = self.total_cycles > 0;
        MetricsSnapshot {
            total_cycles: self.total_cycles,
            min_ns: seen.then_some(self.min_ns),
            max_ns: seen.then_some(self.max_ns),
            mean_ns: seen.then(|| self.sum_ns / self.total_cycles),
            late_cycles: self.late_cycles,
            sample_count: self.sample_count,
        }
    }

    /// Reset all counters and samples.
    pub fn reset(&mut self) {
        self.samples.fill(0);
        self.write_pos = 0;
        self.sample_count = 0;
        self.total_cycles = 0;
        self.min_ns = u64::MAX;
        self.max_ns = 0;
        self.sum_ns = 0;
        self.late_cycles = 0;
    }
}

/// Immutable snapshot of cycle metrics for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Lifetime cycle count.
    pub total_cycles: u64,
    /// Minimum cycle time in nanoseconds.
    pub min_ns: Option<u64>,
    /// Maximum cycle time in nanoseconds.
    pub max_ns: Option<u64>,
    /// Mean cycle time in nanoseconds.
    pub mean_ns: Option<u64>,
    /// Cycles that exceeded the deadline.
    pub late_cycles: u64,
    /// Number of samples in the retained window.
    pub sample_count: usize,
}

impl MetricsSnapshot {
    /// Jitter (max - min) in nanoseconds.
    #[must_use]
    pub fn jitter_ns(&self) -> Option<u64> {
        match (self.min_ns, self.max_ns) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deadline_25ms() -> Duration {
        Duration::from_millis(25)
    }

    #[test]
    fn test_basic_recording() {
        let mut metrics = CycleMetrics::new(100, deadline_25ms());

        metrics.record(Duration::from_millis(19));
        metrics.record(Duration::from_millis(21));
        metrics.record(Duration::from_millis(20));

        assert_eq!(metrics.total_cycles(), 3);
        assert_eq!(metrics.min(), Some(Duration::from_millis(19)));
        assert_eq!(metrics.max(), Some(Duration::from_millis(21)));
        assert_eq!(metrics.mean(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_late_cycle_counting() {
        let mut metrics = CycleMetrics::new(100, deadline_25ms());

        metrics.record(Duration::from_millis(20)); // on time
        metrics.record(Duration::from_millis(30)); // late
        metrics.record(Duration::from_millis(24)); // on time
        metrics.record(Duration::from_millis(40)); // late

        assert_eq!(metrics.late_cycles(), 2);
    }

    #[test]
    fn test_percentile_calculation() {
        let mut metrics = CycleMetrics::new(100, deadline_25ms());
        for i in 1..=100 {
            metrics.record(Duration::from_micros(i));
        }

        let p50 = metrics.percentile(50.0).unwrap();
        assert!((49..=51).contains(&p50.as_micros()));

        let p99 = metrics.percentile(99.0).unwrap();
        assert!((98..=100).contains(&p99.as_micros()));
    }

    #[test]
    fn test_percentile_validation() {
        let mut metrics = CycleMetrics::new(100, deadline_25ms());
        assert!(metrics.percentile(50.0).is_none()); // no samples yet

        metrics.record(Duration::from_millis(20));
        assert!(metrics.percentile(0.0).is_some());
        assert!(metrics.percentile(100.0).is_some());
        assert!(metrics.percentile(-1.0).is_none());
        assert!(metrics.percentile(101.0).is_none());
        assert!(metrics.percentile(f64::NAN).is_none());
    }

    #[test]
    fn test_ring_window_caps_samples() {
        let mut metrics = CycleMetrics::new(10, deadline_25ms());
        for i in 0..25 {
            metrics.record(Duration::from_micros(i));
        }

        assert_eq!(metrics.total_cycles(), 25);
        assert_eq!(metrics.snapshot().sample_count, 10);
    }

    #[test]
    fn test_snapshot_and_jitter() {
        let mut metrics = CycleMetrics::new(100, deadline_25ms());
        metrics.record(Duration::from_millis(18));
        metrics.record(Duration::from_millis(22));

        let snap = metrics.snapshot();
        assert_eq!(snap.total_cycles, 2);
        assert_eq!(snap.jitter_ns(), Some(4_000_000));
    }

    #[test]
    fn test_reset() {
        let mut metrics = CycleMetrics::new(100, deadline_25ms());
        metrics.record(Duration::from_millis(30));
        assert_eq!(metrics.late_cycles(), 1);

        metrics.reset();
        assert_eq!(metrics.total_cycles(), 0);
        assert_eq!(metrics.late_cycles(), 0);
        assert!(metrics.min().is_none());
    }
}
