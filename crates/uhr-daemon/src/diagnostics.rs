//! Diagnostics and health reporting for the clock daemon.
//!
//! Tracks cycle accounting and collaborator health, and renders a single
//! JSON status line for log scraping by external monitoring.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use uhr_common::metrics::CycleMetrics;
use uhr_common::state::SessionPhase;
use uhr_runtime::session::SessionStats;

/// Health of the clock as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Acquiring network or time before the first synchronization.
    Starting,
    /// Displaying synchronized time with a quiet loop.
    Healthy,
    /// Displaying stale time, link down, or missing cycle deadlines.
    Degraded,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Starting => write!(f, "starting"),
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// Snapshot of daemon diagnostics at a point in time.
#[derive(Debug, Clone)]
pub struct DiagnosticsSnapshot {
    /// Current health status.
    pub health: HealthStatus,
    /// Current session phase.
    pub phase: SessionPhase,
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Number of cycle overruns.
    pub overrun_count: u64,
    /// Uptime since daemon start.
    pub uptime: Duration,
    /// Last cycle execution time.
    pub last_cycle_time: Option<Duration>,
    /// Average cycle time (if available).
    pub avg_cycle_time: Option<Duration>,
    /// Maximum cycle time observed.
    pub max_cycle_time: Option<Duration>,
    /// Whether the network link is up.
    pub link_online: bool,
    /// Whether the internal clock holds a synchronized reference.
    pub time_synchronized: bool,
    /// Time readings absorbed into the internal clock.
    pub syncs_accepted: u64,
    /// Time readings rejected as implausible.
    pub syncs_rejected: u64,
    /// Acquisitions abandoned after the wait budget.
    pub acquire_timeouts: u64,
    /// Forced reacquisitions after prolonged link loss.
    pub forced_resets: u64,
}

/// Shared diagnostics state updated by the clock loop.
#[derive(Debug)]
pub struct DiagnosticsState {
    /// Total cycles executed.
    cycle_count: AtomicU64,
    /// Number of cycle overruns.
    overrun_count: AtomicU64,
    /// Last cycle time in nanoseconds.
    last_cycle_ns: AtomicU64,
    /// Network link status.
    link_online: AtomicBool,
    /// Internal clock synchronization status.
    time_synchronized: AtomicBool,
    /// Daemon start time.
    start_time: Instant,
}

impl Default for DiagnosticsState {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsState {
    /// Create new diagnostics state.
    pub fn new() -> Self {
        Self {
            cycle_count: AtomicU64::new(0),
            overrun_count: AtomicU64::new(0),
            last_cycle_ns: AtomicU64::new(0),
            link_online: AtomicBool::new(false),
            time_synchronized: AtomicBool::new(false),
            start_time: Instant::now(),
        }
    }

    /// Record a completed cycle.
    pub fn record_cycle(&self, execution_time: Duration, overrun: bool) {
        self.cycle_count.fetch_add(1, Ordering::Relaxed);
        self.last_cycle_ns
            .store(execution_time.as_nanos() as u64, Ordering::Relaxed);
        if overrun {
            self.overrun_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Set network link status.
    pub fn set_link_online(&self, online: bool) {
        self.link_online.store(online, Ordering::Relaxed);
    }

    /// Set internal clock synchronization status.
    pub fn set_time_synchronized(&self, synchronized: bool) {
        self.time_synchronized.store(synchronized, Ordering::Relaxed);
    }

    /// Get total cycle count.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count.load(Ordering::Relaxed)
    }

    /// Get overrun count.
    pub fn overrun_count(&self) -> u64 {
        self.overrun_count.load(Ordering::Relaxed)
    }

    /// Get uptime since daemon start.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get last cycle time.
    pub fn last_cycle_time(&self) -> Option<Duration> {
        let ns = self.last_cycle_ns.load(Ordering::Relaxed);
        if ns > 0 {
            Some(Duration::from_nanos(ns))
        } else {
            None
        }
    }

    /// Check if the network link is up.
    pub fn is_link_online(&self) -> bool {
        self.link_online.load(Ordering::Relaxed)
    }

    /// Check if the internal clock is synchronized.
    pub fn is_time_synchronized(&self) -> bool {
        self.time_synchronized.load(Ordering::Relaxed)
    }
}

/// Diagnostics collector that aggregates runtime information.
pub struct DiagnosticsCollector {
    state: Arc<DiagnosticsState>,
}

impl DiagnosticsCollector {
    /// Create a new diagnostics collector.
    pub fn new(state: Arc<DiagnosticsState>) -> Self {
        Self { state }
    }

    /// Determine health status from the session phase.
    ///
    /// A session that lost its link or its deadline budget is degraded but
    /// keeps displaying; only a clock that never synchronized is starting.
    pub fn health_from_phase(&self, phase: SessionPhase) -> HealthStatus {
        match phase {
            SessionPhase::AcquiringNetwork | SessionPhase::AcquiringTime => {
                if self.state.is_time_synchronized() {
                    // Reacquiring while the face shows stale time.
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Starting
                }
            }
            SessionPhase::Displaying => {
                let overrun_rate = if self.state.cycle_count() > 0 {
                    self.state.overrun_count() as f64 / self.state.cycle_count() as f64
                } else {
                    0.0
                };

                if overrun_rate > 0.01 || !self.state.is_link_online() {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                }
            }
        }
    }

    /// Create a snapshot of current diagnostics.
    pub fn snapshot(
        &self,
        phase: SessionPhase,
        stats: SessionStats,
        metrics: &CycleMetrics,
    ) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            health: self.health_from_phase(phase),
            phase,
            cycle_count: self.state.cycle_count(),
            overrun_count: self.state.overrun_count(),
            uptime: self.state.uptime(),
            last_cycle_time: self.state.last_cycle_time(),
            avg_cycle_time: metrics.mean(),
            max_cycle_time: metrics.max(),
            link_online: self.state.is_link_online(),
            time_synchronized: self.state.is_time_synchronized(),
            syncs_accepted: stats.syncs_accepted,
            syncs_rejected: stats.syncs_rejected,
            acquire_timeouts: stats.acquire_timeouts,
            forced_resets: stats.forced_resets,
        }
    }

    /// Get the underlying state for updates.
    pub fn state(&self) -> &Arc<DiagnosticsState> {
        &self.state
    }
}

/// Format a diagnostics snapshot as a single JSON status line.
pub fn format_status_json(snapshot: &DiagnosticsSnapshot) -> String {
    serde_json::json!({
        "health": snapshot.health.to_string(),
        "phase": snapshot.phase.to_string(),
        "cycles": snapshot.cycle_count,
        "overruns": snapshot.overrun_count,
        "uptime_secs": snapshot.uptime.as_secs(),
        "last_cycle_us": snapshot.last_cycle_time.map(|d| d.as_micros() as u64),
        "avg_cycle_us": snapshot.avg_cycle_time.map(|d| d.as_micros() as u64),
        "max_cycle_us": snapshot.max_cycle_time.map(|d| d.as_micros() as u64),
        "link_online": snapshot.link_online,
        "time_synchronized": snapshot.time_synchronized,
        "syncs_accepted": snapshot.syncs_accepted,
        "syncs_rejected": snapshot.syncs_rejected,
        "acquire_timeouts": snapshot.acquire_timeouts,
        "forced_resets": snapshot.forced_resets,
    })
    .to_string()
}
