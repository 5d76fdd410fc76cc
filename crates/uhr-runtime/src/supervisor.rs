//! Connectivity supervision.
//!
//! The board's Wi-Fi drops silently and the driver's own reconnect logic
//! sometimes wedges. The supervisor watches the link every cycle and gives
//! one of three verdicts: fine, down but within grace, or down for so long
//! that the session must restart its acquisition sequence from scratch.

use tracing::warn;
use uhr_common::time::{MonotonicTick, TickDelta};

/// Per-cycle verdict on the network link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkVerdict {
    /// Link is up.
    Online,
    /// Link is down but within the grace window; a reconnect nudge is in
    /// order.
    Offline {
        /// How long the link has been down.
        down_for: TickDelta,
    },
    /// Link has been down longer than the grace window; the session must
    /// restart acquisition from scratch.
    ForceReset,
}

/// Watches link state and escalates a persistent outage.
#[derive(Debug)]
pub struct ConnectivitySupervisor {
    grace: TickDelta,
    absent_since: Option<MonotonicTick>,
}

impl ConnectivitySupervisor {
    /// Create a supervisor with the given grace window.
    #[must_use]
    pub fn new(grace: TickDelta) -> Self {
        Self {
            grace,
            absent_since: None,
        }
    }

    /// True while an outage is being timed.
    #[must_use]
    pub fn outage_in_progress(&self) -> bool {
        self.absent_since.is_some()
    }

    /// Observe the link state at `now`.
    ///
    /// The absence anchor is set on the first offline observation and left
    /// alone on later ones, so the outage is timed from its start.
    /// [`LinkVerdict::ForceReset`] is returned exactly once per window,
    /// when the downtime first exceeds (strictly) the grace bound; the
    /// anchor is cleared along with it, so an outage that persists opens a
    /// fresh window rather than escalating every cycle.
    pub fn observe(&mut self, now: MonotonicTick, connected: bool) -> LinkVerdict {
        if connected {
            self.absent_since = None;
            return LinkVerdict::Online;
        }

        let since = *self.absent_since.get_or_insert(now);
        let down_for = now.elapsed_since(since);
        if down_for > self.grace {
            warn!(
                down_ms = down_for.as_millis(),
                grace_ms = self.grace.as_millis(),
                "link outage exceeded grace window"
            );
            self.absent_since = None;
            return LinkVerdict::ForceReset;
        }
        LinkVerdict::Offline { down_for }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: TickDelta = TickDelta::from_millis(60_000);

    fn tick(ms: u32) -> MonotonicTick {
        MonotonicTick::from_millis(ms)
    }

    #[test]
    fn test_online_is_quiet() {
        let mut sup = ConnectivitySupervisor::new(GRACE);
        assert_eq!(sup.observe(tick(0), true), LinkVerdict::Online);
        assert_eq!(sup.observe(tick(100_000), true), LinkVerdict::Online);
        assert!(!sup.outage_in_progress());
    }

    #[test]
    fn test_reset_only_strictly_past_grace() {
        let mut sup = ConnectivitySupervisor::new(GRACE);

        assert_eq!(
            sup.observe(tick(0), false),
            LinkVerdict::Offline {
                down_for: TickDelta::ZERO
            }
        );
        // One millisecond short of the bound.
        assert_eq!(
            sup.observe(tick(59_999), false),
            LinkVerdict::Offline {
                down_for: TickDelta::from_millis(59_999)
            }
        );
        // Exactly at the bound: still within grace, the comparison is strict.
        assert_eq!(
            sup.observe(tick(60_000), false),
            LinkVerdict::Offline {
                down_for: TickDelta::from_millis(60_000)
            }
        );
        // Past it: escalate, exactly once.
        assert_eq!(sup.observe(tick(60_001), false), LinkVerdict::ForceReset);
        assert!(!sup.outage_in_progress());
    }

    #[test]
    fn test_persistent_outage_opens_fresh_window() {
        let mut sup = ConnectivitySupervisor::new(GRACE);
        sup.observe(tick(0), false);
        assert_eq!(sup.observe(tick(60_001), false), LinkVerdict::ForceReset);

        // Still down: a new window starts at the next observation, and a
        // second escalation needs a full further grace period.
        assert_eq!(
            sup.observe(tick(60_002), false),
            LinkVerdict::Offline {
                down_for: TickDelta::ZERO
            }
        );
        assert_eq!(
            sup.observe(tick(120_002), false),
            LinkVerdict::Offline {
                down_for: TickDelta::from_millis(60_000)
            }
        );
        assert_eq!(sup.observe(tick(120_003), false), LinkVerdict::ForceReset);
    }

    #[test]
    fn test_reconnect_clears_anchor() {
        let mut sup = ConnectivitySupervisor::new(GRACE);
        sup.observe(tick(0), false);
        assert!(sup.outage_in_progress());

        assert_eq!(sup.observe(tick(30_000), true), LinkVerdict::Online);
        assert!(!sup.outage_in_progress());

        // A later outage is timed from its own start.
        sup.observe(tick(100_000), false);
        assert_eq!(
            sup.observe(tick(159_000), false),
            LinkVerdict::Offline {
                down_for: TickDelta::from_millis(59_000)
            }
        );
    }

    #[test]
    fn test_anchor_is_first_observation() {
        let mut sup = ConnectivitySupervisor::new(GRACE);
        sup.observe(tick(1_000), false);
        // Later observations do not move the anchor.
        assert_eq!(
            sup.observe(tick(31_000), false),
            LinkVerdict::Offline {
                down_for: TickDelta::from_millis(30_000)
            }
        );
    }

    #[test]
    fn test_outage_across_tick_wrap() {
        let mut sup = ConnectivitySupervisor::new(GRACE);
        let start = MonotonicTick::from_millis(u32::MAX - 10_000);
        sup.observe(start, false);

        // 70 s later the counter has wrapped; the window is still measured
        // from the outage start.
        assert_eq!(
            sup.observe(start.advanced_by(70_000), false),
            LinkVerdict::ForceReset
        );
    }
}
