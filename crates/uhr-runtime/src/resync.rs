//! Nightly resync scheduling.
//!
//! The resync moment is configured as a local wall-clock hh:mm. Finding
//! the UTC instant that next shows that wall time is done by forward scan
//! rather than by inverting the offset: what matters is the offset in
//! force AT the target, and around the seasonal transitions "local minus
//! today's offset" picks the wrong side of the change. Scanning minute
//! boundaries and asking "does this instant display hh:mm?" is correct by
//! construction, including on the two mornings a year where a wall time
//! is skipped or occurs twice.

use tracing::debug;
use uhr_common::calendar::to_local;
use uhr_common::time::UtcInstant;

/// Upper bound on the minute-boundary scan. 48 hours covers the worst
/// case: a target wall time inside the hour skipped by the spring
/// transition, which next occurs the day after.
const SCAN_LIMIT_MINUTES: u32 = 2 * 24 * 60;

/// Schedules the nightly resync at a configured local wall time.
#[derive(Debug, Clone)]
pub struct ResyncScheduler {
    hour: u8,
    minute: u8,
    next: Option<UtcInstant>,
}

impl ResyncScheduler {
    /// Create an unarmed scheduler targeting `hour:minute` local time.
    #[must_use]
    pub fn new(hour: u8, minute: u8) -> Self {
        Self {
            hour,
            minute,
            next: None,
        }
    }

    /// The armed resync instant, if any.
    #[must_use]
    pub fn next(&self) -> Option<UtcInstant> {
        self.next
    }

    /// The first UTC instant strictly after `from` whose local wall clock
    /// reads the configured hh:mm.
    ///
    /// Strictly after: rescheduling happens from the instant that just
    /// fired, and an at-or-after scan would return that same instant and
    /// fire it again. Should the scan ever exhaust its window (impossible
    /// for a valid hh:mm), a plain 24-hour retry is returned rather than
    /// leaving the resync unscheduled.
    #[must_use]
    pub fn schedule_next(&self, from: UtcInstant) -> UtcInstant {
        let mut candidate = from.next_minute();
        for _ in 0..SCAN_LIMIT_MINUTES {
            let (hour, minute, _) = to_local(candidate).hms();
            if hour == self.hour && minute == self.minute {
                return candidate;
            }
            candidate = candidate.add_seconds(60);
        }
        from.add_seconds(86_400)
    }

    /// Arm the scheduler with the first target after `from`.
    pub fn arm(&mut self, from: UtcInstant) {
        let next = self.schedule_next(from);
        debug!(at = next.as_unix_seconds(), "resync armed");
        self.next = Some(next);
    }

    /// True once the armed instant has been reached.
    ///
    /// Each armed instant is reported at most once: the moment it fires,
    /// the scheduler re-arms itself from `now`, so the crossed deadline is
    /// consumed by the observation. An unarmed scheduler is never due.
    pub fn is_due(&mut self, now: UtcInstant) -> bool {
        match self.next {
            Some(at) if now >= at => {
                self.arm(now);
                true
            }
            _ => false,
        }
    }

    /// Change the target wall time and disarm.
    ///
    /// The caller re-arms once it knows the current instant; a stale armed
    /// moment for the old target must not fire in the meantime.
    pub fn retarget(&mut self, hour: u8, minute: u8) {
        self.hour = hour;
        self.minute = minute;
        self.next = None;
    }
}
