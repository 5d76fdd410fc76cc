//! The internal clock: a network reading anchored to the monotonic tick.
//!
//! The board has no battery-backed RTC. Absolute time exists only as a
//! [`ClockReference`]: the last absorbed network reading paired with the
//! tick at which it arrived. Current time is the reference plus the tick
//! delta since then, so it keeps advancing between syncs and drifts only
//! as far as the oscillator does; absorbing a fresh reading replaces the
//! whole reference and cancels the accumulated drift in one move.
//!
//! There is deliberately no slewing. A sync that lands a few seconds away
//! from the extrapolated time steps the display there immediately, which
//! on a wall clock is invisible and far simpler than rate adjustment.

use crossbeam_utils::atomic::AtomicCell;
use tracing::debug;
use uhr_common::error::{UhrError, UhrResult};
use uhr_common::time::{MonotonicTick, UtcInstant};

/// A time reading anchored to the tick at which it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReference {
    /// The absorbed UTC reading.
    pub utc: UtcInstant,
    /// The monotonic tick observed when the reading arrived.
    pub tick: MonotonicTick,
}

/// Monotonic-anchored UTC clock.
///
/// The reference is replaced wholesale on every accepted sync and never
/// mutated field by field, so a reader can never observe a fresh instant
/// against a stale anchor.
#[derive(Debug)]
pub struct InternalClock {
    reference: AtomicCell<Option<ClockReference>>,
}

impl Default for InternalClock {
    fn default() -> Self {
        Self::new()
    }
}

impl InternalClock {
    /// Create an unsynchronized clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reference: AtomicCell::new(None),
        }
    }

    /// True once at least one reading has been absorbed.
    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        self.reference.load().is_some()
    }

    /// The current reference pair, if any.
    #[must_use]
    pub fn reference(&self) -> Option<ClockReference> {
        self.reference.load()
    }

    /// Current UTC at the given tick.
    ///
    /// Before the first sync this reports the epoch; callers that need to
    /// tell "unset" from "1970" use [`InternalClock::synchronized_now`].
    #[must_use]
    pub fn now(&self, tick: MonotonicTick) -> UtcInstant {
        self.synchronized_now(tick).unwrap_or(UtcInstant::EPOCH)
    }

    /// Current UTC at the given tick, or `None` before the first sync.
    #[must_use]
    pub fn synchronized_now(&self, tick: MonotonicTick) -> Option<UtcInstant> {
        self.reference
            .load()
            .map(|r| r.utc.add_seconds(u64::from(tick.elapsed_since(r.tick).as_secs())))
    }

    /// Current UTC plus the milliseconds into the current second, or `None`
    /// before the first sync.
    ///
    /// The whole-second part matches [`InternalClock::synchronized_now`];
    /// the millisecond part is the phase the seconds-lamp fade runs on. The
    /// reference tick counts as the top of a second, which is all the fade
    /// needs: a steady phase, not sub-second absolute accuracy.
    #[must_use]
    pub fn now_with_phase(&self, tick: MonotonicTick) -> Option<(UtcInstant, u16)> {
        self.reference.load().map(|r| {
            let elapsed = tick.elapsed_since(r.tick);
            (
                r.utc.add_seconds(u64::from(elapsed.as_secs())),
                elapsed.subsec_millis(),
            )
        })
    }

    /// Absorb an authoritative reading taken at `tick`.
    ///
    /// Replaces the reference wholesale. Jumps in either direction are
    /// accepted; the network reading is authoritative, and the old
    /// reference only ever differs by drift or a stale sync.
    ///
    /// # Errors
    ///
    /// Rejects readings below [`UtcInstant::MIN_PLAUSIBLE`] with
    /// [`UhrError::ImplausibleReading`] and leaves the current reference in
    /// place.
    pub fn absorb(&self, reading: UtcInstant, tick: MonotonicTick) -> UhrResult<()> {
        if !reading.is_plausible() {
            return Err(UhrError::ImplausibleReading {
                reading_secs: reading.as_unix_seconds(),
                floor_secs: UtcInstant::MIN_PLAUSIBLE.as_unix_seconds(),
            });
        }

        self.reference.store(Some(ClockReference {
            utc: reading,
            tick,
        }));
        debug!(utc = reading.as_unix_seconds(), "clock reference replaced");
        Ok(())
    }
}
