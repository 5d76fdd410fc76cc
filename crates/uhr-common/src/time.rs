//! Instant and tick primitives for the clock core.
//!
//! Two deliberately incompatible notions of time:
//!
//! - [`UtcInstant`]: absolute civil time, whole seconds since the Unix epoch.
//!   Set only from an authoritative network reading.
//! - [`MonotonicTick`]: a wrapping millisecond counter since device start.
//!   It has no epoch meaning and wraps after ~49.7 days of uptime, so it is
//!   only ever used to measure *elapsed* time via wraparound-safe subtraction.
//!
//! Keeping them as separate types means an absolute instant can never be
//! compared against a tick by accident; the one sanctioned bridge is the
//! clock reference held by the internal clock.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An absolute point in time: whole seconds since 1970-01-01T00:00:00Z.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UtcInstant(u64);

impl UtcInstant {
    /// The Unix epoch itself; what the internal clock reports before any sync.
    pub const EPOCH: Self = Self(0);

    /// No real-world reading is earlier than this: 2021-01-01T00:00:00Z.
    ///
    /// Network readings below the floor are rejected as implausible by both
    /// the time-source poll and the internal clock.
    pub const MIN_PLAUSIBLE: Self = Self(1_609_459_200);

    /// Construct from a Unix timestamp in seconds.
    #[must_use]
    pub const fn from_unix_seconds(secs: u64) -> Self {
        Self(secs)
    }

    /// The raw Unix timestamp in seconds.
    #[must_use]
    pub const fn as_unix_seconds(self) -> u64 {
        self.0
    }

    /// This instant advanced by `secs` seconds.
    #[must_use]
    pub const fn add_seconds(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Whole seconds from `earlier` to `self`; zero if `earlier` is later.
    #[must_use]
    pub const fn seconds_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// The first whole-minute boundary strictly after this instant.
    ///
    /// Strictly after, not at-or-after: the resync scheduler reschedules from
    /// the instant that just fired, and scanning from that same boundary
    /// would report the same due moment twice.
    #[must_use]
    pub const fn next_minute(self) -> Self {
        Self((self.0 / 60 + 1) * 60)
    }

    /// True if this instant lies at or above the plausibility floor.
    #[must_use]
    pub const fn is_plausible(self) -> bool {
        self.0 >= Self::MIN_PLAUSIBLE.0
    }
}

/// A wrapping millisecond counter sampled from the platform's monotonic source.
///
/// The counter wraps modulo 2^32 (about 49.7 days); all arithmetic on it must
/// go through [`MonotonicTick::elapsed_since`], which is wraparound-safe in
/// the usual two's-complement way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MonotonicTick(u32);

impl MonotonicTick {
    /// Construct from a raw millisecond counter value.
    #[must_use]
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    /// This tick advanced by `ms` milliseconds, wrapping at the counter width.
    #[must_use]
    pub const fn advanced_by(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }

    /// Elapsed time from `earlier` to `self`.
    ///
    /// Correct across a single counter wrap: the unsigned wrapping subtraction
    /// yields the true delta as long as less than ~49.7 days separate the two
    /// observations, which the nightly resync cadence guarantees by a wide
    /// margin.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Self) -> TickDelta {
        TickDelta(self.0.wrapping_sub(earlier.0))
    }
}

/// Elapsed time between two tick observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TickDelta(u32);

impl TickDelta {
    /// Zero elapsed time.
    pub const ZERO: Self = Self(0);

    /// Construct from a millisecond count.
    #[must_use]
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    /// A configured [`Duration`] as a tick delta, saturating at the counter
    /// width (~49.7 days).
    #[must_use]
    pub fn from_duration(d: Duration) -> Self {
        Self(u32::try_from(d.as_millis()).unwrap_or(u32::MAX))
    }

    /// Elapsed milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Elapsed whole seconds (truncating).
    #[must_use]
    pub const fn as_secs(self) -> u32 {
        self.0 / 1000
    }

    /// Milliseconds past the last whole second; the sub-second phase used by
    /// the seconds-lamp fade.
    #[must_use]
    pub const fn subsec_millis(self) -> u16 {
        (self.0 % 1000) as u16
    }
}

/// Local wall-clock fields handed to the renderer each cycle.
///
/// `millis` is display-only phase information derived from tick deltas; the
/// clock itself synchronizes to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTime {
    /// Local hour, 0..=23.
    pub hour: u8,
    /// Local minute, 0..=59.
    pub minute: u8,
    /// Local second, 0..=59.
    pub second: u8,
    /// Milliseconds into the current second, 0..=999.
    pub millis: u16,
}
