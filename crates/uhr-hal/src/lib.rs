//! Board abstractions for the clock's external collaborators.
//!
//! This crate provides:
//! - [`NetworkLink`], [`TimeSource`], [`LightSensor`], [`LampSink`], and
//!   [`TickSource`] traits, the seams between the time core and the board
//! - [`sim`] module with fully scriptable implementations for tests
//! - [`host`] module with host-backed implementations for running the
//!   daemon on a development machine
//!
//! The session only ever sees these traits; what actually answers (an SNTP
//! client and a WiFi manager, or a scripted stand-in) is wired up by the
//! daemon.

pub mod host;
pub mod sim;

pub use host::*;
pub use sim::*;

use uhr_common::{MonotonicTick, UhrResult, UtcInstant};

/// An RGB color as written to the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// All channels off.
    pub const OFF: Self = Self::new(0, 0, 0);

    /// Construct a color from channel values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A single lamp write: strip index plus the final color, already
/// brightness-scaled and gamma-corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LampWrite {
    /// Position on the strip.
    pub index: u8,
    /// Final color for that lamp.
    pub color: Rgb,
}

/// Network connectivity collaborator.
///
/// Owns its own credential, retry, and captive-portal policy; the session
/// only asks for a connection and observes status.
pub trait NetworkLink: Send {
    /// Obtain a connection, blocking until established or the collaborator
    /// gives up.
    ///
    /// The session calls this only from its network-acquisition phase; it is
    /// the one sanctioned blocking call in the whole cycle.
    fn ensure_connected(&mut self) -> bool;

    /// Cheap, non-blocking connectivity probe.
    fn is_connected(&mut self) -> bool;

    /// Fire-and-forget reconnect nudge; never blocks.
    fn request_reconnect(&mut self);
}

/// Authoritative time collaborator (the NTP transport lives behind this).
pub trait TimeSource: Send {
    /// Fire-and-forget: start an asynchronous fetch of the current UTC time.
    ///
    /// A request issued while the network is down is held, not dropped; the
    /// fetch completes once connectivity returns (or the session's wait
    /// bound expires first and a fresh request supersedes it).
    fn request_time_sync(&mut self);

    /// Non-blocking poll for a completed fetch.
    ///
    /// Implementations should discard instants below
    /// [`UtcInstant::MIN_PLAUSIBLE`], but callers must not rely on that and
    /// enforce the floor again themselves.
    fn read_time_if_valid(&mut self) -> Option<UtcInstant>;
}

/// Ambient-light collaborator.
pub trait LightSensor: Send {
    /// Raw ambient reading in 0..=1023.
    fn read_raw(&mut self) -> u16;
}

/// Physical lamp strip; consumes one composed frame per render cycle.
pub trait LampSink: Send {
    /// Write a frame to the strip.
    ///
    /// # Errors
    ///
    /// Returns an error if the physical write fails; the caller logs and
    /// carries on with the next cycle.
    fn write(&mut self, frame: &[LampWrite]) -> UhrResult<()>;
}

/// Source of the platform's wrapping millisecond counter.
pub trait TickSource: Send {
    /// Current monotonic tick.
    fn now(&mut self) -> MonotonicTick;
}
