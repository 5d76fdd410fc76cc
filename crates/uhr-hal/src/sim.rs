//! Scriptable collaborator implementations for tests and development.
//!
//! Each simulated collaborator exposes `set_*` hooks for scripting its
//! behavior and counters for asserting what the session asked of it. The
//! time source deliberately hands back whatever was scripted, including
//! implausible instants, so callers' own floor checks can be exercised.

use crate::{LampSink, LampWrite, LightSensor, NetworkLink, TickSource, TimeSource};
use uhr_common::{MonotonicTick, UhrResult, UtcInstant};

/// Scriptable network link.
///
/// Starts offline; `ensure_connected` always succeeds and brings it online,
/// as if the join completed. Tests drop the connection with
/// [`SimulatedNetwork::set_online`] and observe reconnect nudges through
/// [`SimulatedNetwork::reconnect_requests`].
#[derive(Debug, Default)]
pub struct SimulatedNetwork {
    online: bool,
    ensure_calls: u32,
    reconnect_requests: u32,
}

impl SimulatedNetwork {
    /// Create a simulated network, initially offline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the connectivity status.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// How many times the session blocked on `ensure_connected`.
    #[must_use]
    pub fn ensure_calls(&self) -> u32 {
        self.ensure_calls
    }

    /// How many reconnect nudges were issued.
    #[must_use]
    pub fn reconnect_requests(&self) -> u32 {
        self.reconnect_requests
    }
}

impl NetworkLink for SimulatedNetwork {
    fn ensure_connected(&mut self) -> bool {
        self.ensure_calls += 1;
        self.online = true;
        true
    }

    fn is_connected(&mut self) -> bool {
        self.online
    }

    fn request_reconnect(&mut self) {
        self.reconnect_requests += 1;
    }
}

/// Scriptable time source.
///
/// A reading scripted with [`SimulatedTimeSource::complete_with`] is handed
/// out on the next poll after a request was issued, mimicking an
/// asynchronous fetch completing. Without a scripted reading, polls stay
/// empty and the outstanding request is held, as a held-while-offline
/// request would be.
#[derive(Debug, Default)]
pub struct SimulatedTimeSource {
    pending_request: bool,
    next_reading: Option<UtcInstant>,
    requests: u32,
}

impl SimulatedTimeSource {
    /// Create a simulated time source with no scripted reading.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reading the next completed fetch will produce.
    pub fn complete_with(&mut self, reading: UtcInstant) {
        self.next_reading = Some(reading);
    }

    /// How many sync requests were issued.
    #[must_use]
    pub fn requests(&self) -> u32 {
        self.requests
    }

    /// True while a request is outstanding and unanswered.
    #[must_use]
    pub fn has_pending_request(&self) -> bool {
        self.pending_request
    }
}

impl TimeSource for SimulatedTimeSource {
    fn request_time_sync(&mut self) {
        self.pending_request = true;
        self.requests += 1;
    }

    fn read_time_if_valid(&mut self) -> Option<UtcInstant> {
        if !self.pending_request {
            return None;
        }
        let reading = self.next_reading.take()?;
        self.pending_request = false;
        Some(reading)
    }
}

/// Scriptable ambient-light sensor.
#[derive(Debug)]
pub struct SimulatedLightSensor {
    raw: u16,
}

impl Default for SimulatedLightSensor {
    fn default() -> Self {
        // Mid-range ambient light.
        Self { raw: 512 }
    }
}

impl SimulatedLightSensor {
    /// Create a simulated sensor reading mid-range light.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the raw reading, capped at the sensor's 10-bit range.
    pub fn set_raw(&mut self, raw: u16) {
        self.raw = raw.min(1023);
    }
}

impl LightSensor for SimulatedLightSensor {
    fn read_raw(&mut self) -> u16 {
        self.raw
    }
}

/// Lamp sink that retains the last written frame for assertions.
#[derive(Debug, Default)]
pub struct CapturingLamps {
    last_frame: Vec<LampWrite>,
    writes: u64,
}

impl CapturingLamps {
    /// Create a capturing sink with no frames written.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently written frame.
    #[must_use]
    pub fn last_frame(&self) -> &[LampWrite] {
        &self.last_frame
    }

    /// Total frames written.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}

impl LampSink for CapturingLamps {
    fn write(&mut self, frame: &[LampWrite]) -> UhrResult<()> {
        self.last_frame.clear();
        self.last_frame.extend_from_slice(frame);
        self.writes += 1;
        Ok(())
    }
}

/// Tick source advanced by hand.
#[derive(Debug, Default)]
pub struct ManualTicks {
    current: MonotonicTick,
}

impl ManualTicks {
    /// Create a manual tick source starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manual tick source starting at an arbitrary counter value,
    /// e.g. just below the wrap point.
    #[must_use]
    pub fn starting_at(tick: MonotonicTick) -> Self {
        Self { current: tick }
    }

    /// Advance the counter by `ms` milliseconds, wrapping like the hardware
    /// counter would.
    pub fn advance(&mut self, ms: u32) {
        self.current = self.current.advanced_by(ms);
    }

    /// The current counter value without consuming a poll.
    #[must_use]
    pub fn peek(&self) -> MonotonicTick {
        self.current
    }
}

impl TickSource for ManualTicks {
    fn now(&mut self) -> MonotonicTick {
        self.current
    }
}
