//! Host-backed collaborators for running the daemon on a development
//! machine: the process monotonic clock supplies ticks, the machine's wall
//! clock stands in for the network time source, and connectivity is assumed
//! from the host.

use crate::{LampSink, LampWrite, LightSensor, NetworkLink, TickSource, TimeSource};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use uhr_common::{MonotonicTick, UhrResult, UtcInstant};

/// Ticks from the process monotonic clock.
///
/// The elapsed millisecond count is truncated to the 32-bit counter width,
/// which reproduces the wrap behavior of a hardware millisecond timer.
#[derive(Debug)]
pub struct HostTicks {
    start: Instant,
}

impl Default for HostTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl HostTicks {
    /// Create a tick source anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl TickSource for HostTicks {
    fn now(&mut self) -> MonotonicTick {
        MonotonicTick::from_millis(self.start.elapsed().as_millis() as u32)
    }
}

/// The host wall clock standing in for the network time source.
///
/// A requested "fetch" completes on the next poll. Readings below the
/// plausibility floor (a host with a wildly wrong clock) are discarded here,
/// and again by the internal clock.
#[derive(Debug, Default)]
pub struct SystemTimeSource {
    pending_request: bool,
}

impl SystemTimeSource {
    /// Create a host-clock time source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for SystemTimeSource {
    fn request_time_sync(&mut self) {
        self.pending_request = true;
    }

    fn read_time_if_valid(&mut self) -> Option<UtcInstant> {
        if !self.pending_request {
            return None;
        }
        self.pending_request = false;

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()?
            .as_secs();
        let reading = UtcInstant::from_unix_seconds(secs);
        if reading.is_plausible() {
            debug!(utc = secs, "host clock reading");
            Some(reading)
        } else {
            warn!(utc = secs, "host clock below plausibility floor, discarded");
            None
        }
    }
}

/// Connectivity assumed from the host; all probes answer "up".
#[derive(Debug, Default)]
pub struct HostNetwork;

impl HostNetwork {
    /// Create a host network link.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NetworkLink for HostNetwork {
    fn ensure_connected(&mut self) -> bool {
        true
    }

    fn is_connected(&mut self) -> bool {
        true
    }

    fn request_reconnect(&mut self) {}
}

/// Fixed mid-range ambient light for hosts without a sensor.
#[derive(Debug, Default)]
pub struct FixedLightSensor;

impl FixedLightSensor {
    /// Create a fixed light sensor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LightSensor for FixedLightSensor {
    fn read_raw(&mut self) -> u16 {
        512
    }
}

/// Lamp sink that discards frames, counting them.
///
/// Stands in for the strip on a host with no LEDs attached; the composed
/// frames are still produced and measurable.
#[derive(Debug, Default)]
pub struct NullLamps {
    writes: u64,
}

impl NullLamps {
    /// Create a discarding sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total frames written.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}

impl LampSink for NullLamps {
    fn write(&mut self, _frame: &[LampWrite]) -> UhrResult<()> {
        self.writes += 1;
        Ok(())
    }
}
