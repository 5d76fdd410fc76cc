//! Ambient-light driven brightness control.
//!
//! A 10-bit light sensor is polled at most once per configured interval
//! and its reading rescaled linearly into a configured `[min, max]` output
//! band. Between samples the last mapped level holds, so the face never
//! flickers with sensor noise at frame rate.
//!
//! The floor keeps the face legible in a dark room; the ceiling bounds
//! power draw and glare in daylight.
//!
//! # Examples
//!
//! ```
//! use uhr_common::config::BrightnessConfig;
//! use uhr_common::time::MonotonicTick;
//! use uhr_hal::sim::SimulatedLightSensor;
//! use uhr_render::brightness::BrightnessController;
//!
//! let mut sensor = SimulatedLightSensor::default();
//! sensor.set_raw(1023);
//!
//! let mut control = BrightnessController::new(&BrightnessConfig::default());
//! let level = control.poll(MonotonicTick::from_millis(0), &mut sensor);
//! assert_eq!(level, BrightnessConfig::default().max);
//! ```

use tracing::trace;

use uhr_common::config::BrightnessConfig;
use uhr_common::time::{MonotonicTick, TickDelta};
use uhr_hal::LightSensor;

/// Full-scale raw reading of the 10-bit ambient-light input.
const RAW_FULL_SCALE: u16 = 1023;

/// Maps ambient light onto a lamp brightness level.
#[derive(Debug)]
pub struct BrightnessController {
    min: u8,
    max: u8,
    sample_interval: TickDelta,
    last_sample: Option<MonotonicTick>,
    last_raw: u16,
    level: u8,
}

impl BrightnessController {
    /// Creates a controller from the configured band and sample interval.
    ///
    /// The level starts at the ceiling; the first [`poll`](Self::poll)
    /// replaces it with a real measurement.
    #[must_use]
    pub fn new(config: &BrightnessConfig) -> Self {
        Self {
            min: config.min,
            max: config.max,
            sample_interval: TickDelta::from_duration(config.sample_interval),
            last_sample: None,
            last_raw: RAW_FULL_SCALE,
            level: config.max,
        }
    }

    /// Current output level without touching the sensor.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Samples the sensor if the interval has elapsed and returns the
    /// current level.
    ///
    /// The first call always samples. Calls inside the interval return the
    /// held level without reading the sensor.
    pub fn poll(&mut self, now: MonotonicTick, sensor: &mut dyn LightSensor) -> u8 {
        let due = match self.last_sample {
            None => true,
            Some(at) => now.elapsed_since(at) >= self.sample_interval,
        };
        if due {
            self.last_raw = sensor.read_raw().min(RAW_FULL_SCALE);
            self.level = self.rescale(self.last_raw);
            self.last_sample = Some(now);
            trace!(raw = self.last_raw, level = self.level, "ambient light sampled");
        }
        self.level
    }

    /// Replaces the output band and remaps the held reading immediately.
    ///
    /// Applied on configuration reload without waiting for the next sample.
    pub fn set_band(&mut self, min: u8, max: u8) {
        self.min = min;
        self.max = max;
        self.level = self.rescale(self.last_raw);
    }

    /// Linear rescale of a raw reading into the `[min, max]` band.
    fn rescale(&self, raw: u16) -> u8 {
        let span = u32::from(self.max.saturating_sub(self.min));
        let scaled = u32::from(raw) * span / u32::from(RAW_FULL_SCALE);
        self.min + scaled as u8
    }
}
