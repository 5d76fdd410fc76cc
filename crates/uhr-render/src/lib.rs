//! Lamp face rendering for the uhrwerk clock.
//!
//! This crate turns a local wall-clock time into a full frame of lamp
//! writes for the set-theory face:
//!
//! - **Face composition** ([`lamps`]): the row layout and the pure
//!   `(time, brightness)` to frame mapping, including the cosine seconds
//!   beacon
//! - **Gamma correction** ([`gamma`]): the 2.8 power-law transfer table
//!   applied per channel before output
//! - **Brightness control** ([`brightness`]): ambient-light sampling
//!   rescaled into a configured output band
//!
//! # Example
//!
//! ```
//! use uhr_common::config::BrightnessConfig;
//! use uhr_common::time::{DisplayTime, MonotonicTick};
//! use uhr_hal::sim::SimulatedLightSensor;
//! use uhr_render::{lamps, BrightnessController};
//!
//! let mut sensor = SimulatedLightSensor::default();
//! let mut control = BrightnessController::new(&BrightnessConfig::default());
//!
//! let level = control.poll(MonotonicTick::from_millis(0), &mut sensor);
//! let time = DisplayTime { hour: 13, minute: 17, second: 42, millis: 0 };
//! let frame = lamps::compose(time, level);
//! assert_eq!(frame.len(), lamps::LAMP_COUNT);
//! ```

pub mod brightness;
pub mod gamma;
pub mod lamps;

// Re-export main types for convenience
pub use brightness::BrightnessController;
pub use lamps::{blank_frame, compose, LAMP_COUNT};
