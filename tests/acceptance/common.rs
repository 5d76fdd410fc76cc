//! Common utilities for acceptance tests.
//!
//! Provides a bench wiring a session to simulated collaborators, with
//! helpers for advancing compressed time and reaching the displaying
//! phase.

#![allow(dead_code)] // Not every scenario uses every helper

use uhr_common::config::ClockConfig;
use uhr_common::time::{MonotonicTick, UtcInstant};
use uhr_hal::sim::{ManualTicks, SimulatedNetwork, SimulatedTimeSource};
use uhr_runtime::session::Session;

/// A session wired to simulated collaborators with manually advanced time.
pub struct ClockBench {
    pub session: Session,
    pub network: SimulatedNetwork,
    pub time: SimulatedTimeSource,
    pub ticks: ManualTicks,
}

impl ClockBench {
    /// Bench with the default configuration (03:05 resync, 60 s grace).
    pub fn new() -> Self {
        Self::with_config(&ClockConfig::default())
    }

    /// Bench with a specific configuration.
    pub fn with_config(config: &ClockConfig) -> Self {
        Self {
            session: Session::new(config),
            network: SimulatedNetwork::new(),
            time: SimulatedTimeSource::new(),
            ticks: ManualTicks::new(),
        }
    }

    /// Current tick without advancing.
    pub fn now(&self) -> MonotonicTick {
        self.ticks.peek()
    }

    /// Run one session step at the current tick.
    pub fn step(&mut self) {
        let now = self.ticks.peek();
        self.session
            .step(now, &mut self.network, &mut self.time)
            .expect("session step");
    }

    /// Advance the tick counter by `millis` and run one step.
    pub fn step_after(&mut self, millis: u32) {
        self.ticks.advance(millis);
        self.step();
    }

    /// Boot to the displaying phase with the given first reading.
    ///
    /// One step acquires the network and requests a reading; the reading
    /// completes and a second step one cycle later absorbs it.
    pub fn boot_with(&mut self, utc: UtcInstant) {
        self.step();
        self.time.complete_with(utc);
        self.step_after(20);
        assert!(
            self.session.phase().is_displaying(),
            "boot did not reach the displaying phase"
        );
    }
}
