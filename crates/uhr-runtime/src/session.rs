//! The clock session: one cooperative step at a time.
//!
//! A session owns the phase machine, the internal clock, the resync
//! scheduler, and the connectivity supervisor, and advances all of them in
//! [`Session::step`]. The step is non-blocking with one sanctioned
//! exception: network bring-up blocks inside
//! [`NetworkLink::ensure_connected`], because nothing useful can happen
//! before the link is up anyway.
//!
//! Nothing here is fatal. A rejected sync, a timed-out reading, or a dead
//! link degrades the session to an earlier phase and it works its way
//! forward again, displaying the stale (still ticking) time meanwhile.

use crate::clock::InternalClock;
use crate::resync::ResyncScheduler;
use crate::supervisor::{ConnectivitySupervisor, LinkVerdict};
use tracing::{debug, info, warn};
use uhr_common::calendar::{is_dst, to_local};
use uhr_common::config::ClockConfig;
use uhr_common::error::UhrResult;
use uhr_common::state::{PhaseMachine, SessionPhase};
use uhr_common::time::{DisplayTime, MonotonicTick, TickDelta, UtcInstant};
use uhr_hal::{NetworkLink, TimeSource};

/// Counters the session keeps for diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    /// Readings absorbed into the clock.
    pub syncs_accepted: u64,
    /// Readings rejected as implausible.
    pub syncs_rejected: u64,
    /// Acquisitions abandoned after the configured wait.
    pub acquire_timeouts: u64,
    /// Forced restarts after a link outage outlasted its grace window.
    pub forced_resets: u64,
}

/// The clock session state machine.
pub struct Session {
    phase: PhaseMachine,
    clock: InternalClock,
    resync: ResyncScheduler,
    supervisor: ConnectivitySupervisor,
    acquire_wait: TickDelta,
    acquire_started: Option<MonotonicTick>,
    stats: SessionStats,
}

impl Session {
    /// Create a session in ACQUIRING_NETWORK with an unsynchronized clock.
    #[must_use]
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            phase: PhaseMachine::new(),
            clock: InternalClock::new(),
            resync: ResyncScheduler::new(config.resync.hour, config.resync.minute),
            supervisor: ConnectivitySupervisor::new(TickDelta::from_duration(
                config.network.offline_grace,
            )),
            acquire_wait: TickDelta::from_duration(config.resync.acquire_wait),
            acquire_started: None,
            stats: SessionStats::default(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase.phase()
    }

    /// Total phase transitions since boot.
    #[must_use]
    pub fn transition_count(&self) -> u64 {
        self.phase.transition_count()
    }

    /// True once the clock has absorbed at least one reading.
    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        self.clock.is_synchronized()
    }

    /// Diagnostic counters.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The armed nightly resync instant, if any.
    #[must_use]
    pub fn next_resync(&self) -> Option<UtcInstant> {
        self.resync.next()
    }

    /// Local wall-clock fields for the renderer, or `None` before the
    /// first sync.
    ///
    /// Independent of the phase: once synchronized the clock keeps ticking,
    /// so time is displayed (possibly stale) through outages and resync
    /// acquisitions alike.
    #[must_use]
    pub fn display_time(&self, now: MonotonicTick) -> Option<DisplayTime> {
        let (utc, millis) = self.clock.now_with_phase(now)?;
        let (hour, minute, second) = to_local(utc).hms();
        Some(DisplayTime {
            hour,
            minute,
            second,
            millis,
        })
    }

    /// Retarget the nightly resync, e.g. after a configuration reload.
    ///
    /// Re-arms immediately when the clock is synchronized; otherwise the
    /// next absorbed reading arms the new target.
    pub fn retarget_resync(&mut self, hour: u8, minute: u8, now: MonotonicTick) {
        self.resync.retarget(hour, minute);
        if let Some(now_utc) = self.clock.synchronized_now(now) {
            self.resync.arm(now_utc);
        }
        info!(hour, minute, "resync retargeted");
    }

    /// Advance the session by one cooperative step.
    ///
    /// Runs the connectivity supervisor first (every cycle, in every
    /// phase), then the current phase's logic. A forced reset ends the
    /// step immediately; re-acquisition starts on the next one.
    ///
    /// # Errors
    ///
    /// Phase transition errors, which the construction of this loop rules
    /// out; callers treat one as a bug to log, never a reason to stop.
    pub fn step(
        &mut self,
        now: MonotonicTick,
        network: &mut dyn NetworkLink,
        time: &mut dyn TimeSource,
    ) -> UhrResult<()> {
        match self.supervisor.observe(now, network.is_connected()) {
            LinkVerdict::Online => {}
            LinkVerdict::Offline { down_for } => {
                debug!(down_ms = down_for.as_millis(), "link down, nudging reconnect");
                network.request_reconnect();
            }
            LinkVerdict::ForceReset => {
                self.stats.forced_resets += 1;
                self.acquire_started = None;
                self.phase.force_acquire_network();
                warn!("link outage forced re-acquisition");
                return Ok(());
            }
        }

        match self.phase.phase() {
            SessionPhase::AcquiringNetwork => self.step_acquiring_network(now, network, time),
            SessionPhase::AcquiringTime => self.step_acquiring_time(now, time),
            SessionPhase::Displaying => self.step_displaying(now, network, time),
        }
    }

    /// Blocking network bring-up, then a sync request.
    fn step_acquiring_network(
        &mut self,
        now: MonotonicTick,
        network: &mut dyn NetworkLink,
        time: &mut dyn TimeSource,
    ) -> UhrResult<()> {
        if !network.ensure_connected() {
            // Driver gave up; stay in this phase and retry next cycle.
            warn!("network bring-up failed, retrying next cycle");
            return Ok(());
        }

        time.request_time_sync();
        self.acquire_started = Some(now);
        self.phase.transition(SessionPhase::AcquiringTime)?;
        info!("network up, time sync requested");
        Ok(())
    }

    /// Poll for the requested reading; absorb it, reject it, or time out.
    fn step_acquiring_time(
        &mut self,
        now: MonotonicTick,
        time: &mut dyn TimeSource,
    ) -> UhrResult<()> {
        if let Some(reading) = time.read_time_if_valid() {
            return match self.clock.absorb(reading, now) {
                Ok(()) => {
                    self.stats.syncs_accepted += 1;
                    self.acquire_started = None;
                    self.resync.arm(reading);
                    let (hour, minute, _) = to_local(reading).hms();
                    info!(
                        utc = reading.as_unix_seconds(),
                        local_hour = hour,
                        local_minute = minute,
                        dst = is_dst(reading),
                        "time reading absorbed"
                    );
                    self.phase.transition(SessionPhase::Displaying)
                }
                Err(e) => {
                    self.stats.syncs_rejected += 1;
                    self.acquire_started = None;
                    warn!(error = %e, "time reading rejected, re-acquiring network");
                    self.phase.transition(SessionPhase::AcquiringNetwork)
                }
            };
        }

        if let Some(started) = self.acquire_started {
            let waited = now.elapsed_since(started);
            if waited > self.acquire_wait {
                self.stats.acquire_timeouts += 1;
                self.acquire_started = None;
                warn!(
                    waited_ms = waited.as_millis(),
                    "no time reading arrived, re-acquiring network"
                );
                return self.phase.transition(SessionPhase::AcquiringNetwork);
            }
        }
        Ok(())
    }

    /// Steady state: watch for the nightly resync moment.
    fn step_displaying(
        &mut self,
        now: MonotonicTick,
        network: &mut dyn NetworkLink,
        time: &mut dyn TimeSource,
    ) -> UhrResult<()> {
        let Some(now_utc) = self.clock.synchronized_now(now) else {
            return Ok(());
        };

        if self.resync.is_due(now_utc) {
            // The request goes out regardless of link state; the source
            // holds it until connectivity returns. A nudge speeds that up.
            if !network.is_connected() {
                network.request_reconnect();
            }
            time.request_time_sync();
            self.acquire_started = Some(now);
            self.phase.transition(SessionPhase::AcquiringTime)?;
            info!(utc = now_utc.as_unix_seconds(), "nightly resync due");
        }
        Ok(())
    }
}
