//! Session lifecycle for the clock.
//!
//! Phases follow the boot sequence:
//! ACQUIRING_NETWORK → ACQUIRING_TIME → DISPLAYING
//!
//! Fallback to ACQUIRING_NETWORK is allowed from both later phases so a
//! timeout, a rejected reading, or a connectivity reset always lands the
//! session back at the start of the sequence. Nothing is terminal; the
//! session cycles for the lifetime of the device.

use crate::error::{UhrError, UhrResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phases of the clock session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Initial phase: the network collaborator is asked (blocking) for a
    /// connection, then a time reading is requested.
    #[default]
    AcquiringNetwork,
    /// A time reading is outstanding; waiting for it to arrive, fail the
    /// plausibility check, or time out.
    AcquiringTime,
    /// Steady state: local time is rendered every cycle and the nightly
    /// resync is armed.
    Displaying,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcquiringNetwork => write!(f, "ACQUIRING_NETWORK"),
            Self::AcquiringTime => write!(f, "ACQUIRING_TIME"),
            Self::Displaying => write!(f, "DISPLAYING"),
        }
    }
}

impl SessionPhase {
    /// Check whether a transition to `target` is valid from this phase.
    #[must_use]
    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        use SessionPhase::{AcquiringNetwork, AcquiringTime, Displaying};

        matches!(
            (self, target),
            // Forward progression
            (AcquiringNetwork, AcquiringTime)
                | (AcquiringTime, Displaying)
                // Nightly resync re-enters time acquisition
                | (Displaying, AcquiringTime)
                // Timeout or rejected reading
                | (AcquiringTime, AcquiringNetwork)
                // Forced connectivity reset
                | (Displaying, AcquiringNetwork)
        )
    }

    /// True while waiting for network connectivity.
    #[must_use]
    pub fn is_acquiring_network(&self) -> bool {
        matches!(self, Self::AcquiringNetwork)
    }

    /// True while a time reading is outstanding.
    #[must_use]
    pub fn is_acquiring_time(&self) -> bool {
        matches!(self, Self::AcquiringTime)
    }

    /// True in the steady display phase.
    #[must_use]
    pub fn is_displaying(&self) -> bool {
        matches!(self, Self::Displaying)
    }
}

/// Phase machine with transition history tracking.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    current: SessionPhase,
    previous: Option<SessionPhase>,
    transition_count: u64,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    /// Create a new phase machine starting in ACQUIRING_NETWORK.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: SessionPhase::AcquiringNetwork,
            previous: None,
            transition_count: 0,
        }
    }

    /// Get the current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.current
    }

    /// Get the previous phase (if any transition occurred).
    #[must_use]
    pub fn previous_phase(&self) -> Option<SessionPhase> {
        self.previous
    }

    /// Get the total number of transitions.
    #[must_use]
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Attempt a phase transition.
    pub fn transition(&mut self, target: SessionPhase) -> UhrResult<()> {
        if self.current.can_transition_to(target) {
            self.previous = Some(self.current);
            self.current = target;
            self.transition_count += 1;
            Ok(())
        } else {
            Err(UhrError::InvalidPhaseTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Force a return to ACQUIRING_NETWORK; a no-op when already there.
    ///
    /// Used by the connectivity supervisor, whose verdict overrides whatever
    /// the session was doing.
    pub fn force_acquire_network(&mut self) {
        if self
            .current
            .can_transition_to(SessionPhase::AcquiringNetwork)
        {
            self.previous = Some(self.current);
            self.current = SessionPhase::AcquiringNetwork;
            self.transition_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_forward_transitions() {
        let mut pm = PhaseMachine::new();
        assert_eq!(pm.phase(), SessionPhase::AcquiringNetwork);

        assert!(pm.transition(SessionPhase::AcquiringTime).is_ok());
        assert_eq!(pm.phase(), SessionPhase::AcquiringTime);

        assert!(pm.transition(SessionPhase::Displaying).is_ok());
        assert_eq!(pm.phase(), SessionPhase::Displaying);
    }

    #[test]
    fn test_resync_reenters_time_acquisition() {
        let mut pm = PhaseMachine::new();
        pm.transition(SessionPhase::AcquiringTime).unwrap();
        pm.transition(SessionPhase::Displaying).unwrap();

        assert!(pm.transition(SessionPhase::AcquiringTime).is_ok());
        assert_eq!(pm.phase(), SessionPhase::AcquiringTime);
        assert_eq!(pm.previous_phase(), Some(SessionPhase::Displaying));
    }

    #[test]
    fn test_timeout_falls_back() {
        let mut pm = PhaseMachine::new();
        pm.transition(SessionPhase::AcquiringTime).unwrap();

        assert!(pm.transition(SessionPhase::AcquiringNetwork).is_ok());
        assert_eq!(pm.phase(), SessionPhase::AcquiringNetwork);
    }

    #[test]
    fn test_invalid_transition() {
        let mut pm = PhaseMachine::new();
        // Cannot skip straight to DISPLAYING without a reading.
        let result = pm.transition(SessionPhase::Displaying);
        assert!(result.is_err());
        assert_eq!(pm.phase(), SessionPhase::AcquiringNetwork);
    }

    #[test]
    fn test_transition_count() {
        let mut pm = PhaseMachine::new();
        assert_eq!(pm.transition_count(), 0);

        pm.transition(SessionPhase::AcquiringTime).unwrap();
        assert_eq!(pm.transition_count(), 1);

        pm.transition(SessionPhase::Displaying).unwrap();
        assert_eq!(pm.transition_count(), 2);
    }

    #[test]
    fn test_force_acquire_network() {
        let mut pm = PhaseMachine::new();
        pm.transition(SessionPhase::AcquiringTime).unwrap();
        pm.transition(SessionPhase::Displaying).unwrap();

        pm.force_acquire_network();
        assert_eq!(pm.phase(), SessionPhase::AcquiringNetwork);
        assert_eq!(pm.previous_phase(), Some(SessionPhase::Displaying));
    }

    #[test]
    fn test_force_is_noop_when_already_acquiring() {
        let mut pm = PhaseMachine::new();
        pm.force_acquire_network();
        assert_eq!(pm.phase(), SessionPhase::AcquiringNetwork);
        assert_eq!(pm.transition_count(), 0);
        assert_eq!(pm.previous_phase(), None);
    }

    #[test]
    fn test_display_name_round_trip() {
        let json = serde_json::to_string(&SessionPhase::AcquiringTime).unwrap();
        assert_eq!(json, "\"ACQUIRING_TIME\"");
        assert_eq!(SessionPhase::AcquiringTime.to_string(), "ACQUIRING_TIME");
    }
}
