use thiserror::Error;

/// Clock error types covering configuration, time validation, and lifecycle faults.
///
/// None of these are fatal to the session: implausible readings and phase
/// violations are absorbed by falling back to network acquisition, and the
/// display keeps serving the last known time throughout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UhrError {
    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Time reading below the plausibility floor.
    #[error("implausible time reading: {reading_secs}s is earlier than the floor {floor_secs}s")]
    ImplausibleReading {
        /// The rejected reading, in seconds since the Unix epoch.
        reading_secs: u64,
        /// The build-time plausibility floor, in seconds since the Unix epoch.
        floor_secs: u64,
    },

    /// Invalid session phase transition attempted.
    #[error("invalid phase transition from {from} to {to}")]
    InvalidPhaseTransition {
        /// Source phase.
        from: String,
        /// Attempted target phase.
        to: String,
    },
}

/// Convenience type alias for clock operations.
pub type UhrResult<T> = Result<T, UhrError>;
