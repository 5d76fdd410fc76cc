//! Configuration for the clock daemon.
//!
//! Supports TOML deserialization with sensible defaults for development and
//! explicit values for deployment. Every section is optional; a partial file
//! overrides only what it names.

use crate::error::{UhrError, UhrResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Cadence of the render/session loop.
    #[serde(with = "humantime_serde")]
    pub cycle_time: Duration,

    /// Allowed cycle overrun before the cycle counts as late.
    #[serde(with = "humantime_serde")]
    pub max_overrun: Duration,

    /// Nightly resync settings.
    pub resync: ResyncConfig,

    /// Network and connectivity supervision settings.
    pub network: NetworkConfig,

    /// Ambient-light to LED brightness mapping.
    pub brightness: BrightnessConfig,

    /// Real-time scheduling for the render loop.
    pub realtime: RealtimeConfig,

    /// Cycle metrics collection.
    pub metrics: MetricsConfig,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            cycle_time: Duration::from_millis(20),
            max_overrun: Duration::from_millis(5),
            resync: ResyncConfig::default(),
            network: NetworkConfig::default(),
            brightness: BrightnessConfig::default(),
            realtime: RealtimeConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Nightly resync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResyncConfig {
    /// Local wall-clock hour at which to resync, 0..=23.
    pub hour: u8,

    /// Local wall-clock minute at which to resync, 0..=59.
    pub minute: u8,

    /// How long to wait for a requested time reading before giving up and
    /// re-acquiring the network.
    #[serde(with = "humantime_serde")]
    pub acquire_wait: Duration,
}

impl Default for ResyncConfig {
    fn default() -> Self {
        // 03:05 local: past the ambiguous hour of both DST transitions.
        Self {
            hour: 3,
            minute: 5,
            acquire_wait: Duration::from_secs(20),
        }
    }
}

/// Network and connectivity supervision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Driver backing the board collaborators.
    pub driver: BoardDriver,

    /// Absence bound: how long the connection may stay down before the
    /// supervisor forces the session back to network acquisition.
    #[serde(with = "humantime_serde")]
    pub offline_grace: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            driver: BoardDriver::Simulated,
            offline_grace: Duration::from_secs(60),
        }
    }
}

/// Supported board drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoardDriver {
    /// Scripted collaborators for tests and development.
    #[default]
    Simulated,
    /// Host-backed collaborators: the machine clock as time source, the
    /// loopback network as connectivity.
    System,
}

/// Ambient-light to LED brightness mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessConfig {
    /// Lower bound of the output brightness range.
    pub min: u8,

    /// Upper bound of the output brightness range.
    pub max: u8,

    /// Minimum interval between ambient-light samples.
    #[serde(with = "humantime_serde")]
    pub sample_interval: Duration,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            min: 10,
            max: 255,
            sample_interval: Duration::from_secs(1),
        }
    }
}

/// Real-time scheduling configuration for the render loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Enable real-time scheduling (requires privileges).
    pub enabled: bool,

    /// Scheduler policy: "fifo" or "rr" (round-robin).
    pub policy: SchedPolicy,

    /// Scheduler priority (1-99 for RT policies).
    pub priority: u8,

    /// Pin the render loop to a single CPU core.
    pub cpu_pin: Option<usize>,

    /// Lock all memory pages (mlockall).
    pub lock_memory: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            policy: SchedPolicy::Fifo,
            priority: 80,
            cpu_pin: None,
            lock_memory: true,
        }
    }
}

/// Scheduler policy for the render loop thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchedPolicy {
    /// SCHED_FIFO: first-in-first-out real-time.
    #[default]
    Fifo,
    /// SCHED_RR: round-robin real-time.
    Rr,
    /// SCHED_OTHER: normal time-sharing (non-RT).
    Other,
}

/// Cycle metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable metrics collection.
    pub enabled: bool,

    /// Size of the cycle-time histogram ring buffer.
    pub histogram_size: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_size: 10_000,
        }
    }
}

impl ClockConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Reject configurations no session could run with.
    ///
    /// # Errors
    ///
    /// Returns [`UhrError::Config`] naming the offending field.
    pub fn validate(&self) -> UhrResult<()> {
        if self.resync.hour >= 24 {
            return Err(UhrError::Config(format!(
                "resync.hour must be 0..=23, got {}",
                self.resync.hour
            )));
        }
        if self.resync.minute >= 60 {
            return Err(UhrError::Config(format!(
                "resync.minute must be 0..=59, got {}",
                self.resync.minute
            )));
        }
        if self.cycle_time.is_zero() {
            return Err(UhrError::Config("cycle_time must be non-zero".into()));
        }
        if self.resync.acquire_wait.is_zero() {
            return Err(UhrError::Config(
                "resync.acquire_wait must be non-zero".into(),
            ));
        }
        if self.network.offline_grace.is_zero() {
            return Err(UhrError::Config(
                "network.offline_grace must be non-zero".into(),
            ));
        }
        if self.brightness.min > self.brightness.max {
            return Err(UhrError::Config(format!(
                "brightness.min ({}) exceeds brightness.max ({})",
                self.brightness.min, self.brightness.max
            )));
        }
        if self.realtime.enabled
            && matches!(self.realtime.policy, SchedPolicy::Fifo | SchedPolicy::Rr)
            && !(1..=99).contains(&self.realtime.priority)
        {
            return Err(UhrError::Config(format!(
                "realtime.priority must be 1..=99 for RT policies, got {}",
                self.realtime.priority
            )));
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
