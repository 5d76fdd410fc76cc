//! Real-time scheduling and memory locking for the render loop.
//!
//! The 20 ms frame cadence is soft real-time: a missed deadline shows up
//! as a stutter in the seconds fade, not a safety problem. When enabled,
//! the loop thread gets memory locking, an RT scheduling class, and
//! optionally a dedicated core. Missing privileges degrade to a warning
//! and a best-effort loop; the clock must keep running either way.

#![allow(unused_imports)] // Platform-specific code may not use all imports

use tracing::{debug, info, warn};
use uhr_common::config::{RealtimeConfig, SchedPolicy};
use uhr_common::error::{UhrError, UhrResult};

/// What real-time setup was actually applied.
#[derive(Debug, Clone, Default)]
pub struct RealtimeStatus {
    /// Whether memory was locked successfully.
    pub memory_locked: bool,
    /// Applied scheduler policy.
    pub scheduler_policy: Option<SchedPolicy>,
    /// Applied scheduler priority.
    pub scheduler_priority: Option<u8>,
    /// Core the loop thread is pinned to.
    pub pinned_cpu: Option<usize>,
}

/// Initialize the real-time environment based on configuration.
///
/// # Errors
///
/// Returns an error only for failures that indicate a broken setup (e.g.
/// an invalid CPU index). Missing privileges are logged and tolerated.
///
/// # Platform Support
///
/// Full support on Linux; no-op with a warning elsewhere.
pub fn init_realtime(config: &RealtimeConfig) -> UhrResult<RealtimeStatus> {
    if !config.enabled {
        debug!("real-time scheduling disabled in configuration");
        return Ok(RealtimeStatus::default());
    }

    info!("initializing real-time environment");
    warn_missing_capabilities(config);

    let memory_locked = if config.lock_memory {
        lock_memory()?
    } else {
        false
    };

    let (scheduler_policy, scheduler_priority) = set_scheduler(config.policy, config.priority)?;
    let pinned_cpu = set_cpu_pin(config.cpu_pin)?;

    let status = RealtimeStatus {
        memory_locked,
        scheduler_policy,
        scheduler_priority,
        pinned_cpu,
    };
    info!(?status, "real-time initialization complete");
    Ok(status)
}

/// Lock all current and future memory pages.
#[cfg(target_os = "linux")]
fn lock_memory() -> UhrResult<bool> {
    use nix::sys::mman::{mlockall, MlockAllFlags};

    debug!("locking memory pages with mlockall");

    match mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE) {
        Ok(()) => {
            info!("memory locked");
            Ok(true)
        }
        Err(e) => {
            // EPERM is common without root or CAP_IPC_LOCK.
            if e == nix::errno::Errno::EPERM {
                warn!(
                    "mlockall failed with EPERM, running without CAP_IPC_LOCK. \
                     Page faults may occur during rendering."
                );
                Ok(false)
            } else {
                Err(UhrError::Config(format!("mlockall failed: {e}")))
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn lock_memory() -> UhrResult<bool> {
    warn!("mlockall not available on this platform");
    Ok(false)
}

/// Set the real-time scheduler policy and priority.
#[cfg(target_os = "linux")]
fn set_scheduler(policy: SchedPolicy, priority: u8) -> UhrResult<(Option<SchedPolicy>, Option<u8>)> {
    let linux_policy = match policy {
        SchedPolicy::Fifo => libc::SCHED_FIFO,
        SchedPolicy::Rr => libc::SCHED_RR,
        SchedPolicy::Other => {
            debug!("using SCHED_OTHER (non-RT) scheduling");
            return Ok((Some(SchedPolicy::Other), None));
        }
    };

    // RT policies accept priorities 1-99.
    let clamped_priority = priority.clamp(1, 99);
    if clamped_priority != priority {
        warn!(
            original = priority,
            clamped = clamped_priority,
            "scheduler priority clamped to valid range"
        );
    }

    debug!(?policy, priority = clamped_priority, "setting real-time scheduler");

    let param = libc::sched_param {
        sched_priority: i32::from(clamped_priority),
    };

    // SAFETY: sched_setscheduler is safe with a valid sched_param.
    let result = unsafe { libc::sched_setscheduler(0, linux_policy, &param) };

    if result == -1 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EPERM) {
            warn!(
                "sched_setscheduler failed with EPERM, running without RT privileges. \
                 Consider granting CAP_SYS_NICE or running as root."
            );
            return Ok((None, None));
        }
        return Err(UhrError::Config(format!("sched_setscheduler failed: {err}")));
    }

    info!(?policy, priority = clamped_priority, "real-time scheduler configured");
    Ok((Some(policy), Some(clamped_priority)))
}

#[cfg(not(target_os = "linux"))]
fn set_scheduler(policy: SchedPolicy, priority: u8) -> UhrResult<(Option<SchedPolicy>, Option<u8>)> {
    warn!(?policy, priority, "real-time scheduling not available on this platform");
    Ok((None, None))
}

/// Pin the current thread to a single CPU core.
#[cfg(target_os = "linux")]
fn set_cpu_pin(cpu: Option<usize>) -> UhrResult<Option<usize>> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let Some(cpu) = cpu else {
        debug!("no CPU pin configured");
        return Ok(None);
    };

    debug!(cpu, "pinning to CPU");

    let mut cpu_set = CpuSet::new();
    cpu_set
        .set(cpu)
        .map_err(|e| UhrError::Config(format!("invalid CPU index {cpu}: {e}")))?;

    match sched_setaffinity(Pid::from_raw(0), &cpu_set) {
        Ok(()) => {
            info!(cpu, "CPU pin set");
            Ok(Some(cpu))
        }
        Err(e) => {
            if e == nix::errno::Errno::EINVAL {
                warn!(cpu, "CPU does not exist, running unpinned");
                Ok(None)
            } else {
                Err(UhrError::Config(format!("sched_setaffinity failed: {e}")))
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn set_cpu_pin(cpu: Option<usize>) -> UhrResult<Option<usize>> {
    if cpu.is_some() {
        warn!("CPU pinning not available on this platform");
    }
    Ok(None)
}

/// Warn up front about RT facilities the process cannot use, so the later
/// per-facility EPERM fallbacks come as no surprise in the logs.
fn warn_missing_capabilities(config: &RealtimeConfig) {
    let caps = check_rt_capabilities();

    if !caps.preempt_rt {
        warn!(
            "PREEMPT_RT kernel not detected. The render cadence may stutter \
             under load; a PREEMPT_RT kernel is recommended for deployments."
        );
    }

    if config.policy != SchedPolicy::Other && !caps.can_use_rt_scheduling() {
        warn!(
            rtprio_limit = ?caps.rtprio_limit,
            is_root = caps.is_root,
            "RT scheduling likely unavailable. Grant CAP_SYS_NICE or raise RLIMIT_RTPRIO."
        );
    }

    if config.lock_memory && !caps.can_lock_memory() {
        warn!(
            memlock_limit = ?caps.memlock_limit,
            is_root = caps.is_root,
            "memory locking likely unavailable. Grant CAP_IPC_LOCK or raise RLIMIT_MEMLOCK."
        );
    }
}

/// Probe the process's real-time capabilities.
#[cfg(target_os = "linux")]
#[must_use]
pub fn check_rt_capabilities() -> RtCapabilities {
    use std::fs;

    let mut caps = RtCapabilities {
        // SAFETY: geteuid has no preconditions.
        is_root: unsafe { libc::geteuid() } == 0,
        ..Default::default()
    };

    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: getrlimit writes into the provided rlimit struct.
    if unsafe { libc::getrlimit(libc::RLIMIT_RTPRIO, &mut rlim) } == 0 {
        caps.rtprio_limit = Some(rlim.rlim_cur);
    }
    // SAFETY: as above.
    if unsafe { libc::getrlimit(libc::RLIMIT_MEMLOCK, &mut rlim) } == 0 {
        caps.memlock_limit = Some(rlim.rlim_cur);
    }

    if let Ok(version) = fs::read_to_string("/proc/version") {
        caps.preempt_rt = version.contains("PREEMPT_RT") || version.contains("PREEMPT RT");
    }

    caps
}

#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn check_rt_capabilities() -> RtCapabilities {
    RtCapabilities::default()
}

/// Real-time capabilities of the running process.
#[derive(Debug, Clone, Default)]
pub struct RtCapabilities {
    /// Whether running as root.
    pub is_root: bool,
    /// RLIMIT_RTPRIO value (max RT priority allowed).
    pub rtprio_limit: Option<u64>,
    /// RLIMIT_MEMLOCK value (max lockable memory).
    pub memlock_limit: Option<u64>,
    /// Whether running on a PREEMPT_RT kernel.
    pub preempt_rt: bool,
}

impl RtCapabilities {
    /// Whether RT scheduling is likely to succeed.
    #[must_use]
    pub fn can_use_rt_scheduling(&self) -> bool {
        self.is_root || self.rtprio_limit.is_some_and(|l| l > 0)
    }

    /// Whether memory locking is likely to succeed.
    #[must_use]
    pub fn can_lock_memory(&self) -> bool {
        if self.is_root {
            return true;
        }

        #[cfg(target_family = "unix")]
        {
            self.memlock_limit.is_some_and(|l| l == libc::RLIM_INFINITY)
        }

        #[cfg(not(target_family = "unix"))]
        {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_rt_is_noop() {
        let config = RealtimeConfig {
            enabled: false,
            ..Default::default()
        };

        let status = init_realtime(&config).unwrap();
        assert!(!status.memory_locked);
        assert!(status.scheduler_policy.is_none());
        assert!(status.pinned_cpu.is_none());
    }

    #[test]
    fn test_rt_capabilities_probe() {
        let caps = check_rt_capabilities();
        // Just verify the probe runs; the values depend on the host.
        let _ = caps.can_use_rt_scheduling();
        let _ = caps.can_lock_memory();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_no_pin_is_noop() {
        assert_eq!(set_cpu_pin(None).unwrap(), None);
    }
}
