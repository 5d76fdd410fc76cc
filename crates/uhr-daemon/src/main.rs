//! Clock daemon entry point.
//!
//! Integrates the session state machine, board collaborators, and lamp
//! renderer into a complete runtime with signal handling and diagnostics.

mod diagnostics;
mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use uhr_common::config::{BoardDriver, ClockConfig};
use uhr_common::metrics::CycleMetrics;
use uhr_common::time::MonotonicTick;
use uhr_hal::host::{FixedLightSensor, HostNetwork, HostTicks, NullLamps, SystemTimeSource};
use uhr_hal::{LampSink, LightSensor, NetworkLink, TickSource, TimeSource};
use uhr_render::{lamps, BrightnessController};
use uhr_runtime::realtime::init_realtime;
use uhr_runtime::session::Session;

use crate::diagnostics::{format_status_json, DiagnosticsCollector, DiagnosticsState};
use crate::signals::SignalHandler;

/// Clock daemon command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "uhr-daemon",
    about = "Uhrwerk daemon - network-synchronized set-theory lamp clock",
    version,
    long_about = None
)]
struct Args {
    /// Path to a clock configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run with host-backed collaborators (no board hardware).
    #[arg(long, short = 's')]
    simulated: bool,

    /// Maximum cycles to run (0 = infinite).
    #[arg(long, default_value = "0")]
    max_cycles: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// Print the resolved configuration as TOML and exit.
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load configuration
    let mut config = load_config(&args)?;

    // Override with command-line arguments
    if args.simulated {
        config.network.driver = BoardDriver::Simulated;
    }
    config.validate().context("Invalid configuration")?;

    if args.dump_config {
        let rendered = config.to_toml().context("Failed to render configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting uhrwerk daemon");
    info!(?config.cycle_time, ?config.network.driver, "Configuration loaded");

    // Set up signal handling
    let signal_handler = SignalHandler::new().context("Failed to set up signal handlers")?;

    // Set up diagnostics
    let diag_state = Arc::new(DiagnosticsState::new());
    let diagnostics = DiagnosticsCollector::new(Arc::clone(&diag_state));

    // Run the daemon
    run_daemon(&args, &config, &signal_handler, &diagnostics)
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!(
        "uhr_daemon={level},uhr_runtime={level},uhr_render={level},uhr_hal={level},uhr_common={level}"
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `UHR_CONFIG_PATH` environment variable
/// 3. `/etc/uhrwerk/config.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults
fn load_config(args: &Args) -> Result<ClockConfig> {
    // 1. Command-line argument (highest priority)
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return ClockConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    // 2. Environment variable
    if let Ok(env_path) = std::env::var("UHR_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from UHR_CONFIG_PATH");
            return ClockConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from UHR_CONFIG_PATH={env_path:?}")
            });
        }
        warn!(
            path = %env_path,
            "UHR_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    // 3. System path
    let system_path = PathBuf::from("/etc/uhrwerk/config.toml");
    if system_path.exists() {
        info!(?system_path, "Loading config from system path");
        return ClockConfig::from_file(&system_path)
            .with_context(|| format!("Failed to load config from {system_path:?}"));
    }

    // 4. Local development path
    let local_path = PathBuf::from("config/default.toml");
    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return ClockConfig::from_file(&local_path)
            .with_context(|| format!("Failed to load config from {local_path:?}"));
    }

    // 5. Built-in defaults
    info!("No config file found, using built-in defaults");
    Ok(ClockConfig::default())
}

/// Board collaborators behind trait objects.
struct Board {
    network: Box<dyn NetworkLink>,
    time: Box<dyn TimeSource>,
    light: Box<dyn LightSensor>,
    lamps: Box<dyn LampSink>,
}

/// Create board collaborators for the configured driver.
fn create_board(config: &ClockConfig) -> Board {
    match config.network.driver {
        BoardDriver::Simulated => {
            info!("Using host-backed simulated board");
            host_board()
        }
        BoardDriver::System => {
            // Strip and sensor drivers are board integrations not wired in
            // this build; the host clock and link still give a running face.
            warn!("System board drivers not available in this build, using host-backed board");
            host_board()
        }
    }
}

fn host_board() -> Board {
    Board {
        network: Box::new(HostNetwork::new()),
        time: Box::new(SystemTimeSource::new()),
        light: Box::new(FixedLightSensor::new()),
        lamps: Box::new(NullLamps::new()),
    }
}

/// Main daemon run loop.
fn run_daemon(
    args: &Args,
    config: &ClockConfig,
    signal_handler: &SignalHandler,
    diagnostics: &DiagnosticsCollector,
) -> Result<()> {
    // Apply real-time settings before the loop starts
    let rt_status = init_realtime(&config.realtime).context("Failed to apply real-time settings")?;
    if config.realtime.enabled {
        info!(
            memory_locked = rt_status.memory_locked,
            policy = ?rt_status.scheduler_policy,
            priority = ?rt_status.scheduler_priority,
            cpu = ?rt_status.pinned_cpu,
            "Real-time settings applied"
        );
    }

    let mut board = create_board(config);
    info!("Board collaborators initialized");

    run_clock_loop(args, config, &mut board, signal_handler, diagnostics)
}

/// Run the fixed-cadence clock loop.
fn run_clock_loop(
    args: &Args,
    config: &ClockConfig,
    board: &mut Board,
    signal_handler: &SignalHandler,
    diagnostics: &DiagnosticsCollector,
) -> Result<()> {
    let mut session = Session::new(config);
    let mut brightness = BrightnessController::new(&config.brightness);
    let mut metrics = CycleMetrics::new(config.metrics.histogram_size, config.cycle_time);
    let mut ticks = HostTicks::new();

    let cycle_period = config.cycle_time;
    let overrun_budget = cycle_period + config.max_overrun;
    let max_cycles = args.max_cycles;

    info!(
        cycle_ms = cycle_period.as_millis() as u64,
        phase = %session.phase(),
        "Entering clock loop"
    );

    let mut cycles_run = 0u64;
    let mut next_deadline = Instant::now() + cycle_period;

    loop {
        // Check for shutdown signal
        if signal_handler.shutdown_requested() {
            info!("Shutdown signal received, leaving clock loop");
            break;
        }

        let cycle_start = Instant::now();
        let now = ticks.now();

        // Check for reload signal (config reload)
        if signal_handler.take_reload_request() {
            reload_config(args, &mut session, &mut brightness, now);
        }

        // The session never takes the daemon down; a failed step keeps the
        // last good display and retries next cycle.
        if let Err(e) = session.step(now, board.network.as_mut(), board.time.as_mut()) {
            error!(error = %e, "Session step failed");
        }

        diagnostics
            .state()
            .set_time_synchronized(session.is_synchronized());
        diagnostics.state().set_link_online(board.network.is_connected());

        // Render the face: synchronized local time, or all dark before the
        // first synchronization
        let level = brightness.poll(now, board.light.as_mut());
        let frame = match session.display_time(now) {
            Some(time) => lamps::compose(time, level),
            None => lamps::blank_frame(),
        };
        if let Err(e) = board.lamps.write(&frame) {
            warn!(error = %e, "Lamp write failed");
        }

        // Cycle accounting
        let execution_time = cycle_start.elapsed();
        let overrun = execution_time > overrun_budget;
        metrics.record(execution_time);
        diagnostics.state().record_cycle(execution_time, overrun);
        if overrun {
            warn!(
                cycle = cycles_run,
                execution_us = execution_time.as_micros() as u64,
                "Cycle overrun detected"
            );
        }

        // Check cycle limit
        cycles_run += 1;
        if max_cycles > 0 && cycles_run >= max_cycles {
            info!(cycles = cycles_run, "Maximum cycle count reached");
            signal_handler.request_shutdown();
            break;
        }

        // Periodic status logging (every 3000 cycles, once a minute at the
        // default cadence)
        if cycles_run % 3000 == 0 {
            let stats = session.stats();
            info!(
                cycles = cycles_run,
                phase = %session.phase(),
                syncs = stats.syncs_accepted,
                avg_us = metrics.mean().map(|d| d.as_micros()).unwrap_or(0),
                max_us = metrics.max().map(|d| d.as_micros()).unwrap_or(0),
                overruns = diagnostics.state().overrun_count(),
                "Periodic status"
            );
            if config.metrics.enabled {
                let snapshot = diagnostics.snapshot(session.phase(), stats, &metrics);
                info!(status = %format_status_json(&snapshot), "Status");
            }
        }

        next_deadline += cycle_period;
        wait_until(next_deadline);

        // Resynchronize the deadline after a long stall (suspend, debugger)
        // instead of bursting to catch up.
        let after_sleep = Instant::now();
        if next_deadline + cycle_period < after_sleep {
            next_deadline = after_sleep;
        }
    }

    // Graceful shutdown
    info!("Shutting down...");

    // Leave the strip dark rather than frozen on the last frame
    if let Err(e) = board.lamps.write(&lamps::blank_frame()) {
        warn!(error = %e, "Final lamp blank failed");
    }

    let snapshot = diagnostics.snapshot(session.phase(), session.stats(), &metrics);
    if config.metrics.enabled {
        info!(status = %format_status_json(&snapshot), "Final status");
    }
    info!(
        total_cycles = snapshot.cycle_count,
        overruns = snapshot.overrun_count,
        syncs_accepted = snapshot.syncs_accepted,
        signals = signal_handler.state().signal_count(),
        uptime_secs = snapshot.uptime.as_secs(),
        final_phase = %snapshot.phase,
        "Daemon shutdown complete"
    );

    Ok(())
}

/// Re-resolve the configuration and apply what can change at runtime.
///
/// The resync target and brightness band apply immediately; cadence and
/// real-time settings require a restart.
fn reload_config(
    args: &Args,
    session: &mut Session,
    brightness: &mut BrightnessController,
    now: MonotonicTick,
) {
    match load_config(args).and_then(|c| {
        c.validate().context("Invalid configuration")?;
        Ok(c)
    }) {
        Ok(new_config) => {
            session.retarget_resync(new_config.resync.hour, new_config.resync.minute, now);
            brightness.set_band(new_config.brightness.min, new_config.brightness.max);
            info!(
                resync_hour = new_config.resync.hour,
                resync_minute = new_config.resync.minute,
                "Configuration reloaded"
            );
        }
        Err(e) => {
            warn!(error = %e, "Configuration reload failed, keeping current settings");
        }
    }
}

/// Sleep until the next cycle deadline.
///
/// Relative sleep on the monotonic clock; `Instant` does not expose a
/// timespec for an absolute `TIMER_ABSTIME` sleep.
#[cfg(target_os = "linux")]
fn wait_until(deadline: Instant) {
    let now = Instant::now();
    if deadline <= now {
        return; // Already past deadline
    }

    let duration = deadline - now;

    let ts = libc::timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    };

    // SAFETY: clock_nanosleep is safe with valid parameters
    unsafe {
        libc::clock_nanosleep(libc::CLOCK_MONOTONIC, 0, &ts, std::ptr::null_mut());
    }
}

/// Sleep until the next cycle deadline.
#[cfg(not(target_os = "linux"))]
fn wait_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        std::thread::sleep(deadline - now);
    }
}
