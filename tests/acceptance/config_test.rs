//! Configuration loading and validation round-trips.

use std::fs;

use uhr_common::config::{BoardDriver, ClockConfig, ConfigError};
use uhr_common::time::UtcInstant;

use super::common::ClockBench;

#[test]
fn config_file_loads_and_validates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("clock.toml");
    fs::write(
        &path,
        r#"
            cycle_time = "20ms"

            [resync]
            hour = 4
            minute = 30

            [network]
            driver = "system"
            offline_grace = "90s"

            [brightness]
            min = 5
            max = 200
        "#,
    )
    .expect("write config");

    let config = ClockConfig::from_file(&path).expect("load config");
    config.validate().expect("valid config");
    assert_eq!(config.resync.hour, 4);
    assert_eq!(config.resync.minute, 30);
    assert_eq!(config.network.driver, BoardDriver::System);
    assert_eq!(config.network.offline_grace.as_secs(), 90);
    assert_eq!(config.brightness.min, 5);
    // Unnamed sections keep their defaults.
    assert_eq!(config.resync.acquire_wait.as_secs(), 20);
    assert_eq!(config.metrics.histogram_size, 10_000);
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.toml");

    let err = ClockConfig::from_file(&path).expect_err("absent file");
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn rendered_config_reloads_identically() {
    let mut config = ClockConfig::default();
    config.resync.hour = 2;
    config.resync.minute = 45;
    config.brightness.max = 180;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rendered.toml");
    fs::write(&path, config.to_toml().expect("serialize")).expect("write");

    let reloaded = ClockConfig::from_file(&path).expect("reload");
    assert_eq!(reloaded.resync.hour, 2);
    assert_eq!(reloaded.resync.minute, 45);
    assert_eq!(reloaded.brightness.max, 180);
    assert_eq!(reloaded.cycle_time, config.cycle_time);
}

#[test]
fn out_of_range_resync_target_is_rejected() {
    let config = ClockConfig::from_toml(
        r#"
            [resync]
            hour = 24
        "#,
    )
    .expect("parses");
    assert!(config.validate().is_err());
}

#[test]
fn custom_resync_target_drives_the_session_schedule() {
    let mut config = ClockConfig::default();
    config.resync.hour = 4;
    config.resync.minute = 30;

    let mut bench = ClockBench::with_config(&config);
    // 2024-01-15 12:00:00 UTC, 13:00:00 CET.
    bench.boot_with(UtcInstant::from_unix_seconds(1_705_320_000));

    // Next 04:30 local is 03:30 UTC on 2024-01-16.
    assert_eq!(
        bench.session.next_resync(),
        Some(UtcInstant::from_unix_seconds(1_705_375_800))
    );
}
