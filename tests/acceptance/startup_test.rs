//! Cold boot through first synchronization.

use uhr_common::time::UtcInstant;
use uhr_hal::Rgb;
use uhr_render::lamps;

use super::common::ClockBench;

/// 2024-01-15 12:00:00 UTC, 13:00:00 CET.
const WINTER_NOON: u64 = 1_705_320_000;

#[test]
fn face_stays_dark_until_first_synchronization() {
    let mut bench = ClockBench::new();
    assert!(bench.session.display_time(bench.now()).is_none());

    // One step brings the link up and requests a reading; still no time.
    bench.step();
    assert!(bench.session.phase().is_acquiring_time());
    assert_eq!(bench.network.ensure_calls(), 1);
    assert_eq!(bench.time.requests(), 1);
    assert!(bench.session.display_time(bench.now()).is_none());

    // With no display time the daemon renders the all-dark frame.
    let frame = lamps::blank_frame();
    assert!(frame.iter().all(|w| w.color == Rgb::OFF));
}

#[test]
fn cold_boot_reaches_a_lit_face() {
    let mut bench = ClockBench::new();
    bench.boot_with(UtcInstant::from_unix_seconds(WINTER_NOON));

    let time = bench
        .session
        .display_time(bench.now())
        .expect("synchronized after boot");
    assert_eq!((time.hour, time.minute, time.second), (13, 0, 0));

    // 13:00 lights two five-hour lamps, three one-hour lamps, and the
    // seconds beacon at the top of its fade.
    let frame = lamps::compose(time, 255);
    let lit = frame.iter().filter(|w| w.color != Rgb::OFF).count();
    assert_eq!(lit, 6);
}

#[test]
fn display_tracks_elapsed_ticks_between_syncs() {
    let mut bench = ClockBench::new();
    bench.boot_with(UtcInstant::from_unix_seconds(WINTER_NOON));

    // 90.5 s later the face reads 13:01:30, half way into the second.
    bench.step_after(90_500);
    let time = bench
        .session
        .display_time(bench.now())
        .expect("synchronized");
    assert_eq!((time.hour, time.minute, time.second), (13, 1, 30));
    assert_eq!(time.millis, 500);

    let frame = lamps::compose(time, 255);
    // One one-minute lamp is lit and the beacon is dark at the half second.
    assert_ne!(frame[lamps::ONE_MINUTE_LAMPS.start].color, Rgb::OFF);
    assert_eq!(frame[lamps::SECONDS_LAMP].color, Rgb::OFF);
}

#[test]
fn implausible_first_reading_restarts_acquisition() {
    let mut bench = ClockBench::new();
    bench.step();
    bench.time.complete_with(UtcInstant::from_unix_seconds(1_000));
    bench.step_after(20);

    // The bogus reading was rejected and the face stays dark.
    assert!(bench.session.phase().is_acquiring_network());
    assert_eq!(bench.session.stats().syncs_rejected, 1);
    assert!(bench.session.display_time(bench.now()).is_none());

    // The next attempt with a sane reading succeeds.
    bench.step_after(20);
    bench.time.complete_with(UtcInstant::from_unix_seconds(WINTER_NOON));
    bench.step_after(20);
    assert!(bench.session.phase().is_displaying());
    assert_eq!(bench.session.stats().syncs_accepted, 1);
}
