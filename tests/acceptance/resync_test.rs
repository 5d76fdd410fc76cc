//! Nightly resync scheduling across the DST transition.

use uhr_common::time::UtcInstant;

use super::common::ClockBench;

/// 2024-10-27 02:04:30 UTC. The offset fell back to +01:00 at 01:00 UTC
/// that morning, so the face shows 03:04:30.
const BEFORE_FALL_RESYNC: u64 = 1_729_994_670;

/// 2024-10-27 02:05:00 UTC, the first instant displaying 03:05 local on
/// the fall-back morning.
const FALL_RESYNC: u64 = 1_729_994_700;

/// 2024-10-28 02:05:00 UTC, 03:05 local the following plain-CET morning.
const NEXT_MORNING_RESYNC: u64 = 1_730_081_100;

#[test]
fn nightly_resync_fires_at_the_local_target() {
    let mut bench = ClockBench::new();
    bench.boot_with(UtcInstant::from_unix_seconds(BEFORE_FALL_RESYNC));

    assert_eq!(
        bench.session.next_resync(),
        Some(UtcInstant::from_unix_seconds(FALL_RESYNC))
    );

    // 29 s later the target has not arrived yet.
    bench.step_after(29_000);
    assert!(bench.session.phase().is_displaying());
    assert_eq!(bench.time.requests(), 1);

    // Crossing 02:05:00 UTC triggers a fresh acquisition...
    bench.step_after(2_000);
    assert!(bench.session.phase().is_acquiring_time());
    assert_eq!(bench.time.requests(), 2);

    // ...and the schedule has already moved to the following morning.
    assert_eq!(
        bench.session.next_resync(),
        Some(UtcInstant::from_unix_seconds(NEXT_MORNING_RESYNC))
    );

    // The fresh reading lands and display resumes at 03:05 local.
    bench
        .time
        .complete_with(UtcInstant::from_unix_seconds(FALL_RESYNC + 3));
    bench.step_after(20);
    assert!(bench.session.phase().is_displaying());
    assert_eq!(bench.session.stats().syncs_accepted, 2);

    let time = bench
        .session
        .display_time(bench.now())
        .expect("synchronized");
    assert_eq!((time.hour, time.minute, time.second), (3, 5, 3));
}

#[test]
fn stale_face_keeps_running_when_resync_reading_never_arrives() {
    let mut bench = ClockBench::new();
    bench.boot_with(UtcInstant::from_unix_seconds(BEFORE_FALL_RESYNC));

    // The resync fires but no reading ever completes.
    bench.step_after(31_000);
    assert!(bench.session.phase().is_acquiring_time());

    // After the acquire wait the session falls back to network acquisition,
    // still displaying extrapolated time from the old reference.
    bench.step_after(21_000);
    assert!(bench.session.phase().is_acquiring_network());
    assert_eq!(bench.session.stats().acquire_timeouts, 1);

    let time = bench
        .session
        .display_time(bench.now())
        .expect("stale reference still drives the face");
    // 30 + 22 s past 03:04:30 local.
    assert_eq!((time.hour, time.minute, time.second), (3, 5, 22));
}
