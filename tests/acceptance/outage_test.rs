//! Network outage handling and forced reacquisition.

use uhr_common::time::UtcInstant;

use super::common::ClockBench;

/// 2024-01-15 12:00:00 UTC, 13:00:00 CET.
const WINTER_NOON: u64 = 1_705_320_000;

#[test]
fn outage_keeps_stale_face_until_grace_expires() {
    let mut bench = ClockBench::new();
    bench.boot_with(UtcInstant::from_unix_seconds(WINTER_NOON));
    let nudges_after_boot = bench.network.reconnect_requests();

    // The link drops; the first offline observation anchors the outage.
    bench.network.set_online(false);
    bench.step_after(20);
    assert!(bench.session.phase().is_displaying());

    // 59 s into the observed outage the face keeps displaying stale time
    // and every offline cycle nudges the driver once.
    bench.step_after(59_000);
    assert!(bench.session.phase().is_displaying());
    assert!(bench.session.display_time(bench.now()).is_some());
    assert_eq!(bench.network.reconnect_requests(), nudges_after_boot + 2);

    // Crossing the 60 s bound forces reacquisition exactly once.
    bench.step_after(1_500);
    assert!(bench.session.phase().is_acquiring_network());
    assert_eq!(bench.session.stats().forced_resets, 1);

    // The stale face stays lit while reacquiring.
    let time = bench
        .session
        .display_time(bench.now())
        .expect("old reference keeps the face lit");
    assert_eq!((time.hour, time.minute), (13, 1));

    // Link returns; the session reconnects, fetches, and resumes display.
    bench.network.set_online(true);
    bench.step_after(20);
    assert!(bench.session.phase().is_acquiring_time());

    bench
        .time
        .complete_with(UtcInstant::from_unix_seconds(WINTER_NOON + 62));
    bench.step_after(20);
    assert!(bench.session.phase().is_displaying());
    assert_eq!(bench.session.stats().syncs_accepted, 2);
}

#[test]
fn short_outage_never_disturbs_the_session() {
    let mut bench = ClockBench::new();
    bench.boot_with(UtcInstant::from_unix_seconds(WINTER_NOON));
    let transitions_after_boot = bench.session.transition_count();

    bench.network.set_online(false);
    bench.step_after(20);
    bench.step_after(30_000);
    assert!(bench.session.phase().is_displaying());

    // The link recovers inside the grace window; nothing was reset.
    bench.network.set_online(true);
    bench.step_after(20);
    assert!(bench.session.phase().is_displaying());
    assert_eq!(bench.session.stats().forced_resets, 0);
    assert_eq!(bench.session.transition_count(), transitions_after_boot);

    // A later outage starts its own fresh grace window.
    bench.network.set_online(false);
    bench.step_after(20);
    bench.step_after(59_000);
    assert!(bench.session.phase().is_displaying());
    assert_eq!(bench.session.stats().forced_resets, 0);
}
