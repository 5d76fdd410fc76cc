//! Set-theory lamp face composition.
//!
//! The face encodes local time in four lamp rows plus a seconds beacon,
//! read top to bottom as `5h + 1h` hours and `5m + 1m` minutes:
//!
//! ```text
//!                  ( S )                    seconds beacon      index 0
//!          [5h] [5h] [5h] [5h]              five-hour lamps     1..=4
//!          [1h] [1h] [1h] [1h]              one-hour lamps      5..=8
//!  [5m][5m][Q][5m][5m][Q][5m][5m][Q][5m][5m]  five-minute lamps 9..=19
//!          [1m] [1m] [1m] [1m]              one-minute lamps    20..=23
//! ```
//!
//! Hour lamps burn red, minute lamps yellow. Every third five-minute lamp
//! (`Q`, the 15/30/45 positions) burns red so quarter hours stand out. The
//! beacon fades on a cosine curve over each second instead of the hard
//! on/off blink of the original mechanical face, so frames rendered every
//! cycle produce a smooth pulse.
//!
//! Composition is a pure function of `(time, brightness)`: the same inputs
//! always produce the same frame, and every one of the [`LAMP_COUNT`] lamps
//! is written each frame so no stale lamp survives a row count shrinking.
//!
//! # Examples
//!
//! 13:17 local reads as two five-hour lamps, three one-hour lamps, three
//! five-minute lamps and two one-minute lamps:
//!
//! ```
//! use uhr_common::time::DisplayTime;
//! use uhr_hal::Rgb;
//! use uhr_render::lamps::{self, FIVE_HOUR_LAMPS, ONE_MINUTE_LAMPS};
//!
//! let time = DisplayTime { hour: 13, minute: 17, second: 42, millis: 0 };
//! let frame = lamps::compose(time, 255);
//!
//! let lit = |range: core::ops::Range<usize>| {
//!     range.filter(|&i| frame[i].color != Rgb::OFF).count()
//! };
//! assert_eq!(lit(FIVE_HOUR_LAMPS), 2);
//! assert_eq!(lit(ONE_MINUTE_LAMPS), 2);
//! ```

use uhr_common::time::DisplayTime;
use uhr_hal::{LampWrite, Rgb};

use crate::gamma;

/// Total lamps on the face, beacon included.
pub const LAMP_COUNT: usize = 24;

/// Strip index of the seconds beacon.
pub const SECONDS_LAMP: usize = 0;

/// Strip indices of the four five-hour lamps.
pub const FIVE_HOUR_LAMPS: core::ops::Range<usize> = 1..5;

/// Strip indices of the four one-hour lamps.
pub const ONE_HOUR_LAMPS: core::ops::Range<usize> = 5..9;

/// Strip indices of the eleven five-minute lamps.
pub const FIVE_MINUTE_LAMPS: core::ops::Range<usize> = 9..20;

/// Strip indices of the four one-minute lamps.
pub const ONE_MINUTE_LAMPS: core::ops::Range<usize> = 20..24;

/// Hour lamps and quarter markers.
const RED: Rgb = Rgb::new(255, 0, 0);

/// Regular minute lamps.
const YELLOW: Rgb = Rgb::new(255, 220, 0);

/// Seconds beacon.
const AMBER: Rgb = Rgb::new(255, 140, 0);

/// An all-dark frame addressing every lamp.
///
/// Shown while no synchronized time exists yet.
#[must_use]
pub fn blank_frame() -> [LampWrite; LAMP_COUNT] {
    core::array::from_fn(|i| LampWrite {
        index: i as u8,
        color: Rgb::OFF,
    })
}

/// Composes the full lamp frame for one local time at one brightness.
///
/// Deterministic and stateless: callers re-run it every cycle with fresh
/// inputs. `brightness` scales every lit lamp linearly before the gamma
/// curve is applied, so `0` yields an all-dark frame.
#[must_use]
pub fn compose(time: DisplayTime, brightness: u8) -> [LampWrite; LAMP_COUNT] {
    let mut frame = blank_frame();

    let five_hours = usize::from(time.hour / 5);
    let one_hours = usize::from(time.hour % 5);
    let five_minutes = usize::from(time.minute / 5);
    let one_minutes = usize::from(time.minute % 5);

    for (slot, index) in FIVE_HOUR_LAMPS.enumerate() {
        if slot < five_hours {
            frame[index].color = shade(RED, brightness);
        }
    }
    for (slot, index) in ONE_HOUR_LAMPS.enumerate() {
        if slot < one_hours {
            frame[index].color = shade(RED, brightness);
        }
    }
    for (slot, index) in FIVE_MINUTE_LAMPS.enumerate() {
        if slot < five_minutes {
            // The 3rd, 6th and 9th lamp mark the full quarter hours.
            let base = if (slot + 1) % 3 == 0 { RED } else { YELLOW };
            frame[index].color = shade(base, brightness);
        }
    }
    for (slot, index) in ONE_MINUTE_LAMPS.enumerate() {
        if slot < one_minutes {
            frame[index].color = shade(YELLOW, brightness);
        }
    }

    frame[SECONDS_LAMP].color = shade(AMBER, beacon_level(time.millis, brightness));

    frame
}

/// Beacon intensity for one instant within a second.
///
/// Cosine fade: full at the top of the second, dark at the half-second,
/// back to full at the next top. Continuous across second boundaries.
fn beacon_level(millis: u16, brightness: u8) -> u8 {
    let phase = f32::from(millis.min(999)) / 1000.0;
    let factor = (core::f32::consts::TAU * phase).cos().mul_add(0.5, 0.5);
    (factor * f32::from(brightness)).round() as u8
}

/// Scales a base color by brightness, then gamma-corrects each channel.
fn shade(base: Rgb, brightness: u8) -> Rgb {
    Rgb::new(
        gamma::correct(scale(base.r, brightness)),
        gamma::correct(scale(base.g, brightness)),
        gamma::correct(scale(base.b, brightness)),
    )
}

fn scale(channel: u8, brightness: u8) -> u8 {
    ((u16::from(channel) * u16::from(brightness)) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: u8 = 255;

    fn at(hour: u8, minute: u8, second: u8, millis: u16) -> DisplayTime {
        DisplayTime {
            hour,
            minute,
            second,
            millis,
        }
    }

    fn lit(frame: &[LampWrite; LAMP_COUNT], range: core::ops::Range<usize>) -> usize {
        range.filter(|&i| frame[i].color != Rgb::OFF).count()
    }

    // ==================== Row Count Tests ====================

    #[test]
    fn rows_encode_13_17() {
        let frame = compose(at(13, 17, 0, 250), FULL);
        assert_eq!(lit(&frame, FIVE_HOUR_LAMPS), 2);
        assert_eq!(lit(&frame, ONE_HOUR_LAMPS), 3);
        assert_eq!(lit(&frame, FIVE_MINUTE_LAMPS), 3);
        assert_eq!(lit(&frame, ONE_MINUTE_LAMPS), 2);
    }

    #[test]
    fn midnight_darkens_every_row() {
        let frame = compose(at(0, 0, 0, 500), FULL);
        assert_eq!(lit(&frame, FIVE_HOUR_LAMPS), 0);
        assert_eq!(lit(&frame, ONE_HOUR_LAMPS), 0);
        assert_eq!(lit(&frame, FIVE_MINUTE_LAMPS), 0);
        assert_eq!(lit(&frame, ONE_MINUTE_LAMPS), 0);
    }

    #[test]
    fn end_of_day_fills_the_rows() {
        // 23:59 is the densest face the clock ever shows.
        let frame = compose(at(23, 59, 59, 0), FULL);
        assert_eq!(lit(&frame, FIVE_HOUR_LAMPS), 4);
        assert_eq!(lit(&frame, ONE_HOUR_LAMPS), 3);
        assert_eq!(lit(&frame, FIVE_MINUTE_LAMPS), 11);
        assert_eq!(lit(&frame, ONE_MINUTE_LAMPS), 4);
    }

    #[test]
    fn rows_fill_left_to_right() {
        let frame = compose(at(13, 17, 0, 0), FULL);
        // 2 five-hour lamps: first two indices lit, last two dark.
        assert_ne!(frame[1].color, Rgb::OFF);
        assert_ne!(frame[2].color, Rgb::OFF);
        assert_eq!(frame[3].color, Rgb::OFF);
        assert_eq!(frame[4].color, Rgb::OFF);
    }

    #[test]
    fn frame_addresses_every_lamp_in_order() {
        let frame = compose(at(7, 33, 12, 120), 128);
        assert_eq!(frame.len(), LAMP_COUNT);
        for (i, write) in frame.iter().enumerate() {
            assert_eq!(usize::from(write.index), i);
        }
    }

    // ==================== Quarter Marker Tests ====================

    #[test]
    fn quarter_lamps_burn_red_among_yellow() {
        // 12:45 lights nine five-minute lamps; slots 2, 5 and 8 are the
        // quarter markers.
        let frame = compose(at(12, 45, 0, 0), FULL);
        let red = shade(RED, FULL);
        let yellow = shade(YELLOW, FULL);
        for (slot, index) in FIVE_MINUTE_LAMPS.enumerate().take(9) {
            if (slot + 1) % 3 == 0 {
                assert_eq!(frame[index].color, red, "slot {slot} should mark a quarter");
            } else {
                assert_eq!(frame[index].color, yellow, "slot {slot} should be plain");
            }
        }
    }

    #[test]
    fn hour_lamps_are_red_minute_lamps_yellow() {
        let frame = compose(at(6, 1, 0, 0), FULL);
        assert_eq!(frame[FIVE_HOUR_LAMPS.start].color, shade(RED, FULL));
        assert_eq!(frame[ONE_HOUR_LAMPS.start].color, shade(RED, FULL));
        assert_eq!(frame[ONE_MINUTE_LAMPS.start].color, shade(YELLOW, FULL));
    }

    // ==================== Seconds Beacon Tests ====================

    #[test]
    fn beacon_peaks_at_the_top_of_the_second() {
        let frame = compose(at(10, 0, 3, 0), FULL);
        assert_eq!(frame[SECONDS_LAMP].color, shade(AMBER, FULL));
    }

    #[test]
    fn beacon_is_dark_at_the_half_second() {
        let frame = compose(at(10, 0, 3, 500), FULL);
        assert_eq!(frame[SECONDS_LAMP].color, Rgb::OFF);
    }

    #[test]
    fn beacon_fades_symmetrically() {
        assert_eq!(beacon_level(100, FULL), beacon_level(900, FULL));
        assert_eq!(beacon_level(400, FULL), beacon_level(600, FULL));
        assert!(beacon_level(100, FULL) > beacon_level(400, FULL));
    }

    #[test]
    fn beacon_is_continuous_across_the_boundary() {
        // The last millisecond of a second sits a rounding step away from
        // the first millisecond of the next.
        assert_eq!(beacon_level(999, FULL), 255);
        assert_eq!(beacon_level(0, FULL), 255);
    }

    // ==================== Brightness Tests ====================

    #[test]
    fn zero_brightness_blanks_the_face() {
        let frame = compose(at(23, 59, 59, 0), 0);
        for write in &frame {
            assert_eq!(write.color, Rgb::OFF);
        }
    }

    #[test]
    fn dimming_never_raises_a_channel() {
        let bright = compose(at(13, 17, 0, 0), 255);
        let dim = compose(at(13, 17, 0, 0), 40);
        for (b, d) in bright.iter().zip(dim.iter()) {
            assert!(d.color.r <= b.color.r);
            assert!(d.color.g <= b.color.g);
            assert!(d.color.b <= b.color.b);
        }
    }

    #[test]
    fn output_is_gamma_corrected() {
        // Yellow at full brightness keeps its red channel saturated but the
        // green channel drops down the curve.
        let frame = compose(at(0, 1, 0, 0), FULL);
        let lamp = frame[ONE_MINUTE_LAMPS.start].color;
        assert_eq!(lamp.r, 255);
        assert_eq!(lamp.g, gamma::correct(220));
        assert!(lamp.g < 220);
    }

    #[test]
    fn blank_frame_is_all_off() {
        let frame = blank_frame();
        assert_eq!(frame.len(), LAMP_COUNT);
        for (i, write) in frame.iter().enumerate() {
            assert_eq!(usize::from(write.index), i);
            assert_eq!(write.color, Rgb::OFF);
        }
    }

    #[test]
    fn composition_is_deterministic() {
        let a = compose(at(9, 41, 30, 333), 77);
        let b = compose(at(9, 41, 30, 333), 77);
        assert_eq!(a, b);
    }
}
