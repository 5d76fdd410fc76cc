//! Civil-calendar math and the EU daylight-saving rule.
//!
//! Everything here is pure, allocation-free, and O(1). Date decomposition
//! uses Howard Hinnant's civil-calendar algorithms
//! (<http://howardhinnant.github.io/date_algorithms.html>), the same math
//! behind C++20 `<chrono>`. The seasonal rule is implemented directly: the
//! device displays central European time and carries no timezone database,
//! so every rule must be rederivable from the calendar alone.
//!
//! The EU rule: daylight saving is in force from 01:00 UTC on the last
//! Sunday of March (inclusive) until 01:00 UTC on the last Sunday of
//! October (exclusive). Both decisions are made in UTC; local wall time
//! never feeds back into the predicate.

use crate::time::UtcInstant;
use std::cmp::Ordering;

const SECS_PER_DAY: u64 = 86_400;

/// Standard-time offset from UTC (CET, UTC+1), in seconds.
pub const STANDARD_OFFSET_SECS: u64 = 3_600;

/// Summer-time offset from UTC (CEST, UTC+2), in seconds.
pub const SUMMER_OFFSET_SECS: u64 = 7_200;

/// A UTC instant decomposed into civil fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilDateTime {
    /// Gregorian year.
    pub year: i32,
    /// Month, 1..=12.
    pub month: u8,
    /// Day of month, 1..=31.
    pub day: u8,
    /// Hour of day, 0..=23.
    pub hour: u8,
    /// Minute, 0..=59.
    pub minute: u8,
    /// Second, 0..=59.
    pub second: u8,
}

impl CivilDateTime {
    /// Decompose a UTC instant into civil fields.
    #[must_use]
    pub fn of(utc: UtcInstant) -> Self {
        decompose(utc.as_unix_seconds())
    }
}

/// Gregorian leap-year predicate: every 4th year, except centuries not
/// divisible by 400.
#[must_use]
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Day-of-month of the last Sunday in the given month.
///
/// Takes the weekday of the month's final day and steps back to the
/// preceding Sunday; never looks back more than six days.
#[must_use]
pub fn last_sunday_of_month(year: i32, month: u8) -> u8 {
    let last_day = days_in_month(year, month);
    let weekday = weekday_from_days(days_from_civil(year, month, last_day));
    last_day - weekday
}

/// EU daylight-saving predicate for a UTC instant.
///
/// April through September are always summer time and November through
/// February never are; only the two transition months need the
/// last-Sunday/01:00-UTC boundary test.
#[must_use]
pub fn is_dst(utc: UtcInstant) -> bool {
    let c = CivilDateTime::of(utc);
    match c.month {
        4..=9 => true,
        3 => {
            let change_day = last_sunday_of_month(c.year, 3);
            match c.day.cmp(&change_day) {
                Ordering::Greater => true,
                Ordering::Less => false,
                // Transition Sunday: summer time begins at 01:00 UTC, inclusive.
                Ordering::Equal => c.hour >= 1,
            }
        }
        10 => {
            let change_day = last_sunday_of_month(c.year, 10);
            match c.day.cmp(&change_day) {
                Ordering::Less => true,
                Ordering::Greater => false,
                // Transition Sunday: summer time ends at 01:00 UTC, exclusive.
                Ordering::Equal => c.hour < 1,
            }
        }
        _ => false,
    }
}

/// Seconds to add to UTC for local display at the given instant.
#[must_use]
pub fn utc_offset_seconds(utc: UtcInstant) -> u64 {
    if is_dst(utc) {
        SUMMER_OFFSET_SECS
    } else {
        STANDARD_OFFSET_SECS
    }
}

/// Local wall-clock representation of a UTC instant.
///
/// Offset-encoded: the shifted count is only good for reading civil fields.
/// It is a distinct type precisely so the shifted value cannot flow back
/// into [`is_dst`] or the internal clock, where it would be off by the very
/// offset it encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalInstant(u64);

impl LocalInstant {
    /// Civil fields of this local wall-clock value.
    #[must_use]
    pub fn civil(self) -> CivilDateTime {
        decompose(self.0)
    }

    /// Local (hour, minute, second).
    #[must_use]
    pub fn hms(self) -> (u8, u8, u8) {
        let c = self.civil();
        (c.hour, c.minute, c.second)
    }

    /// The offset-encoded second count. Meaningful only for field extraction
    /// or for differencing against the source instant in tests.
    #[must_use]
    pub const fn as_encoded_seconds(self) -> u64 {
        self.0
    }
}

/// Convert a UTC instant to its local wall-clock representation.
#[must_use]
pub fn to_local(utc: UtcInstant) -> LocalInstant {
    LocalInstant(utc.as_unix_seconds() + utc_offset_seconds(utc))
}

fn decompose(secs: u64) -> CivilDateTime {
    let days = (secs / SECS_PER_DAY) as i64;
    let secs_of_day = secs % SECS_PER_DAY;
    let (year, month, day) = civil_from_days(days);
    CivilDateTime {
        year,
        month,
        day,
        hour: (secs_of_day / 3_600) as u8,
        minute: ((secs_of_day % 3_600) / 60) as u8,
        second: (secs_of_day % 60) as u8,
    }
}

/// Days since 1970-01-01 to (year, month, day). Hinnant's `civil_from_days`.
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    // Shift the epoch to 0000-03-01 so each leap day falls at year end.
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64; // day of era, [0, 146096]
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let year_march = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365], March-based
    let mp = (5 * doy + 2) / 153; // [0, 11], 0 = March
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8; // [1, 31]
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8; // [1, 12]
    let year = if month <= 2 { year_march + 1 } else { year_march };
    (year as i32, month, day)
}

/// (year, month, day) to days since 1970-01-01. Hinnant's `days_from_civil`.
fn days_from_civil(year: i32, month: u8, day: u8) -> i64 {
    let y = i64::from(year) - i64::from(month <= 2);
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64; // [0, 399]
    let mp = u64::from((month + 9) % 12); // March-based month, [0, 11]
    let doy = (153 * mp + 2) / 5 + u64::from(day) - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]
    era * 146_097 + doe as i64 - 719_468
}

/// Weekday for a day count since 1970-01-01, with Sunday = 0.
/// The epoch day was a Thursday (= 4 in this convention).
fn weekday_from_days(days: i64) -> u8 {
    (days + 4).rem_euclid(7) as u8
}

fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        _ => 28,
    }
}
