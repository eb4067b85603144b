//! Date serial numbers
//!
//! Spreadsheets store dates as day counts. The 1900 system counts from
//! 1900-01-01 = 1 and keeps Lotus' phantom 1900-02-29 (serial 60); the 1904
//! system counts from 1904-01-01 = 0.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Which epoch date serials are counted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateSystem {
    /// Windows default (1900-01-01 = 1)
    #[default]
    V1900,
    /// Classic Mac default (1904-01-01 = 0)
    V1904,
}

fn epoch(system: DateSystem, whole_days: i64) -> Option<NaiveDate> {
    match system {
        // Serials below 61 predate the phantom leap day.
        DateSystem::V1900 if whole_days < 61 => NaiveDate::from_ymd_opt(1899, 12, 31),
        DateSystem::V1900 => NaiveDate::from_ymd_opt(1899, 12, 30),
        DateSystem::V1904 => NaiveDate::from_ymd_opt(1904, 1, 1),
    }
}

/// Convert a serial to a calendar date and time
///
/// The time of day is rounded to the nearest millisecond. Returns `None` for
/// negative, non-finite or out-of-range serials. Serial 60 in the 1900
/// system has no real date and lands on 1900-03-01.
pub fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let mut days = serial.floor() as i64;
    let frac = serial - days as f64;
    let mut millis = (frac * MILLIS_PER_DAY as f64 + 0.5) as i64;
    if millis >= MILLIS_PER_DAY {
        millis -= MILLIS_PER_DAY;
        days = days.checked_add(1)?;
    }

    let base = epoch(system, days)?;
    let date = base.checked_add_signed(Duration::try_days(days)?)?;
    let time = NaiveTime::MIN + Duration::try_milliseconds(millis)?;
    Some(date.and_time(time))
}

/// Convert a calendar date and time to a serial
pub fn datetime_to_serial(value: NaiveDateTime, system: DateSystem) -> f64 {
    let date = value.date();
    let days = match system {
        DateSystem::V1900 => {
            let base = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap_or(NaiveDate::MIN);
            let days = (date - base).num_days();
            let leap_bug_cutover = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap_or(NaiveDate::MIN);
            if date >= leap_bug_cutover {
                days + 1
            } else {
                days
            }
        }
        DateSystem::V1904 => {
            let base = NaiveDate::from_ymd_opt(1904, 1, 1).unwrap_or(NaiveDate::MIN);
            (date - base).num_days()
        }
    };
    let millis = (value.time() - NaiveTime::MIN).num_milliseconds();
    days as f64 + millis as f64 / MILLIS_PER_DAY as f64
}
