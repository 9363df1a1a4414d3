use chrono::{DateTime, NaiveDateTime, TimeDelta};

const NANOS_PER_SECOND: f64 = 1e9;

/// Wall-clock date time for `ts` seconds since the epoch.
pub fn to_datetime(ts: f64) -> Option<NaiveDateTime> {
    if !ts.is_finite() {
        return None;
    }

    let secs = ts.floor();
    let nanos = ((ts - secs) * NANOS_PER_SECOND).round().min(NANOS_PER_SECOND - 1.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos).map(|dt| dt.naive_utc())
}

pub fn to_timestamp(time: NaiveDateTime) -> f64 {
    let utc = time.and_utc();
    utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) / NANOS_PER_SECOND
}

/// Latest `base_hour:00:00` that is at or before `time`.
pub fn base_at_or_before(time: NaiveDateTime, base_hour: u32) -> Option<NaiveDateTime> {
    let same_day = time.date().and_hms_opt(base_hour, 0, 0)?;
    if time >= same_day {
        Some(same_day)
    } else {
        same_day.checked_sub_signed(TimeDelta::days(1))
    }
}
