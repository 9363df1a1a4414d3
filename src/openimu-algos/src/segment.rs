use chrono::{NaiveDateTime, TimeDelta};
use openimu_types::DayBoundary;

use crate::{
    WindowError,
    helpers::time_math::{base_at_or_before, to_datetime, to_timestamp},
};

/// One day window of a recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayWindow {
    /// Index of the first sample in the window.
    pub start: usize,
    /// One past the index of the last sample in the window.
    pub stop: usize,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    /// The recording starts after `window_start` or ends before `window_end`.
    pub partial: bool,
}

impl DayWindow {
    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop == self.start
    }

    pub fn duration(&self) -> TimeDelta {
        self.window_end - self.window_start
    }
}

fn validate_timestamps(timestamps: &[f64]) -> Result<(), WindowError> {
    if let Some(index) = timestamps.iter().position(|t| !t.is_finite()) {
        return Err(WindowError::NonFiniteTimestamp { index });
    }
    if let Some(index) = timestamps.windows(2).position(|w| w[1] < w[0]) {
        return Err(WindowError::UnsortedTimestamps { index: index + 1 });
    }
    Ok(())
}

/// Splits `timestamps` into consecutive windows delimited by `boundary`.
///
/// The first window starts at the last boundary at or before the first
/// sample, and windows follow every `period_hours` until one ends after the
/// last sample. Windows without samples are left out, so the returned index
/// ranges tile `0..timestamps.len()` exactly.
pub fn day_windows(timestamps: &[f64], boundary: DayBoundary) -> Result<Vec<DayWindow>, WindowError> {
    validate_timestamps(timestamps)?;

    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        return Ok(Vec::new());
    };

    let n = timestamps.len();
    let first_time =
        to_datetime(first).ok_or(WindowError::TimestampOutOfRange { index: 0 })?;
    let origin = base_at_or_before(first_time, boundary.base_hour())
        .ok_or(WindowError::TimestampOutOfRange { index: 0 })?;
    let period_seconds = boundary.period_seconds();
    let origin_ts = to_timestamp(origin);
    let out_of_range = WindowError::TimestampOutOfRange { index: n - 1 };

    // the recording is taken to run one sample interval past its last timestamp
    let covered_until = match timestamps {
        [.., before, last] => last + (last - before),
        _ => last,
    };

    // boundary `k` periods after the origin
    let boundary_at = |k: i64| {
        period_seconds
            .checked_mul(k)
            .and_then(TimeDelta::try_seconds)
            .and_then(|offset| origin.checked_add_signed(offset))
    };

    let mut windows = Vec::new();
    let mut k: i64 = 0;
    loop {
        let window_start = boundary_at(k).ok_or(out_of_range.clone())?;
        let start_ts = to_timestamp(window_start);
        if start_ts > last {
            break;
        }
        let window_end = boundary_at(k + 1).ok_or(out_of_range.clone())?;
        let end_ts = to_timestamp(window_end);

        let start = timestamps.partition_point(|&t| t < start_ts);
        let stop = timestamps.partition_point(|&t| t < end_ts);

        if start < stop {
            let partial = (start == 0 && first > start_ts) || (stop == n && covered_until < end_ts);
            windows.push(DayWindow {
                start,
                stop,
                window_start,
                window_end,
                partial,
            });
            k += 1;
        } else {
            // jump over the gap to the period just before the next sample
            let periods_to_next = (timestamps[start] - origin_ts) / period_seconds as f64;
            k = (periods_to_next.floor() as i64 - 1).max(k + 1);
        }
    }

    Ok(windows)
}

/// `(start, stop)` sample indices of every day window, see [`day_windows`].
pub fn window_start_stop(
    timestamps: &[f64],
    base_hour: u32,
    period_hours: u32,
) -> Result<Vec<(usize, usize)>, WindowError> {
    let boundary = DayBoundary::new(base_hour, period_hours)?;
    Ok(day_windows(timestamps, boundary)?
        .into_iter()
        .map(|w| (w.start, w.stop))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HOUR: f64 = 3600.0;
    const DAY: f64 = 24.0 * HOUR;

    /// Midnight, 2025-01-01.
    fn midnight() -> f64 {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp() as f64
    }

    /// One sample every `step` seconds from `from` (inclusive) to `to` (exclusive).
    fn samples(from: f64, to: f64, step: f64) -> Vec<f64> {
        let n = ((to - from) / step).ceil() as usize;
        (0..n).map(|i| from + i as f64 * step).collect()
    }

    fn assert_tiles(pairs: &[(usize, usize)], n: usize) {
        assert_eq!(pairs.first().map(|p| p.0), Some(0));
        assert_eq!(pairs.last().map(|p| p.1), Some(n));
        for w in pairs.windows(2) {
            assert_eq!(w[0].1, w[1].0, "gap or overlap in {pairs:?}");
        }
        assert!(pairs.iter().all(|(s, e)| s < e));
    }

    #[test]
    fn empty_input() {
        assert!(window_start_stop(&[], 0, 24).unwrap().is_empty());
    }

    #[test]
    fn one_full_day() {
        let t = samples(midnight(), midnight() + DAY, 60.0);
        let windows = day_windows(&t, DayBoundary::new(0, 24).unwrap()).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].start, windows[0].stop), (0, t.len()));
        assert!(!windows[0].partial);
        assert_eq!(windows[0].duration(), TimeDelta::hours(24));
    }

    #[test]
    fn partial_first_and_last_days() {
        let from = midnight() + 3.0 * HOUR;
        let to = midnight() + 3.0 * DAY + 5.0 * HOUR;
        let t = samples(from, to, 30.0);

        let windows = day_windows(&t, DayBoundary::new(0, 24).unwrap()).unwrap();
        assert_eq!(windows.len(), 4);
        assert!(windows[0].partial);
        assert!(!windows[1].partial);
        assert!(!windows[2].partial);
        assert!(windows[3].partial);
        assert_eq!(windows[1].len(), (DAY / 30.0) as usize);
        assert_eq!(windows[0].len(), (21.0 * HOUR / 30.0) as usize);
        assert_eq!(windows[3].len(), (5.0 * HOUR / 30.0) as usize);

        let pairs = window_start_stop(&t, 0, 24).unwrap();
        assert_tiles(&pairs, t.len());
    }

    #[test]
    fn first_sample_before_base_hour_uses_previous_day() {
        let t = samples(midnight() + 3.0 * HOUR, midnight() + 12.0 * HOUR, 60.0);
        let windows = day_windows(&t, DayBoundary::new(8, 24).unwrap()).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(to_timestamp(windows[0].window_start), midnight() - 16.0 * HOUR);
        assert_eq!(to_timestamp(windows[1].window_start), midnight() + 8.0 * HOUR);
        assert_eq!(windows[0].stop, (5.0 * HOUR / 60.0) as usize);
        assert!(windows[0].partial && windows[1].partial);
    }

    #[test]
    fn twelve_hour_periods() {
        let t = samples(midnight() + 8.0 * HOUR, midnight() + 2.0 * DAY + 8.0 * HOUR, 60.0);
        let windows = day_windows(&t, DayBoundary::new(8, 12).unwrap()).unwrap();
        assert_eq!(windows.len(), 4);
        assert!(windows.iter().all(|w| !w.partial));
        assert!(windows.iter().all(|w| w.len() == 720));
        let pairs: Vec<_> = windows.iter().map(|w| (w.start, w.stop)).collect();
        assert_tiles(&pairs, t.len());
    }

    #[test]
    fn single_window_covers_everything() {
        let t = samples(midnight() + 9.0 * HOUR, midnight() + 10.0 * HOUR, 1.0);
        assert_eq!(window_start_stop(&t, 0, 24).unwrap(), vec![(0, t.len())]);
    }

    #[test]
    fn sample_on_boundary_starts_new_window() {
        let t = [midnight() + 23.0 * HOUR, midnight() + DAY, midnight() + DAY + 1.0];
        assert_eq!(window_start_stop(&t, 0, 24).unwrap(), vec![(0, 1), (1, 3)]);
    }

    #[test]
    fn duplicate_timestamps() {
        let m = midnight();
        let t = [m + 10.0, m + 10.0, m + 20.0, m + DAY, m + DAY, m + DAY + 5.0];
        let pairs = window_start_stop(&t, 0, 24).unwrap();
        assert_eq!(pairs, vec![(0, 3), (3, 6)]);
    }

    #[test]
    fn gaps_skip_empty_windows() {
        let m = midnight();
        let t = [m + HOUR, m + 2.0 * HOUR, m + 3.0 * DAY + HOUR];
        let windows = day_windows(&t, DayBoundary::new(0, 24).unwrap()).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start, windows[0].stop), (0, 2));
        assert_eq!((windows[1].start, windows[1].stop), (2, 3));
        assert_eq!(to_timestamp(windows[1].window_start), m + 3.0 * DAY);
    }

    #[test]
    fn long_gap_jumps_to_next_sample() {
        let m = midnight();
        // more hourly periods than fit in an i32
        let far = m + 250_000.0 * 365.0 * DAY;
        let t = [m + 1.0, far + 0.5 * HOUR];
        let windows = day_windows(&t, DayBoundary::new(0, 1).unwrap()).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start, windows[0].stop), (0, 1));
        assert_eq!((windows[1].start, windows[1].stop), (1, 2));
        assert_eq!(to_timestamp(windows[1].window_start), far);
        assert_eq!(to_timestamp(windows[1].window_end), far + HOUR);
    }

    #[test]
    fn invalid_descriptor() {
        let t = [midnight()];
        assert!(matches!(
            window_start_stop(&t, 24, 12),
            Err(WindowError::Boundary(_))
        ));
        assert!(matches!(
            window_start_stop(&t, 0, 25),
            Err(WindowError::Boundary(_))
        ));
        assert!(matches!(
            window_start_stop(&t, 8, 0),
            Err(WindowError::Boundary(_))
        ));
    }

    #[test]
    fn invalid_timestamps() {
        let m = midnight();
        assert_eq!(
            window_start_stop(&[m, m + 2.0, m + 1.0], 0, 24),
            Err(WindowError::UnsortedTimestamps { index: 2 })
        );
        assert_eq!(
            window_start_stop(&[m, f64::NAN], 0, 24),
            Err(WindowError::NonFiniteTimestamp { index: 1 })
        );
        assert_eq!(
            window_start_stop(&[1e300], 0, 24),
            Err(WindowError::TimestampOutOfRange { index: 0 })
        );
    }
}
