//! Time types for room schedules.
//!
//! This module provides [`TimeInterval`] for a single busy occurrence and
//! [`TimeWindow`] for the range a calendar is queried over.

use chrono::{DateTime, Duration, NaiveDate, Offset, TimeZone, Utc};
use tracing::debug;

/// A closed span of time occupied by one calendar occurrence.
///
/// `start <= end` always holds. A zero-length interval represents a single
/// instant (an occurrence without an end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeInterval {
    /// Start of the occurrence.
    pub start: DateTime<Utc>,
    /// End of the occurrence.
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Creates a new interval.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeInterval start must be <= end");
        Self { start, end }
    }

    /// Creates a zero-duration interval at the given instant.
    pub fn point(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    /// Builds an interval from a calendar occurrence whose end may be missing.
    ///
    /// A missing end yields a point at `start`. An end before `start` is
    /// clamped to `start`.
    pub fn from_occurrence(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        match end {
            Some(end) if end >= start => Self { start, end },
            Some(end) => {
                debug!(%start, %end, "Occurrence ends before it starts, clamping to a point");
                Self::point(start)
            }
            None => Self::point(start),
        }
    }

    /// Returns the length of the interval.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if the interval has no length.
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    /// Checks if the interval is active at `at`.
    ///
    /// Uses half-open semantics: `[start, end)`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Checks if the interval touches the given window.
    ///
    /// Points are kept when they fall inside the window.
    pub fn overlaps(&self, window: &TimeWindow) -> bool {
        if self.is_point() {
            return window.contains(self.start);
        }
        self.start < window.end && self.end > window.start
    }
}

/// A time window for querying calendar occurrences.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a time window for "today" starting from now until local midnight.
    pub fn today_remaining<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Self {
        let local_now = now.with_timezone(tz);
        let offset_secs = local_now.offset().fix().local_minus_utc();
        let end = next_midnight(local_now.date_naive(), tz, offset_secs);
        Self {
            start: now,
            end: end.max(now),
        }
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }
}

/// Resolves the midnight following `date` in `tz`.
///
/// Ambiguous midnights take the earliest instant; a midnight skipped by a
/// transition falls back to the offset in effect on `date`.
fn next_midnight<Tz: TimeZone>(
    date: NaiveDate,
    tz: &Tz,
    fallback_offset_secs: i32,
) -> DateTime<Utc> {
    let naive = date
        .succ_opt()
        .unwrap_or(date)
        .and_time(chrono::NaiveTime::MIN);
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => {
            let shifted = naive - Duration::seconds(i64::from(fallback_offset_secs));
            Utc.from_utc_datetime(&shifted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    mod time_interval {
        use super::*;

        #[test]
        fn creation() {
            let interval =
                TimeInterval::new(utc(2025, 2, 5, 10, 0, 0), utc(2025, 2, 5, 11, 0, 0));
            assert_eq!(interval.duration(), Duration::hours(1));
            assert!(!interval.is_point());
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn invalid_interval() {
            TimeInterval::new(utc(2025, 2, 5, 11, 0, 0), utc(2025, 2, 5, 10, 0, 0));
        }

        #[test]
        fn occurrence_without_end_is_point() {
            let start = utc(2025, 2, 5, 10, 0, 0);
            let interval = TimeInterval::from_occurrence(start, None);
            assert!(interval.is_point());
            assert_eq!(interval.start, start);
            assert_eq!(interval.end, start);
        }

        #[test]
        fn occurrence_with_reversed_end_is_clamped() {
            let start = utc(2025, 2, 5, 10, 0, 0);
            let interval = TimeInterval::from_occurrence(start, Some(utc(2025, 2, 5, 9, 0, 0)));
            assert_eq!(interval, TimeInterval::point(start));
        }

        #[test]
        fn contains_is_half_open() {
            let interval = TimeInterval::new(utc(2025, 2, 5, 10, 0, 0), utc(2025, 2, 5, 11, 0, 0));

            assert!(interval.contains(utc(2025, 2, 5, 10, 0, 0)));
            assert!(interval.contains(utc(2025, 2, 5, 10, 59, 59)));
            assert!(!interval.contains(utc(2025, 2, 5, 11, 0, 0)));
            assert!(!interval.contains(utc(2025, 2, 5, 9, 59, 59)));

            let point = TimeInterval::point(utc(2025, 2, 5, 10, 0, 0));
            assert!(!point.contains(utc(2025, 2, 5, 10, 0, 0)));
        }

        #[test]
        fn overlaps_window() {
            let window = TimeWindow::new(utc(2025, 2, 5, 9, 0, 0), utc(2025, 2, 5, 17, 0, 0));

            // Started before the window, still running
            let ongoing = TimeInterval::new(utc(2025, 2, 5, 8, 0, 0), utc(2025, 2, 5, 10, 0, 0));
            assert!(ongoing.overlaps(&window));

            // Ended exactly at the window start
            let finished = TimeInterval::new(utc(2025, 2, 5, 8, 0, 0), utc(2025, 2, 5, 9, 0, 0));
            assert!(!finished.overlaps(&window));

            // Starts exactly at the window end
            let later = TimeInterval::new(utc(2025, 2, 5, 17, 0, 0), utc(2025, 2, 5, 18, 0, 0));
            assert!(!later.overlaps(&window));

            assert!(TimeInterval::point(utc(2025, 2, 5, 9, 0, 0)).overlaps(&window));
            assert!(!TimeInterval::point(utc(2025, 2, 5, 17, 0, 0)).overlaps(&window));
        }
    }

    mod time_window {
        use super::*;

        #[test]
        fn creation() {
            let start = utc(2025, 2, 5, 9, 0, 0);
            let end = utc(2025, 2, 5, 17, 0, 0);
            let window = TimeWindow::new(start, end);
            assert_eq!(window.start, start);
            assert_eq!(window.end, end);
            assert_eq!(window.duration(), Duration::hours(8));
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn invalid_window() {
            TimeWindow::new(utc(2025, 2, 5, 17, 0, 0), utc(2025, 2, 5, 9, 0, 0));
        }

        #[test]
        fn today_remaining_utc() {
            let now = utc(2025, 2, 5, 14, 30, 0);
            let window = TimeWindow::today_remaining(now, &Utc);
            assert_eq!(window.start, now);
            assert_eq!(window.end, utc(2025, 2, 6, 0, 0, 0));
        }

        #[test]
        fn today_remaining_in_zone() {
            // 23:30 UTC is already the next day in Berlin (UTC+1 in February)
            let now = utc(2025, 2, 5, 23, 30, 0);
            let window = TimeWindow::today_remaining(now, &chrono_tz::Europe::Berlin);
            assert_eq!(window.end, utc(2025, 2, 6, 23, 0, 0));

            // New York is UTC-5 in February
            let window = TimeWindow::today_remaining(now, &chrono_tz::America::New_York);
            assert_eq!(window.end, utc(2025, 2, 6, 5, 0, 0));
        }

        #[test]
        fn today_remaining_across_skipped_midnight() {
            // Santiago springs forward at local midnight on 2024-09-08
            let now = utc(2024, 9, 7, 20, 0, 0);
            let window = TimeWindow::today_remaining(now, &chrono_tz::America::Santiago);
            assert!(window.end > now);
            assert!(window.duration() <= Duration::hours(24));
        }

        #[test]
        fn contains_datetime() {
            let window = TimeWindow::new(utc(2025, 2, 5, 9, 0, 0), utc(2025, 2, 5, 17, 0, 0));

            assert!(window.contains(utc(2025, 2, 5, 9, 0, 0))); // start inclusive
            assert!(!window.contains(utc(2025, 2, 5, 17, 0, 0))); // end exclusive
            assert!(!window.contains(utc(2025, 2, 5, 8, 59, 59)));
        }
    }
}
