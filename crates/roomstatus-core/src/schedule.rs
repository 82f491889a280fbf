//! Merged busy schedules.
//!
//! A room's raw occurrences can overlap, repeat, or arrive in any order.
//! [`MergedSchedule::merge`] collapses them into the minimal sorted set of
//! disjoint intervals covering the same time.

use crate::time::TimeInterval;

/// A sorted, strictly disjoint sequence of busy intervals.
///
/// For any two consecutive intervals `a` and `b`, `a.end < b.start`.
/// Touching or overlapping inputs are fused during [`merge`](Self::merge).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedSchedule {
    intervals: Vec<TimeInterval>,
}

impl MergedSchedule {
    /// Merges raw occurrence intervals into a disjoint schedule.
    ///
    /// Intervals are sorted by `(start, end)` and swept left to right. An
    /// interval starting at or before the current end extends it; anything
    /// later starts a new run.
    pub fn merge(intervals: impl IntoIterator<Item = TimeInterval>) -> Self {
        let mut sorted: Vec<TimeInterval> = intervals.into_iter().collect();
        if sorted.is_empty() {
            return Self::default();
        }

        sorted.sort_by_key(|interval| (interval.start, interval.end));

        let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
        let mut current = sorted[0];
        for next in sorted.into_iter().skip(1) {
            if next.start <= current.end {
                current.end = current.end.max(next.end);
            } else {
                merged.push(current);
                current = next;
            }
        }
        merged.push(current);

        Self { intervals: merged }
    }

    /// Builds a schedule without checking the disjointness invariant.
    #[cfg(test)]
    pub(crate) fn from_unchecked(intervals: Vec<TimeInterval>) -> Self {
        Self { intervals }
    }

    /// Returns the merged intervals in ascending order.
    pub fn intervals(&self) -> &[TimeInterval] {
        &self.intervals
    }

    /// Consumes the schedule, returning its intervals.
    pub fn into_intervals(self) -> Vec<TimeInterval> {
        self.intervals
    }

    /// Returns the number of merged intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns true if nothing is booked.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 5, h, m, 0).unwrap()
    }

    fn span(sh: u32, sm: u32, eh: u32, em: u32) -> TimeInterval {
        TimeInterval::new(at(sh, sm), at(eh, em))
    }

    #[test]
    fn empty_input() {
        let schedule = MergedSchedule::merge(Vec::new());
        assert!(schedule.is_empty());
        assert_eq!(schedule.len(), 0);
    }

    #[test]
    fn single_interval() {
        let schedule = MergedSchedule::merge(vec![span(9, 0, 10, 0)]);
        assert_eq!(schedule.intervals(), &[span(9, 0, 10, 0)]);
    }

    #[test]
    fn unsorted_disjoint_intervals_are_sorted() {
        let schedule = MergedSchedule::merge(vec![span(14, 0, 15, 0), span(9, 0, 10, 0)]);
        assert_eq!(schedule.intervals(), &[span(9, 0, 10, 0), span(14, 0, 15, 0)]);
    }

    #[test]
    fn overlapping_intervals_fuse() {
        let schedule = MergedSchedule::merge(vec![span(9, 0, 10, 30), span(10, 0, 11, 0)]);
        assert_eq!(schedule.intervals(), &[span(9, 0, 11, 0)]);
    }

    #[test]
    fn touching_intervals_fuse() {
        let schedule = MergedSchedule::merge(vec![span(9, 30, 10, 0), span(9, 0, 9, 30)]);
        assert_eq!(schedule.intervals(), &[span(9, 0, 10, 0)]);
    }

    #[test]
    fn contained_interval_is_absorbed() {
        let schedule = MergedSchedule::merge(vec![span(9, 0, 12, 0), span(10, 0, 10, 30)]);
        assert_eq!(schedule.intervals(), &[span(9, 0, 12, 0)]);
    }

    #[test]
    fn duplicates_collapse() {
        let schedule = MergedSchedule::merge(vec![span(9, 0, 10, 0); 3]);
        assert_eq!(schedule.intervals(), &[span(9, 0, 10, 0)]);
    }

    #[test]
    fn equal_starts_keep_longest_end() {
        let schedule = MergedSchedule::merge(vec![span(9, 0, 11, 0), span(9, 0, 9, 30)]);
        assert_eq!(schedule.intervals(), &[span(9, 0, 11, 0)]);
    }

    #[test]
    fn points_fuse_with_touching_intervals() {
        let schedule = MergedSchedule::merge(vec![
            TimeInterval::point(at(10, 0)),
            span(9, 0, 10, 0),
            TimeInterval::point(at(12, 0)),
        ]);
        assert_eq!(
            schedule.intervals(),
            &[span(9, 0, 10, 0), TimeInterval::point(at(12, 0))]
        );
    }

    #[test]
    fn chain_of_overlaps() {
        let schedule = MergedSchedule::merge(vec![
            span(13, 0, 14, 0),
            span(9, 0, 10, 0),
            span(9, 45, 11, 0),
            span(10, 59, 12, 0),
            span(15, 0, 16, 0),
        ]);
        assert_eq!(
            schedule.intervals(),
            &[span(9, 0, 12, 0), span(13, 0, 14, 0), span(15, 0, 16, 0)]
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let once = MergedSchedule::merge(vec![
            span(9, 0, 10, 0),
            span(9, 30, 10, 30),
            span(11, 0, 12, 0),
        ]);
        let twice = MergedSchedule::merge(once.clone().into_intervals());
        assert_eq!(once, twice);
    }
}
