//! Property-based tests for schedule merging and evaluation.
//!
//! These hold for any set of occurrences, not just the hand-picked cases in
//! the unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use roomstatus_core::{MergedSchedule, RoomState, TimeInterval, evaluate};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 5, 0, 0, 0).unwrap()
}

/// An occurrence within one day, on a five-minute grid so touching and
/// duplicated intervals are common. Zero-length occurrences are included.
fn arb_interval() -> impl Strategy<Value = TimeInterval> {
    (0i64..288, 0i64..24).prop_map(|(slot, len)| {
        let start = base() + Duration::minutes(slot * 5);
        TimeInterval::new(start, start + Duration::minutes(len * 5))
    })
}

fn arb_intervals() -> impl Strategy<Value = Vec<TimeInterval>> {
    prop::collection::vec(arb_interval(), 0..40)
}

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..(26 * 60 * 60)).prop_map(|secs| base() + Duration::seconds(secs))
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// True if `at` lies inside some closed interval of `intervals`.
fn covered(intervals: &[TimeInterval], at: DateTime<Utc>) -> bool {
    intervals.iter().any(|i| i.start <= at && at <= i.end)
}

/// Every boundary of either set, plus the midpoints between neighbours.
fn sample_points(a: &[TimeInterval], b: &[TimeInterval]) -> Vec<DateTime<Utc>> {
    let mut edges: Vec<DateTime<Utc>> = a
        .iter()
        .chain(b.iter())
        .flat_map(|i| [i.start, i.end])
        .collect();
    edges.sort();
    edges.dedup();

    let mut samples = edges.clone();
    for pair in edges.windows(2) {
        samples.push(pair[0] + (pair[1] - pair[0]) / 2);
    }
    samples
}

// ---------------------------------------------------------------------------
// Property 1: merging a merged schedule changes nothing
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn merge_is_idempotent(intervals in arb_intervals()) {
        let once = MergedSchedule::merge(intervals);
        let twice = MergedSchedule::merge(once.intervals().to_vec());
        prop_assert_eq!(once, twice);
    }
}

// ---------------------------------------------------------------------------
// Property 2: merged intervals are sorted and strictly disjoint
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn merge_is_disjoint(intervals in arb_intervals()) {
        let merged = MergedSchedule::merge(intervals);
        for pair in merged.intervals().windows(2) {
            prop_assert!(
                pair[0].end < pair[1].start,
                "intervals touch or overlap: {:?} then {:?}",
                pair[0],
                pair[1]
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: the merged union covers exactly the input union
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn merge_preserves_coverage(intervals in arb_intervals()) {
        let merged = MergedSchedule::merge(intervals.clone());
        for at in sample_points(&intervals, merged.intervals()) {
            prop_assert_eq!(
                covered(&intervals, at),
                covered(merged.intervals(), at),
                "coverage differs at {}",
                at
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: input order does not matter
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn merge_ignores_input_order(intervals in arb_intervals()) {
        let mut reversed = intervals.clone();
        reversed.reverse();
        prop_assert_eq!(MergedSchedule::merge(intervals), MergedSchedule::merge(reversed));
    }
}

// ---------------------------------------------------------------------------
// Property 5: busy exactly when some raw occurrence is active
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn busy_matches_raw_occurrences(intervals in arb_intervals(), now in arb_instant()) {
        let raw_busy = intervals.iter().any(|i| i.contains(now));
        let verdict = evaluate(&MergedSchedule::merge(intervals), &now);

        if raw_busy {
            prop_assert_eq!(verdict.state, RoomState::Busy);
            prop_assert!(verdict.detail.starts_with("booked until "));
        } else {
            prop_assert_eq!(verdict.state, RoomState::Free);
            prop_assert!(
                verdict.detail == "free for the day" || verdict.detail.starts_with("free until ")
            );
        }
    }
}
