//! Reach-search over a linear polyline
//!
//! Point `i` is reached after exactly `i` minutes and `i` km, so every
//! expected index follows directly from the target.

mod fixtures;

use std::time::Duration;

use proptest::prelude::*;

use haul_planner::error::{PlannerError, ProviderError};
use haul_planner::polyline::Polyline;
use haul_planner::reach::{ReachTarget, ReachTolerance, find_reach_point};

use fixtures::{CountingDirections, LinearDirections, linear_polyline, mins};

const TOLERANCE: ReachTolerance = ReachTolerance {
    time: Duration::from_secs(300),
    distance: 5_000.0,
};

/// Smallest `k` with `8^k >= n - 1`.
fn call_bound(n: usize) -> usize {
    let mut k = 0;
    let mut reach = 1usize;
    while reach < n.saturating_sub(1) {
        reach *= 8;
        k += 1;
    }
    k
}

#[test]
fn finds_time_target_in_two_calls() {
    let directions = LinearDirections::default();
    let polyline = linear_polyline(1001);

    let found = find_reach_point(&directions, &polyline, &ReachTarget::time(mins(300)), &TOLERANCE)
        .expect("reach point");

    // Round one probes 125..=1000 and brackets (250, 375]; round two probes
    // 265, 281, 296 and lands at 296 inside [295, 300].
    assert_eq!(found.index, 296);
    assert_eq!(found.coords, (296.0, 0.0));
    assert_eq!(found.calls, 2);
    assert_eq!(directions.calls(), 2);
}

#[test]
fn finds_distance_target() {
    let directions = LinearDirections::default();
    let polyline = linear_polyline(1001);

    let found = find_reach_point(&directions, &polyline, &ReachTarget::distance(42_000.0), &TOLERANCE)
        .expect("reach point");

    assert!((37..=42).contains(&found.index), "index {}", found.index);
}

#[test]
fn distance_budget_caps_time_target() {
    let directions = LinearDirections::default();
    let polyline = linear_polyline(1001);
    let target = ReachTarget::time(mins(600)).or_distance(100_000.0);

    let found = find_reach_point(&directions, &polyline, &target, &TOLERANCE).expect("reach point");

    assert!((95..=100).contains(&found.index), "index {}", found.index);
}

#[test]
fn short_polyline_returns_last_point() {
    let directions = LinearDirections::default();
    let polyline = linear_polyline(50);

    let found = find_reach_point(&directions, &polyline, &ReachTarget::time(mins(300)), &TOLERANCE)
        .expect("reach point");

    assert_eq!(found.index, 49);
    assert_eq!(found.calls, 1);
}

#[test]
fn single_point_needs_no_calls() {
    let directions = LinearDirections::default();
    let polyline = linear_polyline(1);

    let found = find_reach_point(&directions, &polyline, &ReachTarget::time(mins(10)), &TOLERANCE)
        .expect("reach point");

    assert_eq!(found.index, 0);
    assert_eq!(found.calls, 0);
    assert_eq!(directions.calls(), 0);
}

#[test]
fn empty_polyline_is_rejected() {
    let directions = LinearDirections::default();
    let err = find_reach_point(&directions, &Polyline::default(), &ReachTarget::time(mins(10)), &TOLERANCE)
        .unwrap_err();
    assert!(matches!(err, PlannerError::InvalidRequest(_)), "{err:?}");
}

#[test]
fn target_without_budget_is_rejected() {
    let directions = LinearDirections::default();
    let target = ReachTarget {
        time_left: None,
        distance_within: None,
    };
    let err = find_reach_point(&directions, &linear_polyline(10), &target, &TOLERANCE).unwrap_err();
    assert!(matches!(err, PlannerError::InvalidRequest(_)), "{err:?}");
}

#[test]
fn provider_failure_propagates() {
    let directions = CountingDirections::new(LinearDirections::default());
    directions.set_failing(true);

    let err = find_reach_point(&directions, &linear_polyline(100), &ReachTarget::time(mins(30)), &TOLERANCE)
        .unwrap_err();

    assert!(matches!(err, PlannerError::Provider(ProviderError::NoConnection(_))), "{err:?}");
    assert!(err.is_retryable());
}

#[test]
fn each_call_carries_at_most_seven_waypoints() {
    let directions = LinearDirections::default();
    for target in [1, 77, 512, 999] {
        find_reach_point(&directions, &linear_polyline(5000), &ReachTarget::time(mins(target)), &TOLERANCE)
            .expect("reach point");
    }
    assert!(directions.max_waypoints.load(std::sync::atomic::Ordering::SeqCst) <= 7);
}

proptest! {
    #[test]
    fn lands_in_window_within_call_bound(n in 3usize..3000, target in 0u64..3000) {
        let directions = LinearDirections::default();
        let polyline = linear_polyline(n);

        let found = find_reach_point(&directions, &polyline, &ReachTarget::time(mins(target)), &TOLERANCE)
            .expect("reach point");

        let last = n - 1;
        let window_low = target.saturating_sub(5) as usize;
        let window_high = target as usize;
        if window_low <= last {
            prop_assert!(
                found.index >= window_low && found.index <= window_high.min(last),
                "index {} outside [{}, {}]", found.index, window_low, window_high
            );
        } else {
            prop_assert_eq!(found.index, last);
        }
        prop_assert!(found.calls <= call_bound(n), "{} calls for n={}", found.calls, n);
    }
}
