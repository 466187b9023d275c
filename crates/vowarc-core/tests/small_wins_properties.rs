//! Property tests for the Small Wins aggregator.

use proptest::prelude::*;
use vowarc_core::stats::{average_rate, compute_small_wins, rate, MetricsConfig, SmallWinsCounts};

fn counts() -> impl Strategy<Value = SmallWinsCounts> {
    (
        (0u32..100, 0u32..100, 0u32..30),
        (0u32..100, 0u32..100),
        (0u32..100, 0u32..100),
        (0u32..100, 0u32..100),
    )
        .prop_map(
            |(
                (checkin_count, checkin_total, checkin_streak),
                (if_then_count, if_then_total),
                (evidence_count, evidence_expected),
                (commitment_completed, commitment_total),
            )| SmallWinsCounts {
                checkin_count,
                checkin_total,
                checkin_streak,
                if_then_count,
                if_then_total,
                evidence_count,
                evidence_expected,
                commitment_completed,
                commitment_total,
            },
        )
}

proptest! {
    #[test]
    fn rates_stay_in_unit_interval(c in counts()) {
        let m = compute_small_wins(&c);
        for r in [m.checkin_rate, m.if_then_rate, m.evidence_rate, m.commitment_rate, m.average_rate] {
            prop_assert!((0.0..=1.0).contains(&r), "rate {} out of range", r);
        }
    }

    #[test]
    fn rates_near_u32_max_stay_in_unit_interval(count in any::<u32>(), total in (u32::MAX - 1000)..=u32::MAX) {
        let r = rate(count, total);
        prop_assert!((0.0..=1.0).contains(&r));
        let flipped = rate(total, count);
        prop_assert!((0.0..=1.0).contains(&flipped));
    }

    #[test]
    fn zero_total_means_zero_rate(count in 0u32..1000) {
        prop_assert_eq!(rate(count, 0), 0.0);
    }

    #[test]
    fn average_ignores_order(a in 0.0f64..=1.0, b in 0.0f64..=1.0, c in 0.0f64..=1.0, d in 0.0f64..=1.0) {
        let forward = average_rate([a, b, c, d]);
        let reversed = average_rate([d, c, b, a]);
        prop_assert!((forward - reversed).abs() < 1e-12);
    }

    #[test]
    fn more_checkins_never_lower_the_average(c in counts(), extra in 1u32..10) {
        let before = compute_small_wins(&c);
        let mut more = c;
        more.checkin_count = c.checkin_count.saturating_add(extra);
        let after = compute_small_wins(&more);
        prop_assert!(after.average_rate >= before.average_rate);
    }

    #[test]
    fn tier_is_deterministic(c in counts()) {
        let config = MetricsConfig::default();
        let first = config.assess(&compute_small_wins(&c));
        let second = config.assess(&compute_small_wins(&c));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn higher_average_never_lowers_tier(x in 0.0f64..=1.0, y in 0.0f64..=1.0) {
        let config = MetricsConfig::default();
        let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
        prop_assert!(config.tier_for(lo) <= config.tier_for(hi));
    }
}

#[test]
fn rate_at_the_top_of_the_domain() {
    assert_eq!(rate(u32::MAX, 1), 1.0);
    assert_eq!(rate(u32::MAX, u32::MAX), 1.0);
    assert_eq!(rate(u32::MAX, 0), 0.0);
    let tiny = rate(1, u32::MAX);
    assert!(tiny > 0.0 && tiny < 1e-9);

    let m = compute_small_wins(&SmallWinsCounts {
        checkin_count: u32::MAX,
        checkin_total: u32::MAX,
        checkin_streak: u32::MAX,
        if_then_count: u32::MAX,
        if_then_total: 1,
        evidence_count: 1,
        evidence_expected: u32::MAX,
        commitment_completed: 0,
        commitment_total: u32::MAX,
    });
    assert_eq!(m.checkin_rate, 1.0);
    assert_eq!(m.if_then_rate, 1.0);
    assert!((0.0..=1.0).contains(&m.average_rate));
}
