use proptest::prelude::*;
use trialbench_stats::{
    Baseline, StatsError, SummaryOptions, coefficient_of_variation, compute_summary,
    geometric_mean, max, mean, min, percentile, std_dev, t_score, z_score,
};

fn samples() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6f64..1.0e6, 1..200)
}

fn positive_samples() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0e-3f64..1.0e6, 1..200)
}

proptest! {
    #[test]
    fn median_and_mean_lie_within_extrema(s in samples()) {
        let lo = min(&s).unwrap();
        let hi = max(&s).unwrap();
        let median = percentile(&s, 50.0).unwrap();
        let avg = mean(&s).unwrap();

        prop_assert!(lo <= median && median <= hi, "{} <= {} <= {}", lo, median, hi);
        prop_assert!(lo <= avg && avg <= hi, "{} <= {} <= {}", lo, avg, hi);
    }

    #[test]
    fn percentile_endpoints_are_exact_extrema(s in samples()) {
        prop_assert_eq!(percentile(&s, 0.0).unwrap(), min(&s).unwrap());
        prop_assert_eq!(percentile(&s, 100.0).unwrap(), max(&s).unwrap());
    }

    #[test]
    fn percentile_is_monotone_in_p(s in samples(), a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
        let (p, q) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(percentile(&s, p).unwrap() <= percentile(&s, q).unwrap());
    }

    #[test]
    fn dispersion_is_non_negative(s in samples()) {
        prop_assert!(std_dev(&s).unwrap() >= 0.0);
        prop_assert!(coefficient_of_variation(&s).unwrap() >= 0.0);
    }

    #[test]
    fn geometric_mean_rejects_non_positive(mut s in positive_samples(), idx in any::<prop::sample::Index>(), bad in -1.0e3f64..=0.0) {
        let i = idx.index(s.len());
        s[i] = bad;
        let is_non_positive = matches!(geometric_mean(&s), Err(StatsError::NonPositive { .. }));
        prop_assert!(is_non_positive);
    }

    #[test]
    fn geometric_mean_bounded_by_arithmetic(s in positive_samples()) {
        let g = geometric_mean(&s).unwrap();
        let a = mean(&s).unwrap();
        prop_assert!(g <= a * (1.0 + 1e-9), "geo {} > arith {}", g, a);
    }

    #[test]
    fn scores_vanish_against_identical_baseline(s in prop::collection::vec(-1.0e6f64..1.0e6, 2..100)) {
        let baseline = Baseline::from_samples(&s).unwrap();
        prop_assert_eq!(z_score(&s, &baseline).unwrap(), 0.0);
        prop_assert_eq!(t_score(&s, &baseline).unwrap(), 0.0);
    }

    #[test]
    fn summary_leaves_input_order_untouched(s in samples()) {
        let before = s.clone();
        let summary = compute_summary(&s, &SummaryOptions::default()).unwrap();
        prop_assert_eq!(&s, &before);
        prop_assert_eq!(summary.sample_count, s.len());
        prop_assert!(summary.min <= summary.median && summary.median <= summary.max);
    }
}
