//! Correctness and invariant tests for flowranges
//!
//! These tests exercise the properties the engine must keep end to end:
//! bounded memory, streaming accuracy, outlier behavior of the strategies,
//! weighted pooling, and convergence of the false-positive-rate search.
//!
//! Run with: cargo test --test correctness

use flowranges::aggregate::MultiDatasetAggregator;
use flowranges::optimizer::{OptimizerConfig, RangeOptimizer, TunedParameter};
use flowranges::quantiles::percentile;
use flowranges::ranges::{MethodParams, Range, RangeMethod, RangeSpec};
use flowranges::statistics::StreamingStatsCalculator;
use flowranges::traits::SamplingSketch;
use flowranges::Error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn normal_values(n: usize, mean: f64, std: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Normal::new(mean, std).unwrap();
    (0..n).map(|_| dist.sample(&mut rng)).collect()
}

fn all_methods() -> [RangeMethod; 5] {
    [
        RangeMethod::PERCENTILE_95,
        RangeMethod::StdDev { k: 3.0 },
        RangeMethod::Iqr { multiplier: 1.5 },
        RangeMethod::RobustPercentile,
        RangeMethod::Conservative { buffer: 0.1 },
    ]
}

fn optimizer(capacity: usize, seed: u64) -> RangeOptimizer {
    RangeOptimizer::new(
        OptimizerConfig::default()
            .with_capacity(capacity)
            .with_seed(seed),
    )
    .unwrap()
}

// ============================================================================
// Streaming statistics
// ============================================================================

mod streaming {
    use super::*;

    #[test]
    fn mean_and_std_match_batch() {
        let data = normal_values(25_000, 0.35, 0.1, 1);
        let mut calc = StreamingStatsCalculator::with_seed(1000, 1);
        for &v in &data {
            calc.add_value(v);
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let std = (data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();

        assert!(
            ((calc.mean() - mean) / mean).abs() < 1e-6,
            "streaming mean {} vs batch {}",
            calc.mean(),
            mean
        );
        assert!(
            ((calc.std_dev() - std) / std).abs() < 1e-6,
            "streaming std {} vs batch {}",
            calc.std_dev(),
            std
        );
    }

    #[test]
    fn percentile_error_bounded_at_capacity_1000() {
        let data = normal_values(50_000, 10.0, 2.0, 2);
        let mut calc = StreamingStatsCalculator::with_seed(1000, 2);
        for &v in &data {
            calc.add_value(v);
        }
        assert_eq!(calc.sample_size(), 1000);

        for p in [5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0] {
            let approx = calc.percentile(p).unwrap();
            let exact = percentile(&data, p).unwrap();
            assert!(
                (approx - exact).abs() <= 1.0,
                "p{}: streaming {} vs batch {}",
                p,
                approx,
                exact
            );
        }
    }

    #[test]
    fn sample_size_is_min_of_capacity_and_count() {
        for (capacity, n) in [(10, 3), (10, 10), (10, 11), (500, 20_000)] {
            let mut calc = StreamingStatsCalculator::with_seed(capacity, 3);
            for i in 0..n {
                calc.add_value(i as f64);
            }
            assert_eq!(calc.sample_size(), capacity.min(n));
        }
    }
}

// ============================================================================
// Range strategies
// ============================================================================

mod strategies {
    use super::*;

    #[test]
    fn outliers_move_std_dev_but_not_percentile_or_iqr() {
        let clean = normal_values(2000, 0.35, 0.1, 4);
        let mut dirty = clean.clone();
        dirty.extend([100.0, 120.0, -90.0, 150.0, 110.0]);

        let shift = |method: RangeMethod| {
            let a = method.compute(&clean);
            let b = method.compute(&dirty);
            (a.min - b.min).abs().max((a.max - b.max).abs())
        };

        assert!(shift(RangeMethod::PERCENTILE_95) < 0.05);
        assert!(shift(RangeMethod::RobustPercentile) < 0.05);
        assert!(shift(RangeMethod::Iqr { multiplier: 1.5 }) < 0.05);

        let std = RangeMethod::StdDev { k: 3.0 };
        let widening = std.compute(&dirty).width() / std.compute(&clean).width();
        assert!(widening > 2.0, "std range only widened {}x", widening);
    }

    #[test]
    fn every_strategy_is_ordered_and_deterministic() {
        let sample = normal_values(3000, -0.2, 0.5, 5);
        for method in all_methods() {
            let range = method.compute(&sample);
            assert!(range.min <= range.max, "{}: {:?}", method.name(), range);
            assert_eq!(range, method.compute(&sample));
        }
    }

    #[test]
    fn named_methods_resolve() {
        let params = MethodParams::default();
        assert_eq!(
            RangeMethod::from_name("percentile_90", &params).unwrap(),
            RangeMethod::PERCENTILE_90
        );
        assert_eq!(
            RangeMethod::from_name("robust_percentile", &params).unwrap(),
            RangeMethod::RobustPercentile
        );
        assert!(matches!(
            RangeMethod::from_name("bogus", &params),
            Err(Error::UnknownMethod { .. })
        ));
    }
}

// ============================================================================
// Weighted aggregation
// ============================================================================

mod aggregation {
    use super::*;

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn size_weighted_mean_between_sources() {
        let mut agg = MultiDatasetAggregator::with_seed(1000, 6);
        for (name, n, mu, seed) in [("a", 500, 0.30, 10), ("b", 300, 0.40, 11), ("c", 400, 0.35, 12)] {
            let values = normal_values(n, mu, 0.02, seed);
            agg.add_dataset(name, [("hip_flexion_angle_ipsi_rad", values)], Some(n as f64))
                .unwrap();
        }

        let merged = mean(&agg.aggregate_feature("hip_flexion_angle_ipsi_rad"));
        assert!(merged > 0.30 && merged < 0.40, "merged mean {}", merged);
        assert_eq!(agg.dataset_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_weights_ignore_dataset_size() {
        let mut agg = MultiDatasetAggregator::with_seed(4000, 7);
        agg.add_dataset("big", [("knee", normal_values(40_000, 0.0, 0.01, 13))], Some(1.0))
            .unwrap();
        agg.add_dataset("small", [("knee", normal_values(4_000, 1.0, 0.01, 14))], Some(1.0))
            .unwrap();

        let share_small = mean(&agg.aggregate_feature("knee"));
        assert!(
            share_small > 0.35 && share_small < 0.65,
            "small dataset share {}",
            share_small
        );
    }

    #[test]
    fn million_values_in_chunks_stay_bounded() {
        let capacity = 1000;
        let mut opt = optimizer(capacity, 8);
        let mut rng = StdRng::seed_from_u64(8);
        let dist = Normal::new(0.5, 0.2).unwrap();

        for _ in 0..100 {
            let chunk: Vec<f64> = (0..10_000).map(|_| dist.sample(&mut rng)).collect();
            opt.add_data_chunk("long_session", [("ankle", chunk)]).unwrap();
            assert!(opt.aggregator().sample_size("ankle") <= capacity);
        }

        let summary = opt.aggregator().feature_summary("ankle").unwrap();
        assert_eq!(summary.count, 1_000_000);
        assert_eq!(summary.sample_size, capacity);

        for method in all_methods() {
            let ranges = opt.optimize_ranges(&method, ["ankle"]).unwrap();
            let range = ranges.get("ankle").unwrap();
            assert!(range.min <= range.max, "{}: {:?}", method.name(), range);
        }
    }

    #[test]
    fn same_seed_same_ingestion_reproduces() {
        let build = |seed| {
            let mut agg = MultiDatasetAggregator::with_seed(200, seed);
            agg.add_dataset("a", [("hip", normal_values(5000, 0.0, 1.0, 1))], Some(2.0))
                .unwrap();
            agg.add_dataset("b", [("hip", normal_values(3000, 1.0, 1.0, 2))], Some(1.0))
                .unwrap();
            agg.aggregate_feature("hip")
        };

        assert_eq!(build(99), build(99));
        assert_ne!(build(99), build(100));
    }
}

// ============================================================================
// Optimizer
// ============================================================================

mod optimization {
    use super::*;

    fn loaded_optimizer() -> RangeOptimizer {
        let mut opt = optimizer(5000, 21);
        opt.add_dataset(
            "subject_01",
            [
                ("knee_flexion_angle_ipsi_rad", normal_values(8000, 0.6, 0.15, 31)),
                ("hip_flexion_angle_ipsi_rad", normal_values(8000, 0.2, 0.25, 32)),
            ],
            None,
        )
        .unwrap();
        opt.add_dataset(
            "subject_02",
            [("knee_flexion_angle_ipsi_rad", normal_values(6000, 0.65, 0.15, 33))],
            None,
        )
        .unwrap();
        opt
    }

    #[test]
    fn fp_search_hits_target() {
        let opt = loaded_optimizer();
        let features = ["knee_flexion_angle_ipsi_rad", "hip_flexion_angle_ipsi_rad"];
        let result = opt.optimize_for_fp_rate(features, 0.05, 0.01, 50).unwrap();

        assert!(result.converged());
        let rates = opt.calculate_false_positive_rates(&result.ranges);
        for feature in features {
            let rate = rates[feature];
            assert!((0.04..=0.06).contains(&rate), "{}: rate {}", feature, rate);
            assert_eq!(result.outcome(feature).unwrap().achieved_fp_rate, rate);
        }
    }

    #[test]
    fn fp_search_on_std_multiplier() {
        let opt = loaded_optimizer();
        let result = opt
            .optimize_for_fp_rate_with(
                TunedParameter::StdDevMultiplier,
                ["hip_flexion_angle_ipsi_rad"],
                0.05,
                0.01,
                60,
            )
            .unwrap();

        let outcome = result.outcome("hip_flexion_angle_ipsi_rad").unwrap();
        assert!(outcome.converged);
        // close to the normal 97.5% quantile
        assert!((outcome.parameter - 1.96).abs() < 0.3, "k = {}", outcome.parameter);
    }

    #[test]
    fn fp_search_gives_up_gracefully() {
        let mut opt = optimizer(100, 3);
        opt.add_dataset("flat", [("pelvis", vec![0.1; 500])], None)
            .unwrap();

        let result = opt.optimize_for_fp_rate(["pelvis"], 0.2, 0.0, 5).unwrap();
        let outcome = result.outcome("pelvis").unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 5);
        assert!(outcome.range.min <= outcome.range.max);
    }

    #[test]
    fn full_observed_span_has_zero_rate() {
        let opt = loaded_optimizer();
        let feature = "knee_flexion_angle_ipsi_rad";
        let sample = opt.aggregator().aggregate_feature(feature);
        let lo = sample.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut spec = RangeSpec::new();
        spec.insert(feature, Range::new(lo, hi));
        assert_eq!(opt.calculate_false_positive_rates(&spec)[feature], 0.0);
    }

    #[test]
    fn optimize_ranges_is_idempotent() {
        let opt = loaded_optimizer();
        let features = ["knee_flexion_angle_ipsi_rad", "hip_flexion_angle_ipsi_rad", "absent"];
        for method in all_methods() {
            let first = opt.optimize_ranges(&method, features).unwrap();
            let second = opt.optimize_ranges(&method, features).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.get("absent"), Some(&Range::EMPTY));
            assert_eq!(first.len(), 3);
        }
    }

    #[test]
    fn invalid_weight_rejected_before_ingestion() {
        let mut opt = optimizer(100, 1);
        let err = opt
            .add_dataset("bad", [("knee", vec![0.1, 0.2])], Some(-1.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWeight { .. }));
        assert!(opt.aggregator().aggregate_feature("knee").is_empty());
        assert!(opt.aggregator().dataset_names().is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn result_serializes() {
        let opt = loaded_optimizer();
        let result = opt
            .optimize_for_fp_rate(["knee_flexion_angle_ipsi_rad"], 0.05, 0.01, 50)
            .unwrap();

        let json = serde_json::to_string(&result.ranges).unwrap();
        let back: RangeSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result.ranges);
    }
}

// ============================================================================
// Properties
// ============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn finite_vec(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(-1e6_f64..1e6, min_len..=max_len)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn reservoir_never_exceeds_capacity(
            capacity in 1_usize..64,
            n in 0_usize..500,
            seed in any::<u64>(),
        ) {
            let mut calc = StreamingStatsCalculator::with_seed(capacity, seed);
            for i in 0..n {
                calc.add_value(i as f64);
            }
            prop_assert_eq!(calc.sample_size(), capacity.min(n));
        }

        #[test]
        fn welford_matches_batch(data in finite_vec(1, 200)) {
            let mut calc = StreamingStatsCalculator::with_seed(16, 0);
            for &v in &data {
                calc.add_value(v);
            }
            let n = data.len() as f64;
            let mean = data.iter().sum::<f64>() / n;
            let var = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

            prop_assert!(calc.variance() >= 0.0);
            prop_assert!((calc.mean() - mean).abs() <= 1e-6 * mean.abs().max(1.0));
            prop_assert!((calc.variance() - var).abs() <= 1e-6 * var.max(1.0));
        }

        #[test]
        fn ranges_are_ordered(data in finite_vec(1, 200)) {
            for method in all_methods() {
                let range = method.compute(&data);
                prop_assert!(range.min <= range.max, "{:?} -> {:?}", method, range);
            }
        }
    }
}
