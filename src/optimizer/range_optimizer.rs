//! Range optimizer façade
//!
//! Owns one [`MultiDatasetAggregator`] and turns its per-feature samples into
//! validation ranges, either from a fixed strategy or tuned toward a target
//! false-positive rate.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::aggregate::{IngestSummary, MultiDatasetAggregator};
use crate::error::{Error, Result};
use crate::optimizer::search::{bisect, FalsePositiveReport, OptimizationResult, TunedParameter};
use crate::optimizer::OptimizerConfig;
use crate::quantiles::sorted_copy;
use crate::ranges::{MethodParams, RangeMethod, RangeSpec};

/// Produces validation ranges from streamed, weighted datasets
///
/// Ingestion (`add_dataset`, `add_data_chunk`) may be repeated any number of
/// times; queries never mutate state, so calling them twice without new data
/// gives identical results.
///
/// # Example
///
/// ```
/// use flowranges::{OptimizerConfig, RangeMethod, RangeOptimizer};
///
/// let mut optimizer = RangeOptimizer::new(OptimizerConfig::default().with_seed(1))?;
/// let hip: Vec<f64> = (0..1000).map(|i| (i as f64 / 1000.0) - 0.5).collect();
/// optimizer.add_dataset("subject_01", [("hip_flexion_angle_ipsi_rad", &hip)], None)?;
///
/// let ranges = optimizer.optimize_ranges(&RangeMethod::PERCENTILE_95, ["hip_flexion_angle_ipsi_rad"])?;
/// let hip_range = ranges.get("hip_flexion_angle_ipsi_rad").unwrap();
/// assert!(hip_range.min < hip_range.max);
///
/// let rates = optimizer.calculate_false_positive_rates(&ranges);
/// assert!(rates["hip_flexion_angle_ipsi_rad"] <= 0.05 + 1e-9);
/// # Ok::<(), flowranges::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct RangeOptimizer {
    config: OptimizerConfig,
    aggregator: MultiDatasetAggregator,
}

impl Default for RangeOptimizer {
    fn default() -> Self {
        let config = OptimizerConfig::default();
        Self {
            aggregator: MultiDatasetAggregator::with_seed(config.capacity, config.seed),
            config,
        }
    }
}

impl RangeOptimizer {
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            aggregator: MultiDatasetAggregator::with_seed(config.capacity, config.seed),
            config,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Read access to the pooled samples and dataset registry
    pub fn aggregator(&self) -> &MultiDatasetAggregator {
        &self.aggregator
    }

    /// Ingest a whole dataset. `weight = None` weighs every value `1.0`.
    pub fn add_dataset<I, K, V>(
        &mut self,
        name: &str,
        features: I,
        weight: Option<f64>,
    ) -> Result<IngestSummary>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[f64]>,
    {
        self.aggregator.add_dataset(name, features, weight)
    }

    /// Ingest one piece of a larger source; chunks of the same source are
    /// weighted per value, so splitting a source does not change its influence.
    pub fn add_data_chunk<I, K, V>(&mut self, name: &str, features: I) -> Result<IngestSummary>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[f64]>,
    {
        self.aggregator.add_dataset(name, features, None)
    }

    /// Apply `method` to each feature's retained sample.
    ///
    /// Features without data get the `(0.0, 0.0)` sentinel.
    pub fn optimize_ranges<I, S>(&self, method: &RangeMethod, features: I) -> Result<RangeSpec>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        method.validate()?;

        let mut spec = RangeSpec::new();
        for feature in features {
            let feature = feature.as_ref();
            let sample = self.aggregator.aggregate_feature(feature);
            if sample.is_empty() {
                warn!(feature, method = method.name(), "no data for feature, using sentinel range");
            }
            spec.insert(feature, method.compute(&sample));
        }

        debug!(method = method.name(), features = spec.len(), "computed ranges");
        Ok(spec)
    }

    /// [`optimize_ranges`](Self::optimize_ranges) with the method given by name
    pub fn optimize_ranges_by_name<I, S>(
        &self,
        method: &str,
        features: I,
        params: &MethodParams,
    ) -> Result<RangeSpec>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let method = RangeMethod::from_name(method, params)?;
        self.optimize_ranges(&method, features)
    }

    /// Fraction of each feature's retained sample outside its range
    pub fn calculate_false_positive_rates(&self, ranges: &RangeSpec) -> BTreeMap<String, f64> {
        self.false_positive_report(ranges)
            .into_iter()
            .map(|(feature, report)| (feature, report.rate))
            .collect()
    }

    /// Rates together with violation counts and sample sizes
    pub fn false_positive_report(&self, ranges: &RangeSpec) -> BTreeMap<String, FalsePositiveReport> {
        ranges
            .iter()
            .map(|(feature, range)| {
                let sample = self.aggregator.aggregate_feature(feature);
                (feature.to_string(), FalsePositiveReport::measure(&sample, range))
            })
            .collect()
    }

    /// Tune a percentile window per feature toward `target_fp_rate`
    pub fn optimize_for_fp_rate<I, S>(
        &self,
        features: I,
        target_fp_rate: f64,
        tolerance: f64,
        max_iterations: u32,
    ) -> Result<OptimizationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.optimize_for_fp_rate_with(
            TunedParameter::PercentileWindow,
            features,
            target_fp_rate,
            tolerance,
            max_iterations,
        )
    }

    /// Tune `tuned` per feature toward `target_fp_rate`.
    ///
    /// Non-convergence is not an error: the closest candidate is returned with
    /// `converged = false`. Only out-of-domain arguments fail.
    pub fn optimize_for_fp_rate_with<I, S>(
        &self,
        tuned: TunedParameter,
        features: I,
        target_fp_rate: f64,
        tolerance: f64,
        max_iterations: u32,
    ) -> Result<OptimizationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !(0.0..=1.0).contains(&target_fp_rate) {
            return Err(Error::invalid_parameter(
                "target_fp_rate",
                target_fp_rate,
                "must be within 0..=1",
            ));
        }
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(Error::invalid_parameter(
                "tolerance",
                tolerance,
                "must be finite and non-negative",
            ));
        }
        if max_iterations == 0 {
            return Err(Error::invalid_parameter(
                "max_iterations",
                0.0,
                "must be positive",
            ));
        }

        let mut ranges = RangeSpec::new();
        let mut outcomes = BTreeMap::new();
        for feature in features {
            let feature = feature.as_ref();
            let sorted = sorted_copy(&self.aggregator.aggregate_feature(feature));
            let outcome = bisect(
                feature,
                tuned,
                &sorted,
                target_fp_rate,
                tolerance,
                max_iterations,
            );
            ranges.insert(feature, outcome.range);
            outcomes.insert(feature.to_string(), outcome);
        }

        let result = OptimizationResult {
            ranges,
            outcomes,
            tuned,
            target_fp_rate,
            tolerance,
        };
        debug!(
            features = result.outcomes.len(),
            converged = result.converged(),
            target_fp_rate,
            "fp-rate optimization finished"
        );
        Ok(result)
    }

    /// Fold a per-worker optimizer into this one
    ///
    /// Workers must be configured with distinct seeds.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        self.aggregator.merge(&other.aggregator)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::Range;

    fn optimizer(capacity: usize) -> RangeOptimizer {
        seeded(capacity, 17)
    }

    fn seeded(capacity: usize, seed: u64) -> RangeOptimizer {
        RangeOptimizer::new(OptimizerConfig::default().with_capacity(capacity).with_seed(seed)).unwrap()
    }

    fn wave(n: usize, offset: f64) -> Vec<f64> {
        (0..n)
            .map(|i| offset + 0.2 * ((i as f64) * 0.0137).sin())
            .collect()
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = RangeOptimizer::new(OptimizerConfig::default().with_capacity(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "capacity", .. }));
    }

    #[test]
    fn test_unknown_method_is_configuration_error() {
        let opt = optimizer(100);
        let err = opt
            .optimize_ranges_by_name("zscore", ["hip"], &MethodParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownMethod { .. }));
    }

    #[test]
    fn test_missing_feature_gets_sentinel_and_vacuous_rate() {
        let mut opt = optimizer(100);
        opt.add_dataset("a", [("hip", wave(200, 0.0))], None).unwrap();

        let ranges = opt
            .optimize_ranges(&RangeMethod::Iqr { multiplier: 1.5 }, ["hip", "ankle"])
            .unwrap();
        assert_eq!(ranges.get("ankle"), Some(&Range::EMPTY));

        let report = opt.false_positive_report(&ranges);
        assert_eq!(report["ankle"].rate, 0.0);
        assert_eq!(report["ankle"].sample_size, 0);
        assert_eq!(report["hip"].sample_size, 100);
    }

    #[test]
    fn test_full_span_has_zero_rate() {
        let mut opt = optimizer(500);
        opt.add_dataset("a", [("knee", wave(3000, 0.6))], None).unwrap();

        let ranges = opt
            .optimize_ranges(&RangeMethod::Conservative { buffer: 0.0 }, ["knee"])
            .unwrap();
        assert_eq!(opt.calculate_false_positive_rates(&ranges)["knee"], 0.0);
    }

    #[test]
    fn test_queries_are_idempotent() {
        let mut opt = optimizer(300);
        opt.add_data_chunk("s", [("knee", wave(1000, 0.6))]).unwrap();
        opt.add_data_chunk("s", [("knee", wave(1000, 0.7))]).unwrap();

        let first = opt.optimize_ranges(&RangeMethod::PERCENTILE_90, ["knee"]).unwrap();
        let second = opt.optimize_ranges(&RangeMethod::PERCENTILE_90, ["knee"]).unwrap();
        assert_eq!(first, second);

        let a = opt.optimize_for_fp_rate(["knee"], 0.05, 0.01, 30).unwrap();
        let b = opt.optimize_for_fp_rate(["knee"], 0.05, 0.01, 30).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fp_search_argument_validation() {
        let opt = optimizer(10);
        assert!(opt.optimize_for_fp_rate(["x"], 1.5, 0.01, 10).is_err());
        assert!(opt.optimize_for_fp_rate(["x"], 0.05, -0.1, 10).is_err());
        assert!(opt.optimize_for_fp_rate(["x"], 0.05, 0.01, 0).is_err());
    }

    #[test]
    fn test_fp_search_without_data_is_not_converged() {
        let opt = optimizer(10);
        let result = opt.optimize_for_fp_rate(["x"], 0.05, 0.01, 10).unwrap();

        assert!(!result.converged());
        assert_eq!(result.unconverged().collect::<Vec<_>>(), vec!["x"]);
        assert_eq!(result.ranges.get("x"), Some(&Range::EMPTY));
    }

    #[test]
    fn test_merge_workers() {
        let mut a = seeded(200, 1);
        let mut b = seeded(200, 2);
        a.add_dataset("left", [("hip", wave(1000, 0.0))], None).unwrap();
        b.add_dataset("right", [("hip", wave(1000, 1.0))], None).unwrap();

        a.merge(&b).unwrap();
        assert_eq!(a.aggregator().sample_size("hip"), 200);
        assert_eq!(a.aggregator().dataset_names(), vec!["left", "right"]);

        let c = seeded(100, 3);
        assert!(matches!(a.merge(&c), Err(Error::Merge(_))));
    }

    #[test]
    fn test_merge_workers_with_default_seed_rejected() {
        let mut a = RangeOptimizer::default();
        let mut b = RangeOptimizer::default();
        a.add_dataset("left", [("hip", wave(100, 0.0))], None).unwrap();
        b.add_dataset("right", [("hip", wave(100, 1.0))], None).unwrap();

        assert!(matches!(a.merge(&b), Err(Error::Merge(_))));
        assert_eq!(a.aggregator().dataset_names(), vec!["left"]);
    }
}
