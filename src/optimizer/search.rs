//! Bounded bisection toward a target false-positive rate
//!
//! The false-positive rate of a range is the fraction of retained sample
//! values falling outside it. Both tunable parameters move that rate
//! monotonically, so a bisection over the parameter's bracket closes in on the
//! target; the iteration cap guarantees termination.

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::quantiles::percentile_sorted;
use crate::ranges::{Range, RangeSpec};
use crate::statistics::RunningStats;

/// Upper end of the `k` bracket for [`TunedParameter::StdDevMultiplier`]
pub const MAX_STD_MULTIPLIER: f64 = 10.0;

/// The parameter adjusted while searching for a target rate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TunedParameter {
    /// Tail mass `alpha` in `[0, 1]`; range is
    /// `percentile(100·alpha/2) .. percentile(100·(1 − alpha/2))`
    #[default]
    PercentileWindow,
    /// `k` in `[0, MAX_STD_MULTIPLIER]`; range is `mean ± k·std`
    StdDevMultiplier,
}

/// Sample-based false-positive rate with the sample size it was measured on
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FalsePositiveReport {
    /// `violations / sample_size`, `0.0` when there is no data
    pub rate: f64,
    pub violations: usize,
    pub sample_size: usize,
}

impl FalsePositiveReport {
    pub fn measure(sample: &[f64], range: &Range) -> Self {
        let violations = sample.iter().filter(|&&v| !range.contains(v)).count();
        Self {
            rate: rate(violations, sample.len()),
            violations,
            sample_size: sample.len(),
        }
    }

    /// `true` when the rate was computed on an empty sample
    pub fn is_vacuous(&self) -> bool {
        self.sample_size == 0
    }
}

fn rate(violations: usize, size: usize) -> f64 {
    if size == 0 {
        0.0
    } else {
        violations as f64 / size as f64
    }
}

/// Violations of `range` in an ascending sample, in `O(log n)`
fn violations_sorted(sorted: &[f64], range: &Range) -> usize {
    let below = sorted.partition_point(|&v| v < range.min);
    let at_or_below_max = sorted.partition_point(|&v| v <= range.max);
    below + (sorted.len() - at_or_below_max.max(below))
}

/// Search result for one feature
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureOutcome {
    pub range: Range,
    pub achieved_fp_rate: f64,
    /// Parameter value that produced `range`
    pub parameter: f64,
    pub iterations: u32,
    pub converged: bool,
    pub sample_size: usize,
}

/// Ranges tuned toward a target false-positive rate
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationResult {
    pub ranges: RangeSpec,
    pub outcomes: BTreeMap<String, FeatureOutcome>,
    pub tuned: TunedParameter,
    pub target_fp_rate: f64,
    pub tolerance: f64,
}

impl OptimizationResult {
    /// Whether every feature reached the target within tolerance
    pub fn converged(&self) -> bool {
        self.outcomes.values().all(|o| o.converged)
    }

    pub fn outcome(&self, feature: &str) -> Option<&FeatureOutcome> {
        self.outcomes.get(feature)
    }

    /// Features that exhausted the iteration budget or had no data
    pub fn unconverged(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| !o.converged)
            .map(|(k, _)| k.as_str())
    }
}

impl TunedParameter {
    fn bracket(&self) -> (f64, f64) {
        match self {
            TunedParameter::PercentileWindow => (0.0, 1.0),
            TunedParameter::StdDevMultiplier => (0.0, MAX_STD_MULTIPLIER),
        }
    }

    /// Whether the false-positive rate grows with the parameter
    fn rate_increasing(&self) -> bool {
        matches!(self, TunedParameter::PercentileWindow)
    }

    fn initial_guess(&self, target: f64) -> f64 {
        match self {
            // tail mass of the window equals its in-sample rejection rate
            TunedParameter::PercentileWindow => target,
            TunedParameter::StdDevMultiplier => 2.0,
        }
    }
}

/// Candidate generator for one feature's sorted sample
struct Candidates<'a> {
    tuned: TunedParameter,
    sorted: &'a [f64],
    mean: f64,
    std_dev: f64,
}

impl<'a> Candidates<'a> {
    fn new(tuned: TunedParameter, sorted: &'a [f64]) -> Self {
        let mut stats = RunningStats::new();
        if tuned == TunedParameter::StdDevMultiplier {
            for &v in sorted {
                stats.add(v);
            }
        }
        Self {
            tuned,
            sorted,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }

    fn range(&self, param: f64) -> Range {
        match self.tuned {
            TunedParameter::PercentileWindow => {
                let half = 50.0 * param;
                let at = |p: f64| percentile_sorted(self.sorted, p).unwrap_or(0.0);
                Range::new(at(half), at(100.0 - half))
            }
            TunedParameter::StdDevMultiplier => {
                let spread = param * self.std_dev;
                Range::new(self.mean - spread, self.mean + spread)
            }
        }
    }
}

/// Bisect `tuned` over its bracket until the in-sample rate is within
/// `tolerance` of `target` or `max_iterations` evaluations have been spent.
///
/// `sorted` must be ascending. On exhaustion the closest candidate seen is
/// returned with `converged = false`.
pub(crate) fn bisect(
    feature: &str,
    tuned: TunedParameter,
    sorted: &[f64],
    target: f64,
    tolerance: f64,
    max_iterations: u32,
) -> FeatureOutcome {
    if sorted.is_empty() {
        warn!(feature, "no data for feature, returning empty range");
        return FeatureOutcome {
            range: Range::EMPTY,
            achieved_fp_rate: 0.0,
            parameter: 0.0,
            iterations: 0,
            converged: false,
            sample_size: 0,
        };
    }

    let candidates = Candidates::new(tuned, sorted);
    let (mut lo, mut hi) = tuned.bracket();
    let mut param = tuned.initial_guess(target).clamp(lo, hi);
    let mut best: Option<(f64, FeatureOutcome)> = None;

    for iteration in 1..=max_iterations {
        let range = candidates.range(param);
        let achieved = rate(violations_sorted(sorted, &range), sorted.len());
        let error = (achieved - target).abs();
        let converged = error <= tolerance;

        trace!(feature, iteration, param, achieved, "fp search step");

        if best.as_ref().map_or(true, |(e, _)| error < *e) || converged {
            best = Some((
                error,
                FeatureOutcome {
                    range,
                    achieved_fp_rate: achieved,
                    parameter: param,
                    iterations: iteration,
                    converged,
                    sample_size: sorted.len(),
                },
            ));
        }
        if converged {
            break;
        }

        let too_many_rejections = achieved > target;
        if too_many_rejections == tuned.rate_increasing() {
            hi = param;
        } else {
            lo = param;
        }
        param = 0.5 * (lo + hi);
    }

    let mut outcome = match best {
        Some((_, outcome)) => outcome,
        None => FeatureOutcome {
            range: candidates.range(param),
            achieved_fp_rate: 0.0,
            parameter: param,
            iterations: 0,
            converged: false,
            sample_size: sorted.len(),
        },
    };
    if !outcome.converged {
        outcome.iterations = max_iterations;
        warn!(
            feature,
            target,
            achieved = outcome.achieved_fp_rate,
            max_iterations,
            "fp search did not converge, returning best candidate"
        );
    }
    outcome
}
