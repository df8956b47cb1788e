//! Range-defining strategies
//!
//! Each strategy maps a sample to a `(min, max)` pair. They are pure: no state,
//! no randomness, so the same sample always gives the same range.

use crate::error::{Error, Result};
use crate::quantiles::{percentile_sorted, sorted_copy};
use crate::ranges::Range;
use crate::statistics::RunningStats;

/// Names accepted by [`RangeMethod::from_name`]
pub const METHOD_NAMES: &[&str] = &[
    "percentile",
    "percentile_95",
    "percentile_90",
    "robust_percentile",
    "std_dev",
    "mean_3std",
    "iqr",
    "iqr_expansion",
    "conservative",
];

/// Closed set of range-definition strategies
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "method", rename_all = "snake_case"))]
pub enum RangeMethod {
    /// `(percentile(lower), percentile(upper))`, bounds in 0..=100
    Percentile { lower: f64, upper: f64 },
    /// `mean ± k·std`
    StdDev { k: f64 },
    /// `[Q1 − m·IQR, Q3 + m·IQR]`
    Iqr { multiplier: f64 },
    /// Percentile window 10..90
    RobustPercentile,
    /// Observed `[min, max]` padded by `buffer` times its width on each side
    Conservative { buffer: f64 },
}

/// Optional overrides for the parameters of a named method
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodParams {
    pub lower_percentile: Option<f64>,
    pub upper_percentile: Option<f64>,
    pub std_multiplier: Option<f64>,
    pub iqr_multiplier: Option<f64>,
    pub buffer_fraction: Option<f64>,
}

impl RangeMethod {
    /// 95% coverage window (2.5 .. 97.5)
    pub const PERCENTILE_95: RangeMethod = RangeMethod::Percentile {
        lower: 2.5,
        upper: 97.5,
    };

    /// 90% coverage window (5 .. 95)
    pub const PERCENTILE_90: RangeMethod = RangeMethod::Percentile {
        lower: 5.0,
        upper: 95.0,
    };

    /// Build a method from its configuration name.
    ///
    /// Unknown names fail with [`Error::UnknownMethod`]; parameters are
    /// validated before returning.
    pub fn from_name(name: &str, params: &MethodParams) -> Result<Self> {
        let method = match name {
            "percentile" => RangeMethod::Percentile {
                lower: params.lower_percentile.unwrap_or(2.5),
                upper: params.upper_percentile.unwrap_or(97.5),
            },
            "percentile_95" => Self::PERCENTILE_95,
            "percentile_90" => Self::PERCENTILE_90,
            "robust_percentile" => RangeMethod::RobustPercentile,
            "std_dev" | "mean_3std" => RangeMethod::StdDev {
                k: params.std_multiplier.unwrap_or(3.0),
            },
            "iqr" | "iqr_expansion" => RangeMethod::Iqr {
                multiplier: params.iqr_multiplier.unwrap_or(1.5),
            },
            "conservative" => RangeMethod::Conservative {
                buffer: params.buffer_fraction.unwrap_or(0.1),
            },
            _ => {
                return Err(Error::UnknownMethod {
                    name: name.to_string(),
                    valid: METHOD_NAMES.to_vec(),
                })
            }
        };
        method.validate()?;
        Ok(method)
    }

    /// Canonical configuration name
    pub fn name(&self) -> &'static str {
        match self {
            RangeMethod::Percentile { .. } => "percentile",
            RangeMethod::StdDev { .. } => "std_dev",
            RangeMethod::Iqr { .. } => "iqr",
            RangeMethod::RobustPercentile => "robust_percentile",
            RangeMethod::Conservative { .. } => "conservative",
        }
    }

    /// Reject parameters outside their domain
    pub fn validate(&self) -> Result<()> {
        match *self {
            RangeMethod::Percentile { lower, upper } => {
                if !(0.0..=100.0).contains(&lower) {
                    return Err(Error::invalid_parameter("lower", lower, "must be within 0..=100"));
                }
                if !(0.0..=100.0).contains(&upper) {
                    return Err(Error::invalid_parameter("upper", upper, "must be within 0..=100"));
                }
                if lower > upper {
                    return Err(Error::invalid_parameter("lower", lower, "must not exceed upper"));
                }
                Ok(())
            }
            RangeMethod::StdDev { k } => non_negative("k", k),
            RangeMethod::Iqr { multiplier } => non_negative("multiplier", multiplier),
            RangeMethod::Conservative { buffer } => non_negative("buffer", buffer),
            RangeMethod::RobustPercentile => Ok(()),
        }
    }

    /// Range for `sample`; [`Range::EMPTY`] when the sample is empty
    pub fn compute(&self, sample: &[f64]) -> Range {
        if sample.is_empty() {
            return Range::EMPTY;
        }
        match *self {
            RangeMethod::StdDev { k } => {
                let mut stats = RunningStats::new();
                for &v in sample {
                    stats.add(v);
                }
                let spread = k * stats.std_dev();
                Range::new(stats.mean() - spread, stats.mean() + spread)
            }
            RangeMethod::Conservative { buffer } => {
                let (lo, hi) = sample
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                let pad = buffer * (hi - lo);
                Range::new(lo - pad, hi + pad)
            }
            _ => self.compute_sorted(&sorted_copy(sample)),
        }
    }

    /// Same as [`compute`](Self::compute) for an ascending sample
    pub fn compute_sorted(&self, sorted: &[f64]) -> Range {
        let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
            return Range::EMPTY;
        };
        let at = |p: f64| percentile_sorted(sorted, p).unwrap_or(0.0);

        match *self {
            RangeMethod::Percentile { lower, upper } => Range::new(at(lower), at(upper)),
            RangeMethod::RobustPercentile => Range::new(at(10.0), at(90.0)),
            RangeMethod::Iqr { multiplier } => {
                let q1 = at(25.0);
                let q3 = at(75.0);
                let iqr = q3 - q1;
                Range::new(q1 - multiplier * iqr, q3 + multiplier * iqr)
            }
            RangeMethod::Conservative { buffer } => {
                let pad = buffer * (last - first);
                Range::new(first - pad, last + pad)
            }
            RangeMethod::StdDev { .. } => self.compute(sorted),
        }
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_parameter(name, value, "must be finite and non-negative"))
    }
}
