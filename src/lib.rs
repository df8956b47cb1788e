//! # Flowranges
//!
//! Streaming statistics and validation-range optimization.
//!
//! Flowranges derives acceptable `[min, max]` ranges per measurement channel
//! from arbitrarily large collections of time-series recordings, so new
//! recordings can be flagged as plausible or anomalous. Memory per feature is
//! bounded by a fixed reservoir capacity no matter how much data is ingested.
//!
//! ## Building blocks
//!
//! - [`statistics`]: Welford running moments and a per-metric streaming calculator
//! - [`sampling`]: uniform (Algorithm R) and weighted (A-Res) reservoirs
//! - [`quantiles`]: interpolated percentiles over retained samples
//! - [`ranges`]: the closed set of range strategies and the [`RangeSpec`] artifact
//! - [`aggregate`]: weighted pooling of many datasets into one sample per feature
//! - [`optimizer`]: the [`RangeOptimizer`] façade and false-positive-rate search
//!
//! ## Quick Start
//!
//! ```rust
//! use flowranges::prelude::*;
//!
//! let mut optimizer = RangeOptimizer::new(OptimizerConfig::default().with_seed(7))?;
//!
//! let knee: Vec<f64> = (0..5000).map(|i| 0.6 + 0.3 * (i as f64 * 0.01).sin()).collect();
//! optimizer.add_dataset("treadmill_walk", [("knee_flexion_angle_ipsi_rad", &knee)], None)?;
//!
//! let result = optimizer.optimize_for_fp_rate(["knee_flexion_angle_ipsi_rad"], 0.05, 0.01, 50)?;
//! assert!(result.converged());
//!
//! let range = result.ranges.get("knee_flexion_angle_ipsi_rad").unwrap();
//! assert!(range.min < range.max);
//! # Ok::<(), flowranges::Error>(())
//! ```
//!
//! ## Reproducibility
//!
//! All randomness comes from seeds held by each instance. Given the same seed
//! and the same sequence of ingestion calls, every sample, range and rate is
//! reproduced exactly.
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for configuration, ranges and results

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod aggregate;
pub mod error;
pub mod optimizer;
pub mod quantiles;
pub mod ranges;
pub mod sampling;
pub mod statistics;
pub mod traits;

pub mod prelude {
    pub use crate::aggregate::MultiDatasetAggregator;
    pub use crate::error::{Error, Result};
    pub use crate::optimizer::{OptimizationResult, OptimizerConfig, RangeOptimizer, TunedParameter};
    pub use crate::ranges::{MethodParams, Range, RangeMethod, RangeSpec};
    pub use crate::statistics::StreamingStatsCalculator;
    pub use crate::traits::*;
}

pub use error::{Error, Result};
pub use optimizer::{OptimizerConfig, RangeOptimizer};
pub use ranges::{Range, RangeMethod, RangeSpec};
pub use statistics::StreamingStatsCalculator;
