//! Range optimization over pooled samples
//!
//! [`RangeOptimizer`] is the entry point: ingest datasets or chunks, then ask
//! for ranges from a fixed [`RangeMethod`](crate::RangeMethod) or tuned toward
//! a target false-positive rate.

mod config;
mod range_optimizer;
mod search;

pub use config::OptimizerConfig;
pub use range_optimizer::RangeOptimizer;
pub use search::{
    FalsePositiveReport, FeatureOutcome, OptimizationResult, TunedParameter, MAX_STD_MULTIPLIER,
};
