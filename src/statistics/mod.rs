//! Single-pass statistics for streaming metrics
//!
//! # Example
//!
//! ```
//! use flowranges::statistics::RunningStats;
//!
//! let mut stats = RunningStats::new();
//! for value in [0.31, 0.29, 0.35, 0.40] {
//!     stats.add(value);
//! }
//! println!("mean {} std {}", stats.mean(), stats.std_dev());
//! ```

mod calculator;
mod moments;

pub use calculator::{StreamingStatsCalculator, DEFAULT_CAPACITY};
pub use moments::RunningStats;
