//! Percentile estimation over retained samples
//!
//! Bounded reservoirs are sorted on query and interpolated linearly between
//! neighbouring order statistics. The estimate converges to the population
//! percentile as the reservoir capacity grows.
//!
//! # Example
//!
//! ```
//! use flowranges::quantiles::percentile;
//!
//! let sample = [1.0, 2.0, 3.0, 4.0, 5.0];
//! assert_eq!(percentile(&sample, 50.0), Some(3.0));
//! assert_eq!(percentile(&sample, 25.0), Some(2.0));
//! assert_eq!(percentile(&[], 50.0), None);
//! ```

mod interpolate;

pub use interpolate::{percentile, percentile_sorted, sorted_copy};
