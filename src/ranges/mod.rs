//! Validation ranges and the strategies that derive them
//!
//! # Example
//!
//! ```
//! use flowranges::ranges::{Range, RangeMethod};
//!
//! let sample: Vec<f64> = (0..=100).map(|i| i as f64).collect();
//! let range = RangeMethod::PERCENTILE_90.compute(&sample);
//! assert_eq!(range, Range::new(5.0, 95.0));
//! ```

mod method;
mod spec;

pub use method::{MethodParams, RangeMethod, METHOD_NAMES};
pub use spec::{Range, RangeSpec};
