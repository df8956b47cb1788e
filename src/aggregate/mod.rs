//! Pooling many weighted recordings into one bounded sample per feature
//!
//! # Example
//!
//! ```
//! use flowranges::aggregate::MultiDatasetAggregator;
//!
//! let mut agg = MultiDatasetAggregator::with_seed(1000, 7);
//! agg.add_dataset("subject_01", [("knee_angle", vec![0.1, 0.2, 0.3])], Some(2.0))?;
//! agg.add_dataset("subject_02", [("knee_angle", vec![0.4, f64::NAN])], None)?;
//!
//! assert_eq!(agg.aggregate_feature("knee_angle").len(), 4);
//! assert!(agg.aggregate_feature("hip_angle").is_empty());
//! # Ok::<(), flowranges::Error>(())
//! ```

mod aggregator;

pub use aggregator::{FeatureSummary, IngestSummary, MultiDatasetAggregator};
