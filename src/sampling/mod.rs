//! Stream sampling algorithms
//!
//! Bounded-memory samples of unbounded streams: a uniform reservoir for a
//! single metric and a weighted reservoir for pooling many sources.
//!
//! # Example
//!
//! ```
//! use flowranges::sampling::ReservoirSampler;
//!
//! let mut sampler = ReservoirSampler::<f64>::new(10);
//! for i in 0..1_000_000 {
//!     sampler.add(i as f64);
//! }
//! assert_eq!(sampler.len(), 10);
//! ```

mod reservoir;
mod weighted;

pub use reservoir::{ReservoirSampler, DEFAULT_SEED};
pub use weighted::WeightedReservoir;
