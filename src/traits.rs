//! Core traits for streaming accumulators
//!
//! Every accumulator in this crate (running moments, reservoirs, the combined
//! per-metric calculator) implements [`Sketch`], so per-worker state can be
//! folded together after independent ingestion.

use core::fmt::Debug;

use thiserror::Error;

/// Error during sketch merge operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Sketches have incompatible configurations
    #[error("incompatible config: expected {expected}, found {found}")]
    IncompatibleConfig { expected: String, found: String },
}

/// Core trait for all streaming accumulators
pub trait Sketch: Clone + Debug {
    /// The type of item this sketch processes
    type Item: ?Sized;

    /// Add an item to the sketch
    fn update(&mut self, item: &Self::Item);

    /// Merge another sketch into this one
    ///
    /// Returns an error if sketches are incompatible
    fn merge(&mut self, other: &Self) -> Result<(), MergeError>;

    /// Reset sketch to empty state
    fn clear(&mut self);

    /// Memory usage in bytes
    fn size_bytes(&self) -> usize;

    /// Number of items processed
    fn count(&self) -> u64;

    /// Check if sketch is empty
    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Sampling sketches that retain a bounded subset of the stream
pub trait SamplingSketch: Sketch {
    /// Element type held in the sample
    type Sample: Clone;

    /// Get current sample
    fn sample(&self) -> Vec<Self::Sample>;

    /// Sample size limit
    fn capacity(&self) -> usize;

    /// Current sample size
    fn sample_size(&self) -> usize;

    /// Whether the sample has reached its capacity
    fn is_full(&self) -> bool {
        self.sample_size() >= self.capacity()
    }
}

pub(crate) fn check_capacity(expected: usize, found: usize) -> Result<(), MergeError> {
    if expected == found {
        Ok(())
    } else {
        Err(MergeError::IncompatibleConfig {
            expected: format!("capacity={}", expected),
            found: format!("capacity={}", found),
        })
    }
}
