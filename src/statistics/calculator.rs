//! Per-metric streaming calculator
//!
//! Pairs exact running moments with a bounded uniform reservoir, so one
//! metric can be fed an arbitrarily long stream while memory stays
//! `O(capacity)` and percentiles remain answerable.

use rand::rngs::StdRng;

use crate::quantiles::percentile;
use crate::sampling::{ReservoirSampler, DEFAULT_SEED};
use crate::statistics::RunningStats;
use crate::traits::{MergeError, SamplingSketch, Sketch};

/// Default reservoir size for a single metric
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Online mean / standard deviation / approximate percentiles for one metric
///
/// # Example
///
/// ```
/// use flowranges::statistics::StreamingStatsCalculator;
///
/// let mut calc = StreamingStatsCalculator::with_seed(1000, 42);
/// for i in 0..50_000 {
///     calc.add_value((i % 100) as f64);
/// }
///
/// assert!((calc.mean() - 49.5).abs() < 1e-9);
/// let median = calc.percentile(50.0).unwrap();
/// assert!((median - 49.5).abs() < 5.0);
/// ```
#[derive(Clone, Debug)]
pub struct StreamingStatsCalculator {
    moments: RunningStats,
    reservoir: ReservoirSampler<f64>,
}

impl Default for StreamingStatsCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StreamingStatsCalculator {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_seed(capacity, DEFAULT_SEED)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self {
            moments: RunningStats::new(),
            reservoir: ReservoirSampler::with_seed(capacity, seed),
        }
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_rng(capacity: usize, rng: StdRng) -> Self {
        Self {
            moments: RunningStats::new(),
            reservoir: ReservoirSampler::with_rng(capacity, rng),
        }
    }

    /// Feed one value; non-finite values are ignored
    pub fn add_value(&mut self, value: f64) {
        if self.moments.add(value) {
            self.reservoir.add(value);
        }
    }

    /// Feed a batch; non-finite values are ignored
    pub fn add_values<I: IntoIterator<Item = f64>>(&mut self, values: I) {
        for value in values {
            self.add_value(value);
        }
    }

    /// Exact mean over every accepted value
    pub fn mean(&self) -> f64 {
        self.moments.mean()
    }

    /// Population standard deviation, `sqrt(max(variance, 0))`
    pub fn std_dev(&self) -> f64 {
        self.moments.std_dev()
    }

    /// Exact population variance
    pub fn variance(&self) -> f64 {
        self.moments.variance()
    }

    /// Smallest accepted value, `None` when empty
    pub fn min(&self) -> Option<f64> {
        self.moments.min()
    }

    /// Largest accepted value, `None` when empty
    pub fn max(&self) -> Option<f64> {
        self.moments.max()
    }

    /// Approximate percentile `p` (0..=100) from the reservoir
    pub fn percentile(&self, p: f64) -> Option<f64> {
        percentile(self.reservoir.as_slice(), p)
    }

    /// Exact moments over every accepted value
    pub fn moments(&self) -> &RunningStats {
        &self.moments
    }

    /// Retained sample
    pub fn values(&self) -> &[f64] {
        self.reservoir.as_slice()
    }
}

impl Sketch for StreamingStatsCalculator {
    type Item = f64;

    fn update(&mut self, item: &Self::Item) {
        self.add_value(*item);
    }

    fn merge(&mut self, other: &Self) -> Result<(), MergeError> {
        self.reservoir.merge(&other.reservoir)?;
        self.moments.merge_stats(&other.moments);
        Ok(())
    }

    fn clear(&mut self) {
        self.moments.clear();
        self.reservoir.clear();
    }

    fn size_bytes(&self) -> usize {
        self.moments.size_bytes() + self.reservoir.size_bytes()
    }

    fn count(&self) -> u64 {
        self.moments.len()
    }
}

impl SamplingSketch for StreamingStatsCalculator {
    type Sample = f64;

    fn sample(&self) -> Vec<f64> {
        self.reservoir.as_slice().to_vec()
    }

    fn capacity(&self) -> usize {
        self.reservoir.capacity()
    }

    fn sample_size(&self) -> usize {
        self.reservoir.len()
    }
}
