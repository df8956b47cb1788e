//! Uniform reservoir sampling (Algorithm R)
//!
//! Keeps a fixed-size uniform sample from a stream of unknown length. Each of
//! the `n` items seen so far is retained with probability `capacity / n`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::traits::{check_capacity, MergeError, SamplingSketch, Sketch};

/// Seed used when the caller does not supply one
pub const DEFAULT_SEED: u64 = 0x12345678;

/// Reservoir sampler using Algorithm R (Vitter, 1985)
///
/// 1. Fill the reservoir with the first `capacity` items
/// 2. For each subsequent item `i` (1-indexed), draw `j` in `[0, i)`;
///    if `j < capacity`, overwrite slot `j`
///
/// # Example
///
/// ```
/// use flowranges::sampling::ReservoirSampler;
///
/// let mut sampler = ReservoirSampler::<f64>::with_seed(5, 7);
/// for i in 0..100 {
///     sampler.add(i as f64);
/// }
/// assert_eq!(sampler.len(), 5);
/// assert_eq!(sampler.items_seen(), 100);
/// ```
#[derive(Clone, Debug)]
pub struct ReservoirSampler<T: Clone + core::fmt::Debug> {
    capacity: usize,
    reservoir: Vec<T>,
    count: u64,
    rng: StdRng,
}

impl<T: Clone + core::fmt::Debug> ReservoirSampler<T> {
    /// Create a sampler seeded with [`DEFAULT_SEED`]
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_seed(capacity, DEFAULT_SEED)
    }

    /// Create a sampler with an explicit seed
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    /// Create a sampler driven by a caller-provided generator
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "capacity must be positive");

        Self {
            capacity,
            reservoir: Vec::with_capacity(capacity.min(4096)),
            count: 0,
            rng,
        }
    }

    /// Offer an item to the sampler
    pub fn add(&mut self, item: T) {
        self.count += 1;

        if self.reservoir.len() < self.capacity {
            self.reservoir.push(item);
        } else {
            let j = self.rng.random_range(0..self.count);
            if j < self.capacity as u64 {
                self.reservoir[j as usize] = item;
            }
        }
    }

    /// Current sample, in slot order
    pub fn as_slice(&self) -> &[T] {
        &self.reservoir
    }

    pub fn into_sample(self) -> Vec<T> {
        self.reservoir
    }

    pub fn len(&self) -> usize {
        self.reservoir.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservoir.is_empty()
    }

    /// Number of items offered so far
    pub fn items_seen(&self) -> u64 {
        self.count
    }

    /// Probability that any given stream item is currently retained
    pub fn sampling_probability(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.capacity as f64 / self.count as f64).min(1.0)
        }
    }
}

impl<T: Clone + core::fmt::Debug> Sketch for ReservoirSampler<T> {
    type Item = T;

    fn update(&mut self, item: &Self::Item) {
        self.add(item.clone());
    }

    /// Combine two samples into a uniform sample of the concatenated streams
    ///
    /// Each output slot is drawn from `self` with probability proportional to
    /// the number of items `self` has seen, without replacement on either side.
    fn merge(&mut self, other: &Self) -> Result<(), MergeError> {
        check_capacity(self.capacity, other.capacity)?;

        if other.count == 0 {
            return Ok(());
        }
        if self.count == 0 {
            self.reservoir = other.reservoir.clone();
            self.count = other.count;
            return Ok(());
        }

        let total = self.count + other.count;

        if self.reservoir.len() + other.reservoir.len() <= self.capacity {
            self.reservoir.extend(other.reservoir.iter().cloned());
        } else {
            let mut mine = core::mem::take(&mut self.reservoir);
            let mut theirs = other.reservoir.clone();
            mine.shuffle(&mut self.rng);
            theirs.shuffle(&mut self.rng);

            let mut merged = Vec::with_capacity(self.capacity);
            while merged.len() < self.capacity {
                let from_self = self.rng.random_range(0..total) < self.count;
                let next = match (from_self, mine.is_empty(), theirs.is_empty()) {
                    (_, true, true) => break,
                    (true, false, _) | (false, false, true) => mine.pop(),
                    _ => theirs.pop(),
                };
                merged.extend(next);
            }
            self.reservoir = merged;
        }

        self.count = total;
        Ok(())
    }

    fn clear(&mut self) {
        self.reservoir.clear();
        self.count = 0;
    }

    fn size_bytes(&self) -> usize {
        self.reservoir.capacity() * core::mem::size_of::<T>() + core::mem::size_of::<Self>()
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl<T: Clone + core::fmt::Debug> SamplingSketch for ReservoirSampler<T> {
    type Sample = T;

    fn sample(&self) -> Vec<T> {
        self.reservoir.clone()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn sample_size(&self) -> usize {
        self.reservoir.len()
    }
}
