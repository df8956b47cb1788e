//! Weighted reservoir sampling (A-Res, Efraimidis & Spirakis 2006)
//!
//! Every offered value gets a key `u^(1/w)` with `u ~ Uniform(0, 1)`; the
//! reservoir keeps the `capacity` values with the largest keys. The probability
//! that a value survives is then proportional to its weight, which is what lets
//! several differently-sized recordings share one bounded sample per feature in
//! proportion to the weights assigned to them.
//!
//! Keys are stored as `ln(u) / w` (same ordering, no underflow for tiny weights).

use core::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sampling::reservoir::DEFAULT_SEED;
use crate::traits::{check_capacity, MergeError, SamplingSketch, Sketch};

#[derive(Clone, Copy, Debug)]
struct Keyed {
    log_key: f64,
    value: f64,
}

impl PartialEq for Keyed {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Keyed {}

impl PartialOrd for Keyed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Keyed {
    fn cmp(&self, other: &Self) -> Ordering {
        self.log_key
            .total_cmp(&other.log_key)
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

/// Bounded weighted sample of `f64` values
///
/// # Example
///
/// ```
/// use flowranges::sampling::WeightedReservoir;
///
/// let mut reservoir = WeightedReservoir::with_seed(100, 3);
/// for i in 0..10_000 {
///     reservoir.add(i as f64, 1.0);
/// }
/// assert_eq!(reservoir.len(), 100);
/// ```
#[derive(Clone, Debug)]
pub struct WeightedReservoir {
    capacity: usize,
    /// Min-heap on key: the root is the next value to evict
    heap: BinaryHeap<Reverse<Keyed>>,
    count: u64,
    total_weight: f64,
    rng: StdRng,
}

impl WeightedReservoir {
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
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "capacity must be positive");

        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.min(4096)),
            count: 0,
            total_weight: 0.0,
            rng,
        }
    }

    /// Offer `value` with sampling weight `weight`.
    ///
    /// Returns `false` without consuming randomness when the value is not
    /// finite or the weight is not strictly positive and finite.
    pub fn add(&mut self, value: f64, weight: f64) -> bool {
        if !value.is_finite() || !weight.is_finite() || weight <= 0.0 {
            return false;
        }

        self.count += 1;
        self.total_weight += weight;

        // 1 - u lies in (0, 1], so the log is finite
        let u: f64 = self.rng.random();
        let log_key = (1.0 - u).ln() / weight;
        self.offer(Keyed { log_key, value });
        true
    }

    fn offer(&mut self, item: Keyed) {
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(item));
            return;
        }
        if let Some(Reverse(lowest)) = self.heap.peek() {
            if item > *lowest {
                self.heap.pop();
                self.heap.push(Reverse(item));
            }
        }
    }

    /// Retained values (order is unspecified but deterministic for a seed)
    pub fn values(&self) -> Vec<f64> {
        self.heap.iter().map(|Reverse(k)| k.value).collect()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of values accepted (positive weight, finite)
    pub fn items_seen(&self) -> u64 {
        self.count
    }

    /// Sum of the weights of all accepted values
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }
}

impl Sketch for WeightedReservoir {
    /// `(value, weight)`
    type Item = (f64, f64);

    fn update(&mut self, item: &Self::Item) {
        self.add(item.0, item.1);
    }

    /// Exact merge: A-Res keys are independent, so the top-`capacity` keys of
    /// the union are a valid weighted sample of both streams together.
    fn merge(&mut self, other: &Self) -> Result<(), MergeError> {
        check_capacity(self.capacity, other.capacity)?;

        for Reverse(item) in other.heap.iter() {
            self.offer(*item);
        }
        self.count += other.count;
        self.total_weight += other.total_weight;
        Ok(())
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.count = 0;
        self.total_weight = 0.0;
    }

    fn size_bytes(&self) -> usize {
        self.heap.capacity() * core::mem::size_of::<Reverse<Keyed>>() + core::mem::size_of::<Self>()
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl SamplingSketch for WeightedReservoir {
    type Sample = f64;

    fn sample(&self) -> Vec<f64> {
        self.values()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn sample_size(&self) -> usize {
        self.heap.len()
    }
}
