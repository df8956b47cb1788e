//! Weighted multi-dataset aggregation
//!
//! Each feature owns one [`WeightedReservoir`] shared by every dataset that
//! reports it. A dataset's weight is spread evenly over the finite values it
//! contributes to a feature, so its total influence on that feature's sample
//! is its weight rather than its length. Datasets ingested without a weight
//! give each value weight `1.0`, i.e. they are represented by size.

use std::collections::BTreeMap;

use tracing::debug;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::error::{Error, Result};
use crate::sampling::{WeightedReservoir, DEFAULT_SEED};
use crate::statistics::{RunningStats, DEFAULT_CAPACITY};
use crate::traits::{check_capacity, MergeError, SamplingSketch, Sketch};

/// Per-feature state: the weighted sample plus exact full-stream moments
#[derive(Clone, Debug)]
struct FeatureStream {
    reservoir: WeightedReservoir,
    summary: RunningStats,
}

#[derive(Clone, Debug, PartialEq)]
struct DatasetEntry {
    name: String,
    weight: f64,
    ingestions: u32,
}

/// Full-stream statistics of one feature (not sampled)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureSummary {
    /// Finite values observed across all datasets
    pub count: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Values currently retained in the reservoir
    pub sample_size: usize,
}

/// What a single `add_dataset` call did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub features: usize,
    pub accepted: u64,
    /// Non-finite values dropped
    pub rejected: u64,
}

/// Bounded, weighted pooling of many named datasets
#[derive(Clone, Debug)]
pub struct MultiDatasetAggregator {
    capacity: usize,
    seed: u64,
    features: BTreeMap<String, FeatureStream>,
    datasets: Vec<DatasetEntry>,
}

impl Default for MultiDatasetAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MultiDatasetAggregator {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_seed(capacity, DEFAULT_SEED)
    }

    /// Aggregator whose reservoirs are all derived from `seed`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        assert!(capacity > 0, "capacity must be positive");

        Self {
            capacity,
            seed,
            features: BTreeMap::new(),
            datasets: Vec::new(),
        }
    }

    /// Values retained per feature
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Root seed the per-feature reservoirs are derived from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Ingest one dataset (or one more chunk of an already-registered one).
    ///
    /// `weight` must be finite and non-negative; it is checked before anything
    /// is ingested. `None` weighs every value `1.0`. A feature missing from
    /// the dataset simply receives nothing.
    pub fn add_dataset<I, K, V>(
        &mut self,
        name: &str,
        features: I,
        weight: Option<f64>,
    ) -> Result<IngestSummary>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[f64]>,
    {
        if let Some(w) = weight {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidWeight {
                    dataset: name.to_string(),
                    weight: w,
                });
            }
        }

        let mut ingest = IngestSummary::default();
        let mut largest_feature = 0u64;

        for (feature, values) in features {
            let values = values.as_ref();
            let finite = values.iter().filter(|v| v.is_finite()).count();
            ingest.features += 1;
            ingest.accepted += finite as u64;
            ingest.rejected += (values.len() - finite) as u64;
            largest_feature = largest_feature.max(finite as u64);

            if finite == 0 {
                continue;
            }

            let per_value = match weight {
                Some(w) => w / finite as f64,
                None => 1.0,
            };

            let stream = self.stream_mut(feature.as_ref());
            for &v in values.iter().filter(|v| v.is_finite()) {
                stream.summary.add(v);
                stream.reservoir.add(v, per_value);
            }
        }

        let registered_weight = weight.unwrap_or(largest_feature as f64);
        self.register(name, registered_weight);

        debug!(
            dataset = name,
            weight = registered_weight,
            features = ingest.features,
            accepted = ingest.accepted,
            rejected = ingest.rejected,
            "ingested dataset"
        );

        Ok(ingest)
    }

    fn stream_mut(&mut self, feature: &str) -> &mut FeatureStream {
        if !self.features.contains_key(feature) {
            let seed = xxh3_64_with_seed(feature.as_bytes(), self.seed);
            self.features.insert(
                feature.to_string(),
                FeatureStream {
                    reservoir: WeightedReservoir::with_seed(self.capacity, seed),
                    summary: RunningStats::new(),
                },
            );
        }
        match self.features.get_mut(feature) {
            Some(stream) => stream,
            None => unreachable!("feature stream inserted above"),
        }
    }

    fn register(&mut self, name: &str, weight: f64) {
        match self.datasets.iter_mut().find(|d| d.name == name) {
            Some(entry) => {
                entry.weight += weight;
                entry.ingestions += 1;
            }
            None => self.datasets.push(DatasetEntry {
                name: name.to_string(),
                weight,
                ingestions: 1,
            }),
        }
    }

    /// Copy of the retained sample for `feature` (empty if never observed)
    pub fn aggregate_feature(&self, feature: &str) -> Vec<f64> {
        self.features
            .get(feature)
            .map(|s| s.reservoir.values())
            .unwrap_or_default()
    }

    /// Number of values currently retained for `feature`
    pub fn sample_size(&self, feature: &str) -> usize {
        self.features
            .get(feature)
            .map_or(0, |s| s.reservoir.sample_size())
    }

    pub fn feature_summary(&self, feature: &str) -> Option<FeatureSummary> {
        let stream = self.features.get(feature)?;
        let summary = &stream.summary;
        Some(FeatureSummary {
            count: summary.len(),
            mean: summary.mean(),
            std_dev: summary.std_dev(),
            min: summary.min()?,
            max: summary.max()?,
            sample_size: stream.reservoir.sample_size(),
        })
    }

    /// Observed features, sorted
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.keys().map(String::as_str).collect()
    }

    /// Registered dataset names in first-seen order
    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.name.as_str()).collect()
    }

    /// Registered weights in first-seen order; repeated ingestions under one
    /// name accumulate.
    pub fn dataset_weights(&self) -> Vec<(&str, f64)> {
        self.datasets
            .iter()
            .map(|d| (d.name.as_str(), d.weight))
            .collect()
    }

    /// Number of `add_dataset` calls made under `name`
    pub fn ingestions(&self, name: &str) -> u32 {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .map_or(0, |d| d.ingestions)
    }

    /// Fold another aggregator into this one, feature by feature
    ///
    /// Both sides must share a capacity and use different seeds: equal seeds
    /// give both workers the same key sequence per feature, so the merged
    /// sample would keep values in position-matched pairs.
    pub fn merge(&mut self, other: &Self) -> core::result::Result<(), MergeError> {
        check_capacity(self.capacity, other.capacity)?;
        if self.seed == other.seed {
            return Err(MergeError::IncompatibleConfig {
                expected: format!("seed != {:#x}", self.seed),
                found: format!("seed={:#x}", other.seed),
            });
        }

        for (feature, theirs) in &other.features {
            let mine = self.stream_mut(feature);
            mine.reservoir.merge(&theirs.reservoir)?;
            mine.summary.merge_stats(&theirs.summary);
        }
        for entry in &other.datasets {
            match self.datasets.iter_mut().find(|d| d.name == entry.name) {
                Some(existing) => {
                    existing.weight += entry.weight;
                    existing.ingestions += entry.ingestions;
                }
                None => self.datasets.push(entry.clone()),
            }
        }
        Ok(())
    }

    /// Approximate heap footprint of all reservoirs
    pub fn size_bytes(&self) -> usize {
        self.features
            .values()
            .map(|s| s.reservoir.size_bytes() + s.summary.size_bytes())
            .sum()
    }
}
