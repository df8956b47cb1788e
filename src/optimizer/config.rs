//! Optimizer configuration

use crate::error::{Error, Result};
use crate::sampling::DEFAULT_SEED;
use crate::statistics::DEFAULT_CAPACITY;

/// Construction parameters for a [`RangeOptimizer`](crate::RangeOptimizer)
///
/// # Example
///
/// ```
/// use flowranges::OptimizerConfig;
///
/// let config = OptimizerConfig::default().with_capacity(5_000).with_seed(42);
/// assert!(config.validate().is_ok());
/// assert!(OptimizerConfig::default().with_capacity(0).validate().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OptimizerConfig {
    /// Values retained per feature
    pub capacity: usize,
    /// Root seed for every reservoir the optimizer creates
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            seed: DEFAULT_SEED,
        }
    }
}

impl OptimizerConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::invalid_parameter(
                "capacity",
                self.capacity as f64,
                "must be positive",
            ));
        }
        Ok(())
    }
}
