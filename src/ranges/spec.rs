//! Validation ranges as handed to persistence and reporting

use std::collections::BTreeMap;

/// Inclusive `[min, max]` validation range for one feature
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Sentinel returned for features without data
    pub const EMPTY: Range = Range { min: 0.0, max: 0.0 };

    /// Check if a value is accepted by the range (bounds inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

impl From<(f64, f64)> for Range {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

/// Feature name to validation range, ordered by feature name
///
/// Immutable once returned by the optimizer; this is the only artifact the
/// persistence layer writes out.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RangeSpec {
    ranges: BTreeMap<String, Range>,
}

impl RangeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, feature: impl Into<String>, range: Range) -> Option<Range> {
        self.ranges.insert(feature.into(), range)
    }

    pub fn get(&self, feature: &str) -> Option<&Range> {
        self.ranges.get(feature)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.ranges.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Range)> {
        self.ranges.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, Range)> for RangeSpec {
    fn from_iter<I: IntoIterator<Item = (S, Range)>>(iter: I) -> Self {
        Self {
            ranges: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RangeSpec {
    type Item = (&'a String, &'a Range);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Range>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
