//! Linear-interpolation percentiles (type 7)

/// Copy of `sample` in ascending order
pub fn sorted_copy(sample: &[f64]) -> Vec<f64> {
    let mut sorted = sample.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    sorted
}

/// Percentile `p` (0..=100) of an unsorted sample.
///
/// Returns `None` for an empty sample. `p` is clamped to `[0, 100]`.
pub fn percentile(sample: &[f64], p: f64) -> Option<f64> {
    if sample.is_empty() {
        return None;
    }
    percentile_sorted(&sorted_copy(sample), p)
}

/// Percentile `p` (0..=100) of an already ascending sample.
///
/// Interpolates at rank `p / 100 * (len - 1)`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || p.is_nan() {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let frac = rank - lower as f64;

    if lower + 1 >= n {
        Some(sorted[n - 1])
    } else {
        Some(sorted[lower] + frac * (sorted[lower + 1] - sorted[lower]))
    }
}
