//! Summary statistics over Monte Carlo cost samples.

use serde::{Deserialize, Serialize};

use crate::numbers::{ceil_f64_to_usize, floor_f64_to_usize, usize_to_f64};

/// Linear-interpolated percentile over an ascending slice (the R-7 method:
/// fractional rank `p/100 * (n-1)` between bracketing order statistics).
///
/// Returns 0.0 for an empty slice; callers validate sample counts upstream.
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let last = sorted.len() - 1;
    let rank = p / 100.0 * usize_to_f64(last);
    let lo = floor_f64_to_usize(rank).min(last);
    let hi = ceil_f64_to_usize(rank).min(last);
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - usize_to_f64(lo))
}

/// Arithmetic mean, 0.0 for empty input.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / usize_to_f64(values.len())
}

/// Full summary of one action's simulated cost distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p05: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl CostStats {
    /// Compute stats over a sample array, sorting a copy so the caller's
    /// order (needed for breakdown reporting) is preserved.
    #[must_use]
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    /// Compute stats over an already ascending-sorted slice.
    #[must_use]
    pub fn from_sorted(sorted: &[f64]) -> Self {
        if sorted.is_empty() {
            return Self::zeroed();
        }
        let mean = mean(sorted);
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / usize_to_f64(sorted.len());
        Self {
            mean,
            median: percentile(sorted, 50.0),
            std: variance.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p05: percentile(sorted, 5.0),
            p25: percentile(sorted, 25.0),
            p50: percentile(sorted, 50.0),
            p75: percentile(sorted, 75.0),
            p95: percentile(sorted, 95.0),
        }
    }

    const fn zeroed() -> Self {
        Self {
            mean: 0.0,
            median: 0.0,
            std: 0.0,
            min: 0.0,
            max: 0.0,
            p05: 0.0,
            p25: 0.0,
            p50: 0.0,
            p75: 0.0,
            p95: 0.0,
        }
    }
}
