//! Sample statistics for Monte Carlo output: summary moments, interpolated
//! percentiles, histograms, and the running-mean convergence diagnostic.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` edges spanning [min, max].
    pub bin_edges: Vec<f64>,
    pub counts: Vec<u32>,
}

/// Summary of one output's empirical distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub median: f64,
    /// Bessel-corrected sample standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    /// Lower bound of the configured confidence interval (P2.5 at 95%).
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub histogram: Histogram,
}

/// Compact per-category summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub mean: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected sample standard deviation; 0 for fewer than two samples.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Linear-interpolation percentile over a sorted sample (PERCENTILE.INC):
/// `idx = p * (n - 1)`, interpolated between the bracketing order statistics.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let p = p.clamp(0.0, 1.0);
    let idx = p * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    let w = idx - lo as f64;
    sorted[lo] * (1.0 - w) + sorted[hi] * w
}

/// Histogram over [min, max] with equal-width bins. The maximum value lands
/// in the last bin; an all-equal sample is given a unit range so the bin
/// width never degenerates to zero.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let bins = bins.max(1);
    if values.is_empty() {
        return Histogram {
            bin_edges: vec![0.0; bins + 1],
            counts: vec![0; bins],
        };
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };
    let width = range / bins as f64;

    let bin_edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0u32; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Histogram { bin_edges, counts }
}

/// Builds the full summary for one output sample.
///
/// `confidence_level` sets the CI percentiles: 0.95 gives P2.5/P97.5.
pub fn summarize(values: &[f64], confidence_level: f64, bins: usize) -> DistributionSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("non-finite sample"));

    let alpha = (1.0 - confidence_level) / 2.0;
    DistributionSummary {
        mean: mean(values),
        median: percentile_sorted(&sorted, 0.5),
        std_dev: std_dev(values),
        min: sorted.first().copied().unwrap_or(0.0),
        max: sorted.last().copied().unwrap_or(0.0),
        p5: percentile_sorted(&sorted, 0.05),
        p10: percentile_sorted(&sorted, 0.10),
        p25: percentile_sorted(&sorted, 0.25),
        p75: percentile_sorted(&sorted, 0.75),
        p90: percentile_sorted(&sorted, 0.90),
        p95: percentile_sorted(&sorted, 0.95),
        ci_lower: percentile_sorted(&sorted, alpha),
        ci_upper: percentile_sorted(&sorted, 1.0 - alpha),
        histogram: histogram(values, bins),
    }
}

/// Coefficient of variation of the running means over the last 10% of runs.
/// Returns 1.0 (no convergence claim) for fewer than 100 runs.
pub fn convergence_diagnostic(samples: &[f64]) -> f64 {
    if samples.len() < 100 {
        return 1.0;
    }
    let mut running_means = Vec::with_capacity(samples.len());
    let mut sum = 0.0;
    for (i, &v) in samples.iter().enumerate() {
        sum += v;
        running_means.push(sum / (i + 1) as f64);
    }
    let tail_len = (samples.len() / 10).max(2);
    let tail = &running_means[running_means.len() - tail_len..];
    let tail_mean = mean(tail);
    if tail_mean.abs() < 1e-15 {
        return 0.0;
    }
    std_dev(tail) / tail_mean.abs()
}
