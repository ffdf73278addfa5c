//! Benchmark comparison against CBECS intensity quartiles.

use serde::{Deserialize, Serialize};

use crate::factors::tables::{BuildingBenchmark, Quartiles};

/// Percentile band classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkClass {
    Low,
    Average,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    /// Facility intensity in kg CO2e/sqft.
    pub kg_per_sqft: f64,
    /// Estimated percentile among peer buildings, in [0, 100].
    pub percentile: f64,
    pub classification: BenchmarkClass,
    /// Peer median intensity for context.
    pub median_kg_per_sqft: f64,
}

/// Piecewise-linear percentile through the quartile anchors
/// (0, p25) -> (p25, 50th value) -> ... with the upper tail extrapolated one
/// inter-quartile step beyond p75, saturating at 100.
pub fn percentile_from_quartiles(value: f64, q: &Quartiles) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    if value <= q.p25 {
        if q.p25 <= 0.0 {
            return 25.0;
        }
        return 25.0 * value / q.p25;
    }
    if value <= q.median {
        let span = q.median - q.p25;
        if span <= 0.0 {
            return 50.0;
        }
        return 25.0 + 25.0 * (value - q.p25) / span;
    }
    if value <= q.p75 {
        let span = q.p75 - q.median;
        if span <= 0.0 {
            return 75.0;
        }
        return 50.0 + 25.0 * (value - q.median) / span;
    }
    // Upper tail: one more inter-quartile step, then saturation.
    let delta = q.p75 - q.median;
    if delta <= 0.0 {
        return 100.0;
    }
    (75.0 + 25.0 * (value - q.p75) / delta).min(100.0)
}

/// Classification thresholds on the percentile: <=25 low, <=50 average,
/// <=75 high, else very high.
pub fn classify(percentile: f64) -> BenchmarkClass {
    if percentile <= 25.0 {
        BenchmarkClass::Low
    } else if percentile <= 50.0 {
        BenchmarkClass::Average
    } else if percentile <= 75.0 {
        BenchmarkClass::High
    } else {
        BenchmarkClass::VeryHigh
    }
}

pub fn compare(kg_per_sqft: f64, bench: &BuildingBenchmark) -> BenchmarkComparison {
    let percentile = percentile_from_quartiles(kg_per_sqft, &bench.kg_co2e_per_sqft);
    BenchmarkComparison {
        kg_per_sqft,
        percentile,
        classification: classify(percentile),
        median_kg_per_sqft: bench.kg_co2e_per_sqft.median,
    }
}
