//! Analytical (non-stochastic) uncertainty bands and data-quality scoring.
//!
//! Each scope's relative uncertainty is the value-weighted mean of the
//! per-tier relative uncertainties of its rows. The Monte Carlo simulator
//! gives the empirical counterpart of these bands.

use serde::{Deserialize, Serialize};

use crate::facility::DataQuality;
use crate::scopes::{EmissionRow, ScopeOutput};

/// Reported confidence level of the analytical bands.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

fn relative_uncertainty(dq: DataQuality) -> f64 {
    match dq {
        DataQuality::Measured => 0.05,
        DataQuality::Modeled => 0.10,
        DataQuality::Estimated => 0.15,
    }
}

fn quality_weight(dq: DataQuality) -> f64 {
    match dq {
        DataQuality::Measured => 100.0,
        DataQuality::Modeled => 70.0,
        DataQuality::Estimated => 40.0,
    }
}

/// Relative uncertainty with symmetric absolute bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UncertaintyBand {
    pub relative: f64,
    pub lower_t: f64,
    pub upper_t: f64,
}

impl UncertaintyBand {
    fn from_rows<'a>(total_t: f64, rows: impl Iterator<Item = &'a EmissionRow>) -> Self {
        let mut weighted = 0.0;
        let mut weight = 0.0;
        for row in rows {
            weighted += row.value_t * relative_uncertainty(row.data_quality);
            weight += row.value_t;
        }
        let relative = if weight > 0.0 { weighted / weight } else { 0.0 };
        Self {
            relative,
            lower_t: total_t * (1.0 - relative),
            upper_t: total_t * (1.0 + relative),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticalUncertainty {
    pub scope1: UncertaintyBand,
    pub scope2_location: UncertaintyBand,
    pub scope2_market: UncertaintyBand,
    pub scope3: UncertaintyBand,
    /// Band on the location-based total.
    pub total: UncertaintyBand,
    /// Dominant data-quality tier by value share.
    pub overall_quality: DataQuality,
    pub confidence_level: f64,
}

impl AnalyticalUncertainty {
    pub fn empty() -> Self {
        let zero = UncertaintyBand {
            relative: 0.0,
            lower_t: 0.0,
            upper_t: 0.0,
        };
        Self {
            scope1: zero,
            scope2_location: zero,
            scope2_market: zero,
            scope3: zero,
            total: zero,
            overall_quality: DataQuality::Estimated,
            confidence_level: CONFIDENCE_LEVEL,
        }
    }
}

/// Builds the analytical bands from the four scope outputs.
pub fn analytical_bands(
    s1: &ScopeOutput,
    s2_location: &ScopeOutput,
    s2_market: &ScopeOutput,
    s3: &ScopeOutput,
) -> AnalyticalUncertainty {
    let total_t = s1.total_t + s2_location.total_t + s3.total_t;
    let location_rows = || {
        s1.rows
            .iter()
            .chain(s2_location.rows.iter())
            .chain(s3.rows.iter())
    };

    // Dominant tier by value share over the location-based rows.
    let value: f64 = location_rows().map(|r| r.value_t).sum();
    let measured_value: f64 = location_rows()
        .filter(|r| r.data_quality == DataQuality::Measured)
        .map(|r| r.value_t)
        .sum();
    let measured_share = if value > 0.0 { measured_value / value } else { 0.0 };
    let overall_quality = if measured_share > 0.7 {
        DataQuality::Measured
    } else if measured_share > 0.3 {
        DataQuality::Modeled
    } else {
        DataQuality::Estimated
    };

    AnalyticalUncertainty {
        scope1: UncertaintyBand::from_rows(s1.total_t, s1.rows.iter()),
        scope2_location: UncertaintyBand::from_rows(s2_location.total_t, s2_location.rows.iter()),
        scope2_market: UncertaintyBand::from_rows(s2_market.total_t, s2_market.rows.iter()),
        scope3: UncertaintyBand::from_rows(s3.total_t, s3.rows.iter()),
        total: UncertaintyBand::from_rows(total_t, location_rows()),
        overall_quality,
        confidence_level: CONFIDENCE_LEVEL,
    }
}

/// Value-weighted data-quality score in [0, 100].
///
/// 100 exactly when every non-zero row is measured; an empty inventory
/// scores 100 vacuously.
pub fn data_quality_score<'a>(rows: impl Iterator<Item = &'a EmissionRow>) -> f64 {
    let mut weighted = 0.0;
    let mut weight = 0.0;
    for row in rows {
        weighted += row.value_t * quality_weight(row.data_quality);
        weight += row.value_t;
    }
    if weight > 0.0 { weighted / weight } else { 100.0 }
}
