use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constants::ENGINE_VERSION;
use crate::scopes::{EmissionRow, Scope};

use super::benchmark::BenchmarkComparison;
use super::uncertainty::AnalyticalUncertainty;

/// Emission intensity metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intensity {
    /// kg CO2e per square foot (location-based total).
    pub kg_per_sqft: f64,
    /// Tonnes CO2e per employee, when occupancy is known.
    #[serde(default)]
    pub t_per_employee: Option<f64>,
}

/// Provenance record attached to every result.
///
/// Carries no timestamp: the engine is a pure function and callers stamp
/// results at their persistence boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodologyRecord {
    pub engine_version: String,
    pub factor_version: String,
    /// Sorted set of factor-table citations used by the breakdown rows.
    pub sources: BTreeSet<String>,
    /// Assumptions introduced during computation (estimator, defaults).
    pub assumptions: Vec<String>,
    /// Non-fatal notes about missing or skipped inputs.
    pub data_gaps: Vec<String>,
}

impl MethodologyRecord {
    pub fn new(
        factor_version: &str,
        sources: impl Iterator<Item = String>,
        assumptions: Vec<String>,
        data_gaps: Vec<String>,
    ) -> Self {
        Self {
            engine_version: ENGINE_VERSION.to_string(),
            factor_version: factor_version.to_string(),
            sources: sources.collect(),
            assumptions,
            data_gaps,
        }
    }
}

/// Fully attributed inventory for one facility. All totals in tonnes CO2e.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionResult {
    pub scope1_t: f64,
    pub scope2_location_t: f64,
    pub scope2_market_t: f64,
    pub scope3_t: f64,
    /// Scope 1 + Scope 2 (location-based) + Scope 3.
    pub total_location_t: f64,
    /// Scope 1 + Scope 2 (market-based) + Scope 3.
    pub total_market_t: f64,
    pub breakdown: Vec<EmissionRow>,
    pub intensity: Intensity,
    /// Absent only when the building type has no benchmark row.
    #[serde(default)]
    pub benchmark: Option<BenchmarkComparison>,
    pub uncertainty: AnalyticalUncertainty,
    /// Value-weighted data quality in [0, 100].
    pub data_quality_score: f64,
    pub methodology: MethodologyRecord,
}

impl EmissionResult {
    /// Sum of breakdown rows carrying the given category tag.
    pub fn category_total(&self, category: &str) -> f64 {
        self.breakdown
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.value_t)
            .sum()
    }

    /// Sum of breakdown rows in the given scope.
    pub fn scope_rows_total(&self, scope: Scope) -> f64 {
        self.breakdown
            .iter()
            .filter(|r| r.scope == scope)
            .map(|r| r.value_t)
            .sum()
    }
}
