pub mod benchmark;
pub mod result;
pub mod uncertainty;

use crate::error::CoreError;
use crate::estimate::apply_estimator_if_needed;
use crate::facility::FacilityProfile;
use crate::factors::FactorSet;
use crate::scopes::{ScopeOutput, scope1, scope2, scope3};

pub use benchmark::{BenchmarkClass, BenchmarkComparison};
pub use result::{EmissionResult, Intensity, MethodologyRecord};
pub use uncertainty::{AnalyticalUncertainty, UncertaintyBand};

/// Options for a single inventory computation.
#[derive(Debug, Clone, Copy)]
pub struct ComputeOptions {
    pub include_scope3: bool,
    pub include_estimation: bool,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            include_scope3: true,
            include_estimation: true,
        }
    }
}

/// Computes the full attributed inventory for one facility.
///
/// Pure: repeated calls with equal inputs yield equal results. The caller's
/// profile and factor set are never mutated.
pub fn compute_all(
    facility: &FacilityProfile,
    factors: &FactorSet,
    options: &ComputeOptions,
) -> Result<EmissionResult, CoreError> {
    facility.validate()?;

    let estimate = apply_estimator_if_needed(facility, factors, options.include_estimation);
    let working = &estimate.facility;

    let s1 = scope1::calculate(working, factors);
    let s2_location = scope2::calculate_location(working, factors);
    let s2_market = scope2::calculate_market(working, factors);
    let s3 = if options.include_scope3 {
        scope3::calculate(working, factors)
    } else {
        ScopeOutput::new()
    };

    let total_location_t = s1.total_t + s2_location.total_t + s3.total_t;
    let total_market_t = s1.total_t + s2_market.total_t + s3.total_t;

    let intensity = Intensity {
        kg_per_sqft: total_location_t * 1000.0 / working.square_feet,
        t_per_employee: working
            .occupancy
            .as_ref()
            .filter(|o| o.employees > 0)
            .map(|o| total_location_t / o.employees as f64),
    };

    let benchmark = factors
        .benchmarks
        .get(&working.building_type)
        .map(|bench| benchmark::compare(intensity.kg_per_sqft, bench));

    let uncertainty = uncertainty::analytical_bands(&s1, &s2_location, &s2_market, &s3);
    let data_quality_score = uncertainty::data_quality_score(
        s1.rows
            .iter()
            .chain(s2_location.rows.iter())
            .chain(s3.rows.iter()),
    );

    let mut data_gaps = vec![];
    if facility.electricity_kwh() <= 0.0 {
        data_gaps.push("no electricity data provided".to_string());
    }
    if facility.refrigerants.is_empty() {
        data_gaps.push("no refrigerant inventory provided".to_string());
    }
    if facility.fleet.is_empty() {
        data_gaps.push("no fleet data provided".to_string());
    }
    data_gaps.extend(s1.data_gaps.iter().cloned());
    data_gaps.extend(s2_location.data_gaps.iter().cloned());
    data_gaps.extend(s2_market.data_gaps.iter().cloned());
    data_gaps.extend(s3.data_gaps.iter().cloned());

    let mut breakdown = Vec::with_capacity(
        s1.rows.len() + s2_location.rows.len() + s2_market.rows.len() + s3.rows.len(),
    );
    breakdown.extend(s1.rows);
    breakdown.extend(s2_location.rows);
    breakdown.extend(s2_market.rows);
    breakdown.extend(s3.rows);

    let methodology = MethodologyRecord::new(
        &factors.version,
        breakdown.iter().map(|r| r.source.clone()),
        estimate.assumptions,
        data_gaps,
    );

    Ok(EmissionResult {
        scope1_t: s1.total_t,
        scope2_location_t: s2_location.total_t,
        scope2_market_t: s2_market.total_t,
        scope3_t: s3.total_t,
        total_location_t,
        total_market_t,
        breakdown,
        intensity,
        benchmark,
        uncertainty,
        data_quality_score,
        methodology,
    })
}
