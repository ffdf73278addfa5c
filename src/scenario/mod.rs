//! Decarbonization scenario evaluation: per-intervention deltas, a ten-year
//! grid-decarbonization trajectory, and financial metrics.

pub mod finance;
pub mod interventions;

use serde::{Deserialize, Serialize};

use crate::constants::BASE_YEAR;
use crate::engine::EmissionResult;
use crate::error::CoreError;
use crate::facility::FacilityProfile;
use crate::factors::FactorSet;

pub use interventions::{Intervention, InterventionOutcome};

/// Share of the baseline assumed to track the grid's emission factor.
const SCOPE2_BASELINE_FRACTION: f64 = 0.45;
const DEFAULT_DISCOUNT_RATE: f64 = 0.08;
const DEFAULT_HORIZON_YEARS: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// First trajectory year. Defaults to the factor vintage year; the core
    /// has no clock.
    pub base_year: u16,
    pub discount_rate: f64,
    pub horizon_years: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            base_year: BASE_YEAR,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            horizon_years: DEFAULT_HORIZON_YEARS,
        }
    }
}

/// One year of the projected trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub year: u16,
    /// Projected national grid factor for the year, kg CO2e/kWh.
    pub grid_ef_kg_per_kwh: f64,
    /// Baseline re-projected under the greening grid.
    pub baseline_adjusted_t: f64,
    /// Emissions with all interventions applied.
    pub scenario_t: f64,
    /// Running total of avoided emissions through this year.
    pub cumulative_reduction_t: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSummary {
    /// NPV of the scenario cash flows at the configured discount rate.
    pub npv_usd: f64,
    /// Absent when Newton-Raphson does not converge.
    #[serde(default)]
    pub irr: Option<f64>,
    pub simple_payback_years: f64,
    /// Cumulative CO2 avoided over the horizon, from the trajectory.
    pub cumulative_co2_avoided_t: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub interventions: Vec<InterventionOutcome>,
    /// Sum of the independent per-intervention reductions, tonnes CO2e/yr.
    pub total_reduction_t: f64,
    pub total_capex_usd: f64,
    /// Positive when the interventions save money net of premiums.
    pub annual_savings_usd: f64,
    /// Baseline minus reductions, floored at zero.
    pub projected_emissions_t: f64,
    pub trajectory: Vec<TrajectoryPoint>,
    pub financials: FinancialSummary,
    /// Assumptions introduced by the intervention models.
    pub assumptions: Vec<String>,
    pub engine_version: String,
    pub factor_version: String,
}

/// Evaluates a named scenario against a baseline inventory with the default
/// configuration (factor-vintage base year, 8% discount, 10-year horizon).
pub fn evaluate_scenario(
    name: &str,
    facility: &FacilityProfile,
    factors: &FactorSet,
    interventions: &[Intervention],
    baseline: &EmissionResult,
) -> Result<ScenarioResult, CoreError> {
    evaluate_scenario_with_config(
        name,
        facility,
        factors,
        interventions,
        baseline,
        &ScenarioConfig::default(),
    )
}

/// Evaluates a named scenario with an explicit configuration.
pub fn evaluate_scenario_with_config(
    name: &str,
    facility: &FacilityProfile,
    factors: &FactorSet,
    interventions: &[Intervention],
    baseline: &EmissionResult,
    config: &ScenarioConfig,
) -> Result<ScenarioResult, CoreError> {
    facility.validate()?;
    if config.horizon_years == 0 {
        return Err(CoreError::InvalidConfig(
            "scenario horizon must be at least one year".to_string(),
        ));
    }

    let outcomes: Vec<InterventionOutcome> = interventions
        .iter()
        .map(|i| i.evaluate(facility, baseline, factors))
        .collect();

    let total_reduction_t: f64 = outcomes.iter().map(|o| o.reduction_t).sum();
    let total_capex_usd: f64 = outcomes.iter().map(|o| o.capex_usd).sum();
    let annual_savings_usd: f64 = -outcomes.iter().map(|o| o.opex_delta_usd).sum::<f64>();
    let baseline_t = baseline.total_location_t;
    let projected_emissions_t = (baseline_t - total_reduction_t).max(0.0);

    let trajectory = project_trajectory(baseline_t, total_reduction_t, factors, config);
    let cumulative_co2_avoided_t = trajectory
        .last()
        .map(|p| p.cumulative_reduction_t)
        .unwrap_or(0.0);

    let cash_flows =
        finance::build_cash_flows(total_capex_usd, annual_savings_usd, config.horizon_years);
    let financials = FinancialSummary {
        npv_usd: finance::npv(config.discount_rate, &cash_flows),
        irr: finance::irr(&cash_flows),
        simple_payback_years: finance::simple_payback(total_capex_usd, annual_savings_usd),
        cumulative_co2_avoided_t,
    };

    let assumptions = outcomes
        .iter()
        .flat_map(|o| o.assumptions.iter().cloned())
        .collect();

    Ok(ScenarioResult {
        name: name.to_string(),
        interventions: outcomes,
        total_reduction_t,
        total_capex_usd,
        annual_savings_usd,
        projected_emissions_t,
        trajectory,
        financials,
        assumptions,
        engine_version: crate::constants::ENGINE_VERSION.to_string(),
        factor_version: factors.version.clone(),
    })
}

/// Projects the baseline and scenario over `horizon_years + 1` points.
///
/// The Scope 2 share of the baseline (fixed at 0.45) declines with the
/// projected national grid factor; the rest is held flat.
fn project_trajectory(
    baseline_t: f64,
    total_reduction_t: f64,
    factors: &FactorSet,
    config: &ScenarioConfig,
) -> Vec<TrajectoryPoint> {
    let base_ef = factors.projected_grid_ef(config.base_year);
    let mut cumulative = 0.0;
    (0..=config.horizon_years as u16)
        .map(|offset| {
            let year = config.base_year + offset;
            let grid_ef = factors.projected_grid_ef(year);
            let decline_ratio = if base_ef > 0.0 { grid_ef / base_ef } else { 1.0 };
            let baseline_adjusted_t = baseline_t
                * (1.0 - SCOPE2_BASELINE_FRACTION + SCOPE2_BASELINE_FRACTION * decline_ratio);
            let scenario_t = (baseline_adjusted_t - total_reduction_t).max(0.0);
            cumulative += baseline_adjusted_t - scenario_t;
            TrajectoryPoint {
                year,
                grid_ef_kg_per_kwh: grid_ef,
                baseline_adjusted_t,
                scenario_t,
                cumulative_reduction_t: cumulative,
            }
        })
        .collect()
}
