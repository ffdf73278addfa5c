//! Closed-form delta models for the supported intervention types.
//!
//! Each model maps (parameters, facility, baseline) to an annual emission
//! reduction, a capital cost, and an operating-cost delta (negative =
//! savings). Interventions are evaluated independently; the evaluator sums
//! them without combinatoric interaction.

use serde::{Deserialize, Serialize};

use crate::engine::EmissionResult;
use crate::facility::FacilityProfile;
use crate::factors::FactorSet;

const HOURS_PER_YEAR: f64 = 8760.0;
const ELECTRICITY_PRICE_USD_PER_KWH: f64 = 0.12;
const RENEWABLE_PREMIUM_USD_PER_KWH: f64 = 0.015;

const EV_CAPEX_PER_VEHICLE_USD: f64 = 12_000.0;
const EV_OPEX_SAVINGS_PER_VEHICLE_USD: f64 = 1_200.0;
/// Net emission benefit of electrification after grid charging (1 - 0.35).
const EV_NET_REDUCTION_FACTOR: f64 = 0.65;

const HVAC_CAPEX_PER_SQFT_USD: f64 = 8.0;
const HVAC_OPEX_SAVINGS_FRACTION: f64 = 0.12;
/// Share of combined Scope 1 + Scope 2 energy attributable to HVAC.
const HVAC_ENERGY_SHARE: f64 = 0.50;
const HVAC_DEFAULT_OLD_COP: f64 = 2.5;
const HVAC_DEFAULT_NEW_COP: f64 = 4.0;

const SOLAR_CAPEX_PER_KW_USD: f64 = 2_500.0;

const ENVELOPE_CAPEX_USD: f64 = 50_000.0;
const ENVELOPE_CAPEX_NO_SCOPE1_USD: f64 = 25_000.0;
const ENVELOPE_OPEX_SAVINGS_FRACTION: f64 = 0.08;
const ENVELOPE_HEATING_EFFECT: f64 = 0.30;
const ENVELOPE_COOLING_EFFECT: f64 = 0.20;

const WASTE_CAPEX_USD: f64 = 5_000.0;
const WASTE_OPEX_SAVINGS_USD: f64 = 2_000.0;
const WASTE_DIVERSION_EFFECTIVENESS: f64 = 0.80;

/// A named decarbonization measure with its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intervention {
    /// Procure renewable electricity for a share of consumption.
    RenewableSwitch { renewable_pct: f64 },
    /// Electrify a share of the combustion fleet.
    FleetElectrification { electrified_pct: f64 },
    /// Replace heating/cooling plant with a higher-COP system.
    HvacUpgrade {
        #[serde(default)]
        old_cop: Option<f64>,
        #[serde(default)]
        new_cop: Option<f64>,
    },
    /// On-site solar PV.
    SolarOnsite {
        capacity_kw: f64,
        annual_capacity_factor: f64,
    },
    /// Insulation / air-sealing upgrades.
    BuildingEnvelope {
        heating_pct: f64,
        cooling_pct: f64,
    },
    /// Divert a share of landfill waste.
    WasteReduction { diversion_pct: f64 },
}

/// Evaluated deltas for one intervention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionOutcome {
    /// Stable type key, e.g. "solar_onsite".
    pub kind: String,
    /// Annual emission reduction in tonnes CO2e.
    pub reduction_t: f64,
    pub capex_usd: f64,
    /// Annual operating-cost delta; negative means savings.
    pub opex_delta_usd: f64,
    /// Assumptions this model introduced (e.g. defaulted COPs).
    pub assumptions: Vec<String>,
}

impl Intervention {
    pub fn key(&self) -> &'static str {
        match self {
            Self::RenewableSwitch { .. } => "renewable_switch",
            Self::FleetElectrification { .. } => "fleet_electrification",
            Self::HvacUpgrade { .. } => "hvac_upgrade",
            Self::SolarOnsite { .. } => "solar_onsite",
            Self::BuildingEnvelope { .. } => "building_envelope",
            Self::WasteReduction { .. } => "waste_reduction",
        }
    }

    /// Applies the delta model against the baseline inventory.
    pub fn evaluate(
        &self,
        facility: &FacilityProfile,
        baseline: &EmissionResult,
        factors: &FactorSet,
    ) -> InterventionOutcome {
        let mut assumptions = vec![];
        let (reduction_t, capex_usd, opex_delta_usd) = match self {
            Self::RenewableSwitch { renewable_pct } => {
                let pct = renewable_pct.clamp(0.0, 1.0);
                let reduction = baseline.scope2_location_t * pct;
                let covered_kwh = facility.electricity_kwh() * pct;
                (reduction, 0.0, covered_kwh * RENEWABLE_PREMIUM_USD_PER_KWH)
            }
            Self::FleetElectrification { electrified_pct } => {
                let pct = electrified_pct.clamp(0.0, 1.0);
                let mobile_t = baseline.category_total("mobile_combustion");
                let reduction = mobile_t * pct * EV_NET_REDUCTION_FACTOR;
                let ev_count = (facility.fleet_vehicle_count() as f64 * pct).round();
                (
                    reduction,
                    ev_count * EV_CAPEX_PER_VEHICLE_USD,
                    -ev_count * EV_OPEX_SAVINGS_PER_VEHICLE_USD,
                )
            }
            Self::HvacUpgrade { old_cop, new_cop } => {
                let old = match old_cop {
                    Some(cop) => *cop,
                    None => {
                        assumptions.push(format!(
                            "existing HVAC COP assumed {HVAC_DEFAULT_OLD_COP} (not provided)"
                        ));
                        HVAC_DEFAULT_OLD_COP
                    }
                };
                let new = new_cop.unwrap_or(HVAC_DEFAULT_NEW_COP);
                let affected = (baseline.scope1_t + baseline.scope2_location_t) * HVAC_ENERGY_SHARE;
                let reduction = if new > 0.0 {
                    (affected * (1.0 - old / new)).max(0.0)
                } else {
                    0.0
                };
                let capex = facility.square_feet * HVAC_CAPEX_PER_SQFT_USD;
                (reduction, capex, -capex * HVAC_OPEX_SAVINGS_FRACTION)
            }
            Self::SolarOnsite {
                capacity_kw,
                annual_capacity_factor,
            } => {
                let annual_kwh = capacity_kw * HOURS_PER_YEAR * annual_capacity_factor;
                let grid = factors.resolve_grid(facility);
                let reduction = annual_kwh * grid.kg_co2e_per_kwh / 1000.0;
                (
                    reduction,
                    capacity_kw * SOLAR_CAPEX_PER_KW_USD,
                    -annual_kwh * ELECTRICITY_PRICE_USD_PER_KWH,
                )
            }
            Self::BuildingEnvelope {
                heating_pct,
                cooling_pct,
            } => {
                let h = heating_pct.clamp(0.0, 1.0);
                let c = cooling_pct.clamp(0.0, 1.0);
                let affected = baseline.scope1_t + baseline.scope2_location_t;
                let reduction = affected * (ENVELOPE_HEATING_EFFECT * h + ENVELOPE_COOLING_EFFECT * c);
                let capex = if baseline.scope1_t > 0.0 {
                    ENVELOPE_CAPEX_USD
                } else {
                    ENVELOPE_CAPEX_NO_SCOPE1_USD
                };
                (reduction, capex, -capex * ENVELOPE_OPEX_SAVINGS_FRACTION)
            }
            Self::WasteReduction { diversion_pct } => {
                let pct = diversion_pct.clamp(0.0, 1.0);
                let cat5_t = baseline.category_total("scope3_cat5");
                (
                    cat5_t * pct * WASTE_DIVERSION_EFFECTIVENESS,
                    WASTE_CAPEX_USD,
                    -WASTE_OPEX_SAVINGS_USD,
                )
            }
        };

        InterventionOutcome {
            kind: self.key().to_string(),
            reduction_t,
            capex_usd,
            opex_delta_usd,
            assumptions,
        }
    }
}
