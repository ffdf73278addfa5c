//! Scope 1: direct emissions from stationary combustion, mobile combustion,
//! and fugitive refrigerant leakage.

use tracing::{debug, warn};

use crate::constants::{FALLBACK_MPG, GWP_CH4_FOSSIL, GWP_N2O, HYBRID_CO2_SCALAR};
use crate::facility::{EnergyUnit, FacilityProfile, FleetFuel, Fuel};
use crate::factors::FactorSet;

use super::row::{EmissionRow, GasComponents, Scope, ScopeOutput};

const STATIONARY_SOURCE: &str = "EPA Emission Factors Hub (2025), Table 1";
const MOBILE_SOURCE: &str = "EPA Emission Factors Hub (2025), Tables 2-4";
const REFRIGERANT_SOURCE: &str = "IPCC AR6 GWP-100 (Table 7.SM.7)";

/// Computes all Scope 1 rows for the facility.
pub fn calculate(facility: &FacilityProfile, factors: &FactorSet) -> ScopeOutput {
    let mut out = ScopeOutput::new();
    stationary_combustion(facility, factors, &mut out);
    mobile_combustion(facility, factors, &mut out);
    fugitive_refrigerants(facility, factors, &mut out);
    out
}

fn stationary_combustion(facility: &FacilityProfile, factors: &FactorSet, out: &mut ScopeOutput) {
    for (fuel, item) in &facility.energy {
        if *fuel == Fuel::Electricity {
            continue;
        }
        let quantity = item.normalized_annual_quantity();
        if quantity <= 0.0 {
            continue;
        }
        let Some(factor) = factors.stationary.get(fuel) else {
            warn!(fuel = fuel.key(), "no stationary factor, line skipped");
            out.note_gap(format!("no stationary factor for {}", fuel.key()));
            continue;
        };

        // Natural gas arrives in therms but the factor is per MMBtu.
        let effective_qty = match (item.unit, factor.heat_content_mmbtu_per_native) {
            (EnergyUnit::Therms, Some(heat_content)) => quantity * heat_content,
            _ => quantity,
        };

        let co2_t = effective_qty * factor.co2_kg_per_unit / 1000.0;
        let ch4_t = effective_qty * factor.ch4_g_per_unit * GWP_CH4_FOSSIL / 1e6;
        let n2o_t = effective_qty * factor.n2o_g_per_unit * GWP_N2O / 1e6;

        out.push(EmissionRow {
            scope: Scope::Scope1,
            category: "stationary_combustion".to_string(),
            subcategory: Some(fuel.key().to_string()),
            label: fuel.label().to_string(),
            value_t: co2_t + ch4_t + n2o_t,
            components: Some(GasComponents {
                co2_t,
                ch4_t_co2e: ch4_t,
                n2o_t_co2e: n2o_t,
            }),
            data_quality: item.data_quality,
            methodology: format!(
                "{:.1} {} x EPA CO2/CH4/N2O factors, AR6 GWPs",
                effective_qty, factor.unit
            ),
            source: STATIONARY_SOURCE.to_string(),
        });
    }
}

fn mobile_combustion(facility: &FacilityProfile, factors: &FactorSet, out: &mut ScopeOutput) {
    for group in &facility.fleet {
        if group.fuel_type == FleetFuel::Ev {
            // EV charging shows up through the electricity line (Scope 2).
            continue;
        }
        let total_miles = group.count as f64 * group.annual_miles_per_vehicle;
        if total_miles <= 0.0 {
            continue;
        }

        // Hybrids burn gasoline; their CO2 is scaled down empirically.
        let factor_fuel = match group.fuel_type {
            FleetFuel::Diesel => FleetFuel::Diesel,
            _ => FleetFuel::Gasoline,
        };
        let Some(&co2_kg_per_gallon) = factors.mobile.co2_kg_per_gallon.get(&factor_fuel) else {
            warn!(fuel = factor_fuel.key(), "no mobile CO2 factor, group skipped");
            out.note_gap(format!("no mobile CO2 factor for {}", factor_fuel.key()));
            continue;
        };

        let mpg = group
            .fuel_efficiency_mpg
            .or_else(|| factors.mobile.default_mpg_for(group.vehicle_type, group.fuel_type))
            .or_else(|| factors.mobile.default_mpg_for(group.vehicle_type, factor_fuel))
            .unwrap_or(FALLBACK_MPG);
        let gallons = total_miles / mpg;

        let mut co2_t = gallons * co2_kg_per_gallon / 1000.0;
        if group.fuel_type == FleetFuel::Hybrid {
            co2_t *= HYBRID_CO2_SCALAR;
        }

        // CH4 and N2O are distance-based, not fuel-based.
        let gas = factors
            .mobile
            .gas_factors_for(group.vehicle_type, factor_fuel)
            .unwrap_or_else(|| {
                debug!(
                    vehicle = group.vehicle_type.key(),
                    fuel = factor_fuel.key(),
                    "no CH4/N2O mobile factors, using zero"
                );
                crate::factors::tables::MobileGasFactor {
                    ch4_g_per_mile: 0.0,
                    n2o_g_per_mile: 0.0,
                }
            });
        let ch4_t = total_miles * gas.ch4_g_per_mile * GWP_CH4_FOSSIL / 1e6;
        let n2o_t = total_miles * gas.n2o_g_per_mile * GWP_N2O / 1e6;

        out.push(EmissionRow {
            scope: Scope::Scope1,
            category: "mobile_combustion".to_string(),
            subcategory: Some(group.fuel_type.key().to_string()),
            label: format!(
                "{} x {} ({})",
                group.count,
                group.vehicle_type.key(),
                group.fuel_type.key()
            ),
            value_t: co2_t + ch4_t + n2o_t,
            components: Some(GasComponents {
                co2_t,
                ch4_t_co2e: ch4_t,
                n2o_t_co2e: n2o_t,
            }),
            data_quality: group.data_quality,
            methodology: format!(
                "{:.0} mi at {:.1} mpg = {:.1} gal; CH4/N2O per mile",
                total_miles, mpg, gallons
            ),
            source: MOBILE_SOURCE.to_string(),
        });
    }
}

fn fugitive_refrigerants(facility: &FacilityProfile, factors: &FactorSet, out: &mut ScopeOutput) {
    for entry in &facility.refrigerants {
        if entry.charge_kg <= 0.0 {
            continue;
        }
        let gwp = match factors.gwp_for(&entry.refrigerant) {
            Ok(gwp) => gwp,
            Err(_) => {
                warn!(gas = %entry.refrigerant, "unknown refrigerant, row skipped");
                out.note_gap(format!(
                    "unknown refrigerant {} skipped (no AR6 GWP)",
                    entry.refrigerant
                ));
                continue;
            }
        };
        let leak_rate = if entry.leak_rate > 0.0 {
            entry.leak_rate
        } else {
            factors.default_leak_rate(entry.equipment_type.as_deref())
        };

        let value_t = entry.charge_kg * leak_rate * gwp / 1000.0;
        out.push(EmissionRow {
            scope: Scope::Scope1,
            category: "fugitive_refrigerants".to_string(),
            subcategory: Some(entry.refrigerant.clone()),
            label: entry.refrigerant.clone(),
            value_t,
            components: None,
            data_quality: entry.data_quality,
            methodology: format!(
                "{:.1} kg charge x {:.1}% annual leak x GWP {:.0}",
                entry.charge_kg,
                leak_rate * 100.0,
                gwp
            ),
            source: REFRIGERANT_SOURCE.to_string(),
        });
    }
}
