//! Benchmark-based energy imputation for sparse inputs.
//!
//! When a facility arrives in basic mode, or without electricity data, annual
//! energy is estimated from the CBECS benchmark for its building type,
//! adjusted for climate severity (heating + cooling degree-days relative to
//! zone 4A).

use tracing::debug;

use crate::constants::{
    DEFAULT_ELECTRIC_KWH_PER_SQFT, DEFAULT_GAS_THERMS_PER_SQFT, MMBTU_PER_KWH, THERMS_PER_MMBTU,
};
use crate::facility::{DataQuality, EnergyLineItem, EnergyUnit, FacilityProfile, Fuel, InputMode};
use crate::factors::FactorSet;

/// Climate adjustment ratio bounds.
const CLIMATE_ADJUSTMENT_MIN: f64 = 0.5;
const CLIMATE_ADJUSTMENT_MAX: f64 = 2.5;

/// Result of the estimator pass: the working profile plus the assumptions it
/// introduced (empty when nothing was estimated).
#[derive(Debug, Clone)]
pub struct EstimateOutcome {
    pub facility: FacilityProfile,
    pub assumptions: Vec<String>,
    pub applied: bool,
}

/// Degree-day ratio of the facility's climate zone against the base zone,
/// clamped to [0.5, 2.5]. Returns 1.0 when the zone cannot be determined.
pub fn climate_adjustment(facility: &FacilityProfile, factors: &FactorSet) -> f64 {
    let Some(zone) = factors.climate_zone_for(facility) else {
        return 1.0;
    };
    let Some(target) = factors.climate.zones.get(zone) else {
        return 1.0;
    };
    let Some(base) = factors.climate.zones.get(&factors.climate.base_zone) else {
        return 1.0;
    };
    let base_total = base.hdd65 + base.cdd65;
    if base_total <= 0.0 {
        return 1.0;
    }
    ((target.hdd65 + target.cdd65) / base_total)
        .clamp(CLIMATE_ADJUSTMENT_MIN, CLIMATE_ADJUSTMENT_MAX)
}

fn line_is_missing(facility: &FacilityProfile, fuel: Fuel) -> bool {
    facility
        .energy
        .get(&fuel)
        .map(|e| e.normalized_annual_quantity() <= 0.0)
        .unwrap_or(true)
}

/// Fills missing electricity and natural-gas quantities from benchmarks.
///
/// Triggered by basic input mode or an absent/zero electricity line (unless
/// the caller disabled estimation). Already-populated lines are left alone.
pub fn apply_estimator_if_needed(
    facility: &FacilityProfile,
    factors: &FactorSet,
    include_estimation: bool,
) -> EstimateOutcome {
    let needs_estimation = facility.input_mode == InputMode::Basic
        || line_is_missing(facility, Fuel::Electricity);
    if !include_estimation || !needs_estimation {
        return EstimateOutcome {
            facility: facility.clone(),
            assumptions: vec![],
            applied: false,
        };
    }

    let mut working = facility.clone();
    let adjustment = climate_adjustment(facility, factors);
    let zone_label = factors
        .climate_zone_for(facility)
        .unwrap_or("undetermined")
        .to_string();

    let (elec_kwh, gas_therms) = match factors.benchmarks.get(&facility.building_type) {
        Some(bench) => {
            // Median EUI adjusted for climate, split by benchmark fuel shares.
            let eui_adjusted = bench.eui_kbtu_per_sqft.median * adjustment;
            let total_mmbtu = eui_adjusted * facility.square_feet / 1000.0;
            let elec_kwh = total_mmbtu * bench.fuel_split.electricity / MMBTU_PER_KWH;
            let gas_therms = total_mmbtu * bench.fuel_split.natural_gas * THERMS_PER_MMBTU;
            (elec_kwh, gas_therms)
        }
        None => {
            // No benchmark row: office-grade intensities.
            (
                DEFAULT_ELECTRIC_KWH_PER_SQFT * adjustment * facility.square_feet,
                DEFAULT_GAS_THERMS_PER_SQFT * adjustment * facility.square_feet,
            )
        }
    };

    let mut filled = vec![];
    if line_is_missing(facility, Fuel::Electricity) {
        working.energy.insert(
            Fuel::Electricity,
            EnergyLineItem::annual(elec_kwh.round(), EnergyUnit::Kwh, DataQuality::Estimated),
        );
        filled.push("electricity");
    }
    if line_is_missing(facility, Fuel::NaturalGas) {
        working.energy.insert(
            Fuel::NaturalGas,
            EnergyLineItem::annual(gas_therms.round(), EnergyUnit::Therms, DataQuality::Estimated),
        );
        filled.push("natural gas");
    }

    if filled.is_empty() {
        return EstimateOutcome {
            facility: working,
            assumptions: vec![],
            applied: false,
        };
    }

    debug!(
        building = facility.building_type.key(),
        zone = %zone_label,
        adjustment,
        filled = ?filled,
        "estimated energy from benchmarks"
    );

    let assumption = format!(
        "{} estimated from CBECS {} benchmarks, ASHRAE climate zone {} (adjustment {:.2})",
        filled.join(" and "),
        facility.building_type.key(),
        zone_label,
        adjustment
    );
    EstimateOutcome {
        facility: working,
        assumptions: vec![assumption],
        applied: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::{BuildingType, Period};
    use crate::factors::FactorRegistry;

    fn warehouse_tx() -> FacilityProfile {
        let mut f = FacilityProfile::new("wh", BuildingType::Warehouse, 100_000.0);
        f.state = Some("TX".to_string());
        f.input_mode = InputMode::Basic;
        f
    }

    #[test]
    fn test_estimator_fills_missing_energy() {
        let factors = FactorRegistry::load().unwrap();
        let outcome = apply_estimator_if_needed(&warehouse_tx(), &factors, true);
        assert!(outcome.applied);

        let elec = outcome.facility.energy.get(&Fuel::Electricity).unwrap();
        let gas = outcome.facility.energy.get(&Fuel::NaturalGas).unwrap();
        assert!(elec.quantity > 0.0);
        assert!(gas.quantity > 0.0);
        assert_eq!(elec.data_quality, DataQuality::Estimated);
        assert_eq!(gas.data_quality, DataQuality::Estimated);
        // Rounded to whole units.
        assert!((elec.quantity - elec.quantity.round()).abs() < 1e-9);
        assert!((gas.quantity - gas.quantity.round()).abs() < 1e-9);
        assert_eq!(outcome.assumptions.len(), 1);
    }

    #[test]
    fn test_estimator_matches_benchmark_arithmetic() {
        let factors = FactorRegistry::load().unwrap();
        let facility = warehouse_tx();
        let outcome = apply_estimator_if_needed(&facility, &factors, true);

        let bench = factors.benchmarks.get(&BuildingType::Warehouse).unwrap();
        // TX defaults to zone 2A.
        let adj = climate_adjustment(&facility, &factors);
        let total_mmbtu = bench.eui_kbtu_per_sqft.median * adj * 100_000.0 / 1000.0;
        let expected_kwh = (total_mmbtu * bench.fuel_split.electricity / MMBTU_PER_KWH).round();
        let expected_therms = (total_mmbtu * bench.fuel_split.natural_gas * 10.0).round();

        let elec = outcome.facility.energy.get(&Fuel::Electricity).unwrap();
        let gas = outcome.facility.energy.get(&Fuel::NaturalGas).unwrap();
        assert!((elec.quantity - expected_kwh).abs() < 1e-9);
        assert!((gas.quantity - expected_therms).abs() < 1e-9);
    }

    #[test]
    fn test_estimator_preserves_populated_lines() {
        let factors = FactorRegistry::load().unwrap();
        let mut f = warehouse_tx();
        f.energy.insert(
            Fuel::NaturalGas,
            EnergyLineItem {
                quantity: 5_000.0,
                unit: EnergyUnit::Therms,
                period: Period::Annual,
                data_quality: DataQuality::Measured,
                is_renewable: false,
                supplier_ef_kg_per_kwh: None,
            },
        );
        let outcome = apply_estimator_if_needed(&f, &factors, true);
        let gas = outcome.facility.energy.get(&Fuel::NaturalGas).unwrap();
        assert!((gas.quantity - 5_000.0).abs() < 1e-9);
        assert_eq!(gas.data_quality, DataQuality::Measured);
        // Electricity still filled.
        assert!(outcome.facility.energy.get(&Fuel::Electricity).unwrap().quantity > 0.0);
    }

    #[test]
    fn test_estimator_disabled_or_not_needed() {
        let factors = FactorRegistry::load().unwrap();
        let outcome = apply_estimator_if_needed(&warehouse_tx(), &factors, false);
        assert!(!outcome.applied);

        let mut advanced = FacilityProfile::new("f", BuildingType::Office, 10_000.0);
        advanced.energy.insert(
            Fuel::Electricity,
            EnergyLineItem::annual(100_000.0, EnergyUnit::Kwh, DataQuality::Measured),
        );
        let outcome = apply_estimator_if_needed(&advanced, &factors, true);
        assert!(!outcome.applied);
    }

    #[test]
    fn test_climate_adjustment_clamped_and_defaulted() {
        let factors = FactorRegistry::load().unwrap();
        let mut f = FacilityProfile::new("f", BuildingType::Office, 1000.0);
        // No state, no zone: neutral adjustment.
        assert!((climate_adjustment(&f, &factors) - 1.0).abs() < 1e-12);

        // Zone 8 vs base 4A: (13900+100)/6000 = 2.33, inside the clamp.
        f.climate_zone = Some("8".to_string());
        let adj = climate_adjustment(&f, &factors);
        assert!((adj - 14_000.0 / 6_000.0).abs() < 1e-9);
        assert!(adj <= CLIMATE_ADJUSTMENT_MAX);
    }
}
