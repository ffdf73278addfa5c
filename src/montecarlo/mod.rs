//! Monte Carlo propagation of input and factor uncertainty (IPCC Tier 2).
//!
//! Every simulation consumes a single RNG stream. Within each run the
//! perturbation order is canonical and part of the reproducibility contract:
//!
//! 1. energy line quantities, in `Fuel` declaration order
//! 2. refrigerants in input order (charge, then leak rate)
//! 3. fleet groups in input order (annual miles, then fuel economy)
//! 4. waste tonnages in input order
//! 5. water gallons in input order
//! 6. stationary CO2 factors, in `Fuel` declaration order
//! 7. grid subregion factors, in ascending subregion code order
//! 8. the engine call (consumes no draws)
//!
//! Reordering any of these is a breaking change and must bump
//! [`crate::constants::ENGINE_VERSION`].

pub mod rng;
pub mod spec;
pub mod stats;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::FALLBACK_MPG;
use crate::engine::{ComputeOptions, compute_all};
use crate::error::CoreError;
use crate::facility::{DataQuality, FacilityProfile, Fuel};
use crate::factors::FactorSet;

use rng::Mulberry32;
use spec::{ParameterKind, perturb};
use stats::{CategorySummary, DistributionSummary, convergence_diagnostic, summarize};

/// Convergence threshold on the running-mean diagnostic.
const CONVERGENCE_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub runs: usize,
    pub seed: u32,
    pub confidence_level: f64,
    pub histogram_bins: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runs: 1000,
            seed: 42,
            confidence_level: 0.95,
            histogram_bins: 50,
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), CoreError> {
        if self.runs < 100 {
            return Err(CoreError::MonteCarloDegenerate { runs: self.runs });
        }
        if self.runs > 50_000 {
            return Err(CoreError::InvalidConfig(format!(
                "runs {} above the 50,000 cap",
                self.runs
            )));
        }
        if !(0.5..=0.999).contains(&self.confidence_level) {
            return Err(CoreError::InvalidConfig(format!(
                "confidence level {} outside [0.5, 0.999]",
                self.confidence_level
            )));
        }
        if !(10..=200).contains(&self.histogram_bins) {
            return Err(CoreError::InvalidConfig(format!(
                "histogram bins {} outside [10, 200]",
                self.histogram_bins
            )));
        }
        Ok(())
    }
}

/// Distributional output of one simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub runs: usize,
    pub seed: u32,
    pub total: DistributionSummary,
    pub total_market: DistributionSummary,
    pub scope1: DistributionSummary,
    pub scope2_location: DistributionSummary,
    pub scope2_market: DistributionSummary,
    pub scope3: DistributionSummary,
    /// Compact summaries per breakdown category.
    pub categories: BTreeMap<String, CategorySummary>,
    /// Running-mean coefficient of variation over the final 10% of runs.
    pub convergence_diagnostic: f64,
    /// True when the diagnostic is below 0.01.
    pub converged: bool,
    pub engine_version: String,
    pub factor_version: String,
}

/// Builds a perturbed copy of the facility, consuming RNG draws in the
/// canonical order (steps 1-5 of the module contract).
pub fn perturb_profile(facility: &FacilityProfile, rng: &mut Mulberry32) -> FacilityProfile {
    let mut working = facility.clone();

    // 1. Energy quantities, Fuel declaration order (= BTreeMap order).
    for (_, item) in working.energy.iter_mut() {
        let kind = match item.data_quality {
            DataQuality::Measured => ParameterKind::EnergyMeasured,
            _ => ParameterKind::EnergyEstimated,
        };
        item.quantity = perturb(item.quantity, kind, rng);
    }

    // 2. Refrigerants: charge then leak rate per entry. Perturbed leak rates
    //    stay physical (<= 1).
    for entry in working.refrigerants.iter_mut() {
        entry.charge_kg = perturb(entry.charge_kg, ParameterKind::RefrigerantCharge, rng);
        entry.leak_rate =
            perturb(entry.leak_rate, ParameterKind::RefrigerantLeakRate, rng).min(1.0);
    }

    // 3. Fleet: miles then fuel economy per group. Groups without an economy
    //    override are resolved to their default first so the perturbation
    //    applies to the value the engine would use.
    for group in working.fleet.iter_mut() {
        group.annual_miles_per_vehicle =
            perturb(group.annual_miles_per_vehicle, ParameterKind::FleetMileage, rng);
        let mpg = group.fuel_efficiency_mpg.unwrap_or(FALLBACK_MPG);
        group.fuel_efficiency_mpg =
            Some(perturb(mpg, ParameterKind::FleetFuelEconomy, rng).max(0.1));
    }

    // 4. Waste.
    for entry in working.waste.iter_mut() {
        entry.annual_tonnes = perturb(entry.annual_tonnes, ParameterKind::WasteQuantity, rng);
    }

    // 5. Water.
    for entry in working.water.iter_mut() {
        entry.annual_gallons = perturb(entry.annual_gallons, ParameterKind::WaterQuantity, rng);
    }

    working
}

/// Builds a perturbed copy of the factor set (steps 6-7 of the module
/// contract). GWPs are fixed constants and never touched.
pub fn perturb_factors(factors: &FactorSet, rng: &mut Mulberry32) -> FactorSet {
    let mut working = factors.clone();

    // 6. Stationary CO2 factors, Fuel declaration order.
    for fuel in Fuel::ALL {
        if let Some(factor) = working.stationary.get_mut(&fuel) {
            factor.co2_kg_per_unit =
                perturb(factor.co2_kg_per_unit, ParameterKind::StationaryEf, rng);
        }
    }

    // 7. Grid subregion factors, ascending code order.
    for (_, subregion) in working.grid.subregions.iter_mut() {
        subregion.kg_co2e_per_kwh =
            perturb(subregion.kg_co2e_per_kwh, ParameterKind::GridEf, rng);
    }

    working
}

/// Runs the seeded simulation and aggregates distributional statistics.
pub fn run_monte_carlo(
    facility: &FacilityProfile,
    factors: &FactorSet,
    config: &SimulationConfig,
) -> Result<SimulationResult, CoreError> {
    config.validate()?;
    facility.validate()?;

    // Fleet economy defaults are resolved against the factor table once, so
    // the perturbation applies to the same mpg the engine would pick.
    let mut resolved = facility.clone();
    for group in resolved.fleet.iter_mut() {
        if group.fuel_efficiency_mpg.is_none() {
            group.fuel_efficiency_mpg = factors
                .mobile
                .default_mpg_for(group.vehicle_type, group.fuel_type)
                .or_else(|| {
                    let fallback_fuel = match group.fuel_type {
                        crate::facility::FleetFuel::Diesel => crate::facility::FleetFuel::Diesel,
                        _ => crate::facility::FleetFuel::Gasoline,
                    };
                    factors.mobile.default_mpg_for(group.vehicle_type, fallback_fuel)
                });
        }
    }

    let options = ComputeOptions {
        include_scope3: true,
        include_estimation: true,
    };
    let mut rng = Mulberry32::new(config.seed);

    let n = config.runs;
    let mut totals = Vec::with_capacity(n);
    let mut totals_market = Vec::with_capacity(n);
    let mut scope1 = Vec::with_capacity(n);
    let mut scope2_location = Vec::with_capacity(n);
    let mut scope2_market = Vec::with_capacity(n);
    let mut scope3 = Vec::with_capacity(n);
    let mut categories: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for run in 0..n {
        let profile = perturb_profile(&resolved, &mut rng);
        let run_factors = perturb_factors(factors, &mut rng);
        // 8. Engine call; consumes no draws.
        let result = compute_all(&profile, &run_factors, &options)?;

        totals.push(result.total_location_t);
        totals_market.push(result.total_market_t);
        scope1.push(result.scope1_t);
        scope2_location.push(result.scope2_location_t);
        scope2_market.push(result.scope2_market_t);
        scope3.push(result.scope3_t);

        let mut run_categories: BTreeMap<&str, f64> = BTreeMap::new();
        for row in &result.breakdown {
            *run_categories.entry(row.category.as_str()).or_insert(0.0) += row.value_t;
        }
        for (category, value) in run_categories {
            categories
                .entry(category.to_string())
                .or_insert_with(|| vec![0.0; run])
                .push(value);
        }
        // Categories that produced no row this run still need a sample.
        for samples in categories.values_mut() {
            if samples.len() == run {
                samples.push(0.0);
            }
        }
    }

    let diagnostic = convergence_diagnostic(&totals);
    if diagnostic >= 0.05 {
        warn!(diagnostic, runs = n, "monte carlo did not converge");
    }

    let conf = config.confidence_level;
    let bins = config.histogram_bins;
    let alpha = (1.0 - conf) / 2.0;
    let category_summaries = categories
        .into_iter()
        .map(|(category, mut samples)| {
            samples.sort_by(|a, b| a.partial_cmp(b).expect("non-finite sample"));
            let summary = CategorySummary {
                mean: stats::mean(&samples),
                ci_lower: stats::percentile_sorted(&samples, alpha),
                ci_upper: stats::percentile_sorted(&samples, 1.0 - alpha),
            };
            (category, summary)
        })
        .collect();

    Ok(SimulationResult {
        runs: n,
        seed: config.seed,
        total: summarize(&totals, conf, bins),
        total_market: summarize(&totals_market, conf, bins),
        scope1: summarize(&scope1, conf, bins),
        scope2_location: summarize(&scope2_location, conf, bins),
        scope2_market: summarize(&scope2_market, conf, bins),
        scope3: summarize(&scope3, conf, bins),
        categories: category_summaries,
        convergence_diagnostic: diagnostic,
        converged: diagnostic < CONVERGENCE_THRESHOLD,
        engine_version: crate::constants::ENGINE_VERSION.to_string(),
        factor_version: factors.version.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::{
        BuildingType, DataQuality, EnergyLineItem, EnergyUnit, FleetFuel, FleetGroup,
        RefrigerantEntry, VehicleType, WasteEntry, WaterEntry,
    };
    use crate::factors::FactorRegistry;

    fn fixture() -> FacilityProfile {
        let mut f = FacilityProfile::new("f", BuildingType::Office, 50_000.0);
        f.state = Some("NY".to_string());
        f.energy.insert(
            Fuel::Electricity,
            EnergyLineItem::annual(500_000.0, EnergyUnit::Kwh, DataQuality::Measured),
        );
        f.energy.insert(
            Fuel::NaturalGas,
            EnergyLineItem::annual(20_000.0, EnergyUnit::Therms, DataQuality::Measured),
        );
        f.refrigerants.push(RefrigerantEntry {
            refrigerant: "R-410A".to_string(),
            charge_kg: 100.0,
            leak_rate: 0.10,
            equipment_type: None,
            data_quality: DataQuality::Measured,
        });
        f.fleet.push(FleetGroup {
            vehicle_type: VehicleType::PassengerCar,
            fuel_type: FleetFuel::Gasoline,
            count: 10,
            annual_miles_per_vehicle: 12_000.0,
            fuel_efficiency_mpg: Some(24.0),
            data_quality: DataQuality::Measured,
        });
        f.waste.push(WasteEntry {
            waste_type: "mixed_msw".to_string(),
            disposal_method: "landfill".to_string(),
            annual_tonnes: 50.0,
            data_quality: DataQuality::Measured,
        });
        f.water.push(WaterEntry {
            source: "municipal".to_string(),
            annual_gallons: 500_000.0,
            treatment_type: None,
            data_quality: DataQuality::Measured,
        });
        f
    }

    #[test]
    fn test_config_bounds() {
        let bad_runs = SimulationConfig {
            runs: 99,
            ..Default::default()
        };
        assert!(matches!(
            bad_runs.validate(),
            Err(CoreError::MonteCarloDegenerate { runs: 99 })
        ));
        let too_many = SimulationConfig {
            runs: 50_001,
            ..Default::default()
        };
        assert!(too_many.validate().is_err());
        let bad_conf = SimulationConfig {
            confidence_level: 0.3,
            ..Default::default()
        };
        assert!(bad_conf.validate().is_err());
        let bad_bins = SimulationConfig {
            histogram_bins: 5,
            ..Default::default()
        };
        assert!(bad_bins.validate().is_err());
        assert!(SimulationConfig::default().validate().is_ok());
    }

    /// Canonical perturbation order fixture. Any refactor that changes the
    /// draw sequence fails here and requires an engine version bump.
    #[test]
    fn test_canonical_perturbation_order() {
        let facility = fixture();
        let mut rng = Mulberry32::new(42);
        let perturbed = perturb_profile(&facility, &mut rng);

        // Replay the same stream by hand in the documented order.
        let mut replay = Mulberry32::new(42);
        let elec = perturb(500_000.0, ParameterKind::EnergyMeasured, &mut replay);
        let gas = perturb(20_000.0, ParameterKind::EnergyMeasured, &mut replay);
        let charge = perturb(100.0, ParameterKind::RefrigerantCharge, &mut replay);
        let leak = perturb(0.10, ParameterKind::RefrigerantLeakRate, &mut replay).min(1.0);
        let miles = perturb(12_000.0, ParameterKind::FleetMileage, &mut replay);
        let mpg = perturb(24.0, ParameterKind::FleetFuelEconomy, &mut replay).max(0.1);
        let tonnes = perturb(50.0, ParameterKind::WasteQuantity, &mut replay);
        let gallons = perturb(500_000.0, ParameterKind::WaterQuantity, &mut replay);

        let elec_item = perturbed.energy.get(&Fuel::Electricity).unwrap();
        let gas_item = perturbed.energy.get(&Fuel::NaturalGas).unwrap();
        assert_eq!(elec_item.quantity.to_bits(), elec.to_bits());
        assert_eq!(gas_item.quantity.to_bits(), gas.to_bits());
        assert_eq!(perturbed.refrigerants[0].charge_kg.to_bits(), charge.to_bits());
        assert_eq!(perturbed.refrigerants[0].leak_rate.to_bits(), leak.to_bits());
        assert_eq!(
            perturbed.fleet[0].annual_miles_per_vehicle.to_bits(),
            miles.to_bits()
        );
        assert_eq!(
            perturbed.fleet[0].fuel_efficiency_mpg.unwrap().to_bits(),
            mpg.to_bits()
        );
        assert_eq!(perturbed.waste[0].annual_tonnes.to_bits(), tonnes.to_bits());
        assert_eq!(perturbed.water[0].annual_gallons.to_bits(), gallons.to_bits());
    }

    #[test]
    fn test_factor_perturbation_preserves_caller_copy() {
        let factors = FactorRegistry::load().unwrap();
        let before = factors
            .stationary
            .get(&Fuel::NaturalGas)
            .unwrap()
            .co2_kg_per_unit;
        let mut rng = Mulberry32::new(42);
        let perturbed = perturb_factors(&factors, &mut rng);
        assert!(
            (factors
                .stationary
                .get(&Fuel::NaturalGas)
                .unwrap()
                .co2_kg_per_unit
                - before)
                .abs()
                < 1e-15
        );
        // The perturbed copy differs (normal with 1% CV essentially never
        // returns the exact input).
        assert!(
            (perturbed
                .stationary
                .get(&Fuel::NaturalGas)
                .unwrap()
                .co2_kg_per_unit
                - before)
                .abs()
                > 0.0
        );
    }

    #[test]
    fn test_gwps_never_perturbed() {
        let factors = FactorRegistry::load().unwrap();
        let mut rng = Mulberry32::new(42);
        let perturbed = perturb_factors(&factors, &mut rng);
        for (name, gas) in &factors.refrigerants.gases {
            let after = perturbed.refrigerants.gases.get(name).unwrap();
            assert_eq!(gas.gwp100.to_bits(), after.gwp100.to_bits());
        }
    }

    #[test]
    fn test_seeded_reproducibility() {
        let factors = FactorRegistry::load().unwrap();
        let facility = fixture();
        let config = SimulationConfig {
            runs: 200,
            ..Default::default()
        };
        let a = run_monte_carlo(&facility, &factors, &config).unwrap();
        let b = run_monte_carlo(&facility, &factors, &config).unwrap();
        assert_eq!(a.total, b.total);
        assert_eq!(a.scope1, b.scope1);
        assert_eq!(a.scope2_location, b.scope2_location);
        assert_eq!(a.scope3, b.scope3);
        assert_eq!(a.categories, b.categories);
        assert_eq!(
            a.convergence_diagnostic.to_bits(),
            b.convergence_diagnostic.to_bits()
        );
    }

    #[test]
    fn test_different_seeds_differ() {
        let factors = FactorRegistry::load().unwrap();
        let facility = fixture();
        let a = run_monte_carlo(
            &facility,
            &factors,
            &SimulationConfig {
                runs: 150,
                seed: 1,
                ..Default::default()
            },
        )
        .unwrap();
        let b = run_monte_carlo(
            &facility,
            &factors,
            &SimulationConfig {
                runs: 150,
                seed: 2,
                ..Default::default()
            },
        )
        .unwrap();
        assert!((a.total.mean - b.total.mean).abs() > 0.0);
    }

    #[test]
    fn test_summary_orderings_hold() {
        let factors = FactorRegistry::load().unwrap();
        let facility = fixture();
        let r = run_monte_carlo(&facility, &factors, &SimulationConfig::default()).unwrap();
        let s = &r.total;
        assert!(s.ci_lower < s.mean && s.mean < s.ci_upper);
        assert!(s.p5 <= s.p25 && s.p25 <= s.median && s.median <= s.p75 && s.p75 <= s.p95);
        assert!(r.convergence_diagnostic < 0.01);
        assert!(r.converged);
        assert_eq!(s.histogram.counts.iter().sum::<u32>() as usize, r.runs);
    }

    #[test]
    fn test_category_samples_cover_all_runs() {
        let factors = FactorRegistry::load().unwrap();
        let facility = fixture();
        let r = run_monte_carlo(
            &facility,
            &factors,
            &SimulationConfig {
                runs: 120,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(r.categories.contains_key("stationary_combustion"));
        assert!(r.categories.contains_key("grid_electricity_location"));
        assert!(r.categories.contains_key("scope3_cat5"));
        for summary in r.categories.values() {
            assert!(summary.ci_lower <= summary.mean && summary.mean <= summary.ci_upper);
        }
    }
}
