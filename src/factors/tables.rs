use std::collections::BTreeMap;

use crate::constants::{DEFAULT_GRID_LOSS_PCT, FALLBACK_LEAK_RATE};
use crate::error::CoreError;
use crate::facility::{BuildingType, FacilityProfile, FleetFuel, Fuel, VehicleType};

/// Quartile triple of a benchmark distribution.
#[derive(Debug, Clone, Copy)]
pub struct Quartiles {
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
}

/// Stationary combustion factors for one fuel.
#[derive(Debug, Clone)]
pub struct StationaryFactor {
    pub co2_kg_per_unit: f64,
    pub ch4_g_per_unit: f64,
    pub n2o_g_per_unit: f64,
    /// Native factor unit ("mmbtu" or "gallon").
    pub unit: String,
    /// Set when the input unit differs from the factor unit
    /// (natural gas: therms -> MMBtu).
    pub heat_content_mmbtu_per_native: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct MobileGasFactor {
    pub ch4_g_per_mile: f64,
    pub n2o_g_per_mile: f64,
}

/// Mobile combustion factor tables keyed by vehicle and fuel type.
#[derive(Debug, Clone)]
pub struct MobileFactors {
    pub co2_kg_per_gallon: BTreeMap<FleetFuel, f64>,
    pub gas_g_per_mile: BTreeMap<(VehicleType, FleetFuel), MobileGasFactor>,
    pub default_mpg: BTreeMap<(VehicleType, FleetFuel), f64>,
}

impl MobileFactors {
    pub fn default_mpg_for(&self, vehicle: VehicleType, fuel: FleetFuel) -> Option<f64> {
        self.default_mpg.get(&(vehicle, fuel)).copied()
    }

    pub fn gas_factors_for(
        &self,
        vehicle: VehicleType,
        fuel: FleetFuel,
    ) -> Option<MobileGasFactor> {
        self.gas_g_per_mile.get(&(vehicle, fuel)).copied()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GridSubregionFactor {
    pub kg_co2e_per_kwh: f64,
    pub grid_gross_loss_pct: f64,
}

/// Grid electricity factors: eGRID subregions, state mapping, international
/// country averages.
#[derive(Debug, Clone)]
pub struct GridFactors {
    pub subregions: BTreeMap<String, GridSubregionFactor>,
    pub state_to_subregion: BTreeMap<String, String>,
    pub international: BTreeMap<String, f64>,
    pub us_national_average_kg_per_kwh: f64,
    pub default_loss_pct: f64,
}

#[derive(Debug, Clone)]
pub struct GwpEntry {
    pub gwp100: f64,
    pub common_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefrigerantFactors {
    pub gases: BTreeMap<String, GwpEntry>,
    pub default_leak_rates: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct WttFactor {
    pub kg_co2e_per_unit: f64,
    pub unit: String,
}

/// Scope 3 factor tables.
#[derive(Debug, Clone)]
pub struct Scope3Factors {
    pub travel_kg_per_pax_mile: BTreeMap<String, f64>,
    pub commute_kg_per_mile: BTreeMap<String, f64>,
    pub transport_kg_per_ton_mile: BTreeMap<String, f64>,
    pub spend_kg_per_usd: BTreeMap<String, f64>,
    pub spend_default_kg_per_usd: f64,
    pub wtt: BTreeMap<Fuel, WttFactor>,
}

#[derive(Debug, Clone, Copy)]
pub struct WaterFactors {
    pub supply_kg_per_1000_gal: f64,
    pub treatment_kg_per_1000_gal: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct FuelSplit {
    pub electricity: f64,
    pub natural_gas: f64,
}

/// CBECS benchmark row for one building type.
#[derive(Debug, Clone)]
pub struct BuildingBenchmark {
    pub eui_kbtu_per_sqft: Quartiles,
    pub fuel_split: FuelSplit,
    pub kg_co2e_per_sqft: Quartiles,
}

#[derive(Debug, Clone, Copy)]
pub struct DegreeDays {
    pub hdd65: f64,
    pub cdd65: f64,
}

/// ASHRAE climate zone table with per-state defaults.
#[derive(Debug, Clone)]
pub struct ClimateTable {
    pub zones: BTreeMap<String, DegreeDays>,
    /// Reference zone for the climate adjustment ratio (4A).
    pub base_zone: String,
    pub state_default_zone: BTreeMap<String, String>,
}

/// Result of the grid-factor resolution chain.
#[derive(Debug, Clone)]
pub struct GridResolution {
    pub kg_co2e_per_kwh: f64,
    pub loss_pct: f64,
    /// Resolved subregion code, when the chain ended at one.
    pub subregion: Option<String>,
    /// Human-readable provenance for the methodology record.
    pub source: String,
}

/// Versioned, immutable bundle of every reference table the engine consumes.
///
/// Built once by [`crate::factors::FactorRegistry::load`]; the engine clones
/// it for Monte Carlo perturbation and never mutates the caller's copy.
#[derive(Debug, Clone)]
pub struct FactorSet {
    pub version: String,
    pub stationary: BTreeMap<Fuel, StationaryFactor>,
    pub mobile: MobileFactors,
    pub grid: GridFactors,
    pub refrigerants: RefrigerantFactors,
    pub scope3: Scope3Factors,
    /// Keyed by `{waste_type}_{disposal_method}`.
    pub waste_t_per_short_ton: BTreeMap<String, f64>,
    pub water: WaterFactors,
    pub benchmarks: BTreeMap<BuildingType, BuildingBenchmark>,
    pub climate: ClimateTable,
    /// EIA national grid projection, year -> kg CO2e/kWh.
    pub grid_projection: BTreeMap<u16, f64>,
}

impl FactorSet {
    /// Maps a US state code to its dominant eGRID subregion.
    /// Case-insensitive; `None` for unknown states.
    pub fn state_to_subregion(&self, state: &str) -> Option<&str> {
        let key = state.trim().to_ascii_uppercase();
        self.grid.state_to_subregion.get(&key).map(|s| s.as_str())
    }

    /// Grid factor for a US state, falling back to the national average when
    /// the state (or its subregion) is unknown.
    pub fn grid_factor_for_state(&self, state: &str) -> f64 {
        self.state_to_subregion(state)
            .and_then(|sub| self.grid.subregions.get(sub))
            .map(|f| f.kg_co2e_per_kwh)
            .unwrap_or(self.grid.us_national_average_kg_per_kwh)
    }

    /// GWP-100 lookup by formal name or common name (case-insensitive).
    pub fn gwp_for(&self, refrigerant: &str) -> Result<f64, CoreError> {
        let wanted = refrigerant.trim();
        if let Some(entry) = self.gases_lookup(wanted) {
            return Ok(entry.gwp100);
        }
        Err(CoreError::UnknownRefrigerant(wanted.to_string()))
    }

    fn gases_lookup(&self, name: &str) -> Option<&GwpEntry> {
        if let Some(entry) = self.refrigerants.gases.get(name) {
            return Some(entry);
        }
        self.refrigerants.gases.iter().find_map(|(key, entry)| {
            let formal = key.eq_ignore_ascii_case(name);
            let common = entry
                .common_name
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(name));
            (formal || common).then_some(entry)
        })
    }

    /// Default annual leak rate for an equipment category, with the global
    /// fallback when the category is unknown or absent.
    pub fn default_leak_rate(&self, equipment_type: Option<&str>) -> f64 {
        equipment_type
            .and_then(|e| {
                self.refrigerants
                    .default_leak_rates
                    .get(&e.trim().to_ascii_lowercase())
            })
            .copied()
            .unwrap_or(FALLBACK_LEAK_RATE)
    }

    /// Resolves the grid emission factor for a facility.
    ///
    /// Resolution order:
    /// 1) explicit eGRID subregion on the facility
    /// 2) US state -> subregion
    /// 3) country -> international table
    /// 4) US national average
    pub fn resolve_grid(&self, facility: &FacilityProfile) -> GridResolution {
        if let Some(code) = &facility.egrid_subregion {
            let key = code.trim().to_ascii_uppercase();
            if let Some(f) = self.grid.subregions.get(&key) {
                return GridResolution {
                    kg_co2e_per_kwh: f.kg_co2e_per_kwh,
                    loss_pct: f.grid_gross_loss_pct,
                    subregion: Some(key.clone()),
                    source: format!("eGRID subregion {key} (facility-specified)"),
                };
            }
        }
        if let Some(state) = &facility.state
            && let Some(sub) = self.state_to_subregion(state)
            && let Some(f) = self.grid.subregions.get(sub)
        {
            return GridResolution {
                kg_co2e_per_kwh: f.kg_co2e_per_kwh,
                loss_pct: f.grid_gross_loss_pct,
                subregion: Some(sub.to_string()),
                source: format!("eGRID subregion {sub} (state {})", state.to_ascii_uppercase()),
            };
        }
        let country_key = facility.country.trim().to_ascii_lowercase().replace(' ', "_");
        if let Some(&f) = self.grid.international.get(&country_key) {
            return GridResolution {
                kg_co2e_per_kwh: f,
                loss_pct: self.grid.default_loss_pct,
                subregion: None,
                source: format!("international grid average ({country_key})"),
            };
        }
        GridResolution {
            kg_co2e_per_kwh: self.grid.us_national_average_kg_per_kwh,
            loss_pct: DEFAULT_GRID_LOSS_PCT,
            subregion: None,
            source: "US national average grid factor".to_string(),
        }
    }

    /// Climate zone for a facility: explicit zone, else the state default.
    pub fn climate_zone_for(&self, facility: &FacilityProfile) -> Option<&str> {
        if let Some(zone) = &facility.climate_zone {
            let key = zone.trim().to_ascii_uppercase();
            if let Some((k, _)) = self.climate.zones.get_key_value(&key) {
                return Some(k.as_str());
            }
        }
        facility
            .state
            .as_deref()
            .and_then(|s| {
                self.climate
                    .state_default_zone
                    .get(&s.trim().to_ascii_uppercase())
            })
            .map(|z| z.as_str())
    }

    /// Projected national grid factor for a year, falling back to the final
    /// projection year and then to a fixed constant.
    pub fn projected_grid_ef(&self, year: u16) -> f64 {
        self.grid_projection
            .get(&year)
            .or_else(|| {
                self.grid_projection
                    .get(&crate::constants::GRID_PROJECTION_LAST_YEAR)
            })
            .copied()
            .unwrap_or(crate::constants::FALLBACK_PROJECTED_GRID_EF)
    }
}

#[cfg(test)]
mod tests {
    use crate::facility::{BuildingType, FacilityProfile};
    use crate::factors::FactorRegistry;

    #[test]
    fn test_state_to_subregion_case_insensitive() {
        let factors = FactorRegistry::load().unwrap();
        assert_eq!(factors.state_to_subregion("ny"), Some("NYCW"));
        assert_eq!(factors.state_to_subregion("NY"), Some("NYCW"));
        assert_eq!(factors.state_to_subregion("TX"), Some("ERCT"));
        assert_eq!(factors.state_to_subregion("ZZ"), None);
    }

    #[test]
    fn test_grid_factor_for_unknown_state_is_national_average() {
        let factors = FactorRegistry::load().unwrap();
        let f = factors.grid_factor_for_state("ZZ");
        assert!((f - factors.grid.us_national_average_kg_per_kwh).abs() < 1e-12);
    }

    #[test]
    fn test_gwp_by_formal_and_common_name() {
        let factors = FactorRegistry::load().unwrap();
        let by_formal = factors.gwp_for("HFC-134a").unwrap();
        let by_common = factors.gwp_for("R-134a").unwrap();
        assert!((by_formal - by_common).abs() < 1e-12);
        assert!((factors.gwp_for("R-410A").unwrap() - 2256.0).abs() < 1e-12);
        assert!(factors.gwp_for("R-9999").is_err());
    }

    #[test]
    fn test_resolve_grid_explicit_subregion_wins() {
        let factors = FactorRegistry::load().unwrap();
        let mut f = FacilityProfile::new("f", BuildingType::Office, 1000.0);
        f.state = Some("TX".to_string());
        f.egrid_subregion = Some("camx".to_string());
        let r = factors.resolve_grid(&f);
        assert_eq!(r.subregion.as_deref(), Some("CAMX"));
        assert!((r.kg_co2e_per_kwh - 0.2093).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_grid_country_fallback() {
        let factors = FactorRegistry::load().unwrap();
        let mut f = FacilityProfile::new("f", BuildingType::Office, 1000.0);
        f.country = "United Kingdom".to_string();
        let r = factors.resolve_grid(&f);
        assert!(r.subregion.is_none());
        assert!((r.kg_co2e_per_kwh - 0.21).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_grid_national_average_last_resort() {
        let factors = FactorRegistry::load().unwrap();
        let mut f = FacilityProfile::new("f", BuildingType::Office, 1000.0);
        f.country = "Atlantis".to_string();
        let r = factors.resolve_grid(&f);
        assert!((r.kg_co2e_per_kwh - 0.3716).abs() < 1e-12);
        assert!((r.loss_pct - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_leak_rate_fallback_chain() {
        let factors = FactorRegistry::load().unwrap();
        assert!((factors.default_leak_rate(Some("chiller")) - 0.10).abs() < 1e-12);
        assert!((factors.default_leak_rate(Some("unknown_gear")) - 0.05).abs() < 1e-12);
        assert!((factors.default_leak_rate(None) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_projected_grid_ef_fallback() {
        let factors = FactorRegistry::load().unwrap();
        assert!((factors.projected_grid_ef(2030) - 0.283).abs() < 1e-12);
        // Past the table: the 2035 value.
        assert!((factors.projected_grid_ef(2050) - 0.224).abs() < 1e-12);
    }
}
