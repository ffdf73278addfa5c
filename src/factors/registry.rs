use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::constants::FACTOR_VERSION;
use crate::facility::{BuildingType, FleetFuel, Fuel, VehicleType};

use super::tables::{
    BuildingBenchmark, ClimateTable, DegreeDays, FactorSet, FuelSplit, GridFactors,
    GridSubregionFactor, GwpEntry, MobileFactors, MobileGasFactor, Quartiles, RefrigerantFactors,
    Scope3Factors, StationaryFactor, WaterFactors, WttFactor,
};

const EPA_JSON: &str = include_str!("data/epa-emission-factors-2025.json");
const EGRID_JSON: &str = include_str!("data/egrid-subregions-2023.json");
const GWP_JSON: &str = include_str!("data/ipcc-ar6-gwp100.json");
const CBECS_JSON: &str = include_str!("data/cbecs-2018-benchmarks.json");
const ASHRAE_JSON: &str = include_str!("data/ashrae-climate-zones.json");
const SPEND_JSON: &str = include_str!("data/scope3-spend-factors.json");
const EIA_JSON: &str = include_str!("data/grid-projection-eia.json");

/// Assembles the embedded reference tables into one [`FactorSet`].
///
/// Deterministic: same binary, same bytes. The embedded data is validated at
/// load time so a malformed bundle fails loudly rather than producing zeros.
pub struct FactorRegistry;

impl FactorRegistry {
    pub fn load() -> Result<FactorSet> {
        let epa: EpaFile =
            serde_json::from_str(EPA_JSON).context("parsing EPA emission factors")?;
        let egrid: EgridFile =
            serde_json::from_str(EGRID_JSON).context("parsing eGRID subregions")?;
        let gwp: GwpFile = serde_json::from_str(GWP_JSON).context("parsing AR6 GWP table")?;
        let cbecs: BTreeMap<String, RawBenchmark> =
            serde_json::from_str(CBECS_JSON).context("parsing CBECS benchmarks")?;
        let ashrae: AshraeFile =
            serde_json::from_str(ASHRAE_JSON).context("parsing ASHRAE climate zones")?;
        let spend: SpendFile =
            serde_json::from_str(SPEND_JSON).context("parsing spend factors")?;
        let eia: EiaFile = serde_json::from_str(EIA_JSON).context("parsing EIA grid projection")?;

        let mut stationary = BTreeMap::new();
        for (key, raw) in epa.stationary_combustion {
            let fuel = Fuel::from_key(&key)
                .with_context(|| format!("unknown stationary fuel key '{key}'"))?;
            stationary.insert(
                fuel,
                StationaryFactor {
                    co2_kg_per_unit: raw.co2_kg_per_unit,
                    ch4_g_per_unit: raw.ch4_g_per_unit,
                    n2o_g_per_unit: raw.n2o_g_per_unit,
                    unit: raw.unit,
                    heat_content_mmbtu_per_native: raw.heat_content_mmbtu_per_native,
                },
            );
        }

        let mut co2_kg_per_gallon = BTreeMap::new();
        for (key, value) in epa.mobile_combustion.co2_kg_per_gallon {
            co2_kg_per_gallon.insert(fleet_fuel_from_key(&key)?, value);
        }
        let mut gas_g_per_mile = BTreeMap::new();
        for row in epa.mobile_combustion.ch4_n2o_g_per_mile {
            gas_g_per_mile.insert(
                (
                    vehicle_type_from_key(&row.vehicle_type)?,
                    fleet_fuel_from_key(&row.fuel_type)?,
                ),
                MobileGasFactor {
                    ch4_g_per_mile: row.ch4,
                    n2o_g_per_mile: row.n2o,
                },
            );
        }
        let mut default_mpg = BTreeMap::new();
        for row in epa.mobile_combustion.default_mpg {
            default_mpg.insert(
                (
                    vehicle_type_from_key(&row.vehicle_type)?,
                    fleet_fuel_from_key(&row.fuel_type)?,
                ),
                row.mpg,
            );
        }

        let mut wtt = BTreeMap::new();
        for (key, raw) in epa.upstream_wtt {
            let fuel =
                Fuel::from_key(&key).with_context(|| format!("unknown WTT fuel key '{key}'"))?;
            wtt.insert(
                fuel,
                WttFactor {
                    kg_co2e_per_unit: raw.kg_co2e_per_unit,
                    unit: raw.unit,
                },
            );
        }

        let mut benchmarks = BTreeMap::new();
        for (key, raw) in cbecs {
            let building = building_type_from_key(&key)?;
            benchmarks.insert(
                building,
                BuildingBenchmark {
                    eui_kbtu_per_sqft: raw.eui_kbtu_per_sqft.into_quartiles(),
                    fuel_split: FuelSplit {
                        electricity: raw.fuel_split.electricity,
                        natural_gas: raw.fuel_split.natural_gas,
                    },
                    kg_co2e_per_sqft: raw.kg_co2e_per_sqft.into_quartiles(),
                },
            );
        }

        let mut grid_projection = BTreeMap::new();
        for (year, value) in eia.national_grid_ef_kg_per_kwh {
            let year: u16 = year
                .parse()
                .with_context(|| format!("bad projection year '{year}'"))?;
            grid_projection.insert(year, value);
        }

        let factors = FactorSet {
            version: FACTOR_VERSION.to_string(),
            stationary,
            mobile: MobileFactors {
                co2_kg_per_gallon,
                gas_g_per_mile,
                default_mpg,
            },
            grid: GridFactors {
                subregions: egrid
                    .subregions
                    .into_iter()
                    .map(|(code, raw)| {
                        (
                            code,
                            GridSubregionFactor {
                                kg_co2e_per_kwh: raw.kg_co2e_per_kwh,
                                grid_gross_loss_pct: raw.grid_gross_loss_pct,
                            },
                        )
                    })
                    .collect(),
                state_to_subregion: egrid.state_to_subregion,
                international: egrid.international_grid_factors,
                us_national_average_kg_per_kwh: egrid.us_national_average_kg_per_kwh,
                default_loss_pct: egrid.default_grid_gross_loss_pct,
            },
            refrigerants: RefrigerantFactors {
                gases: gwp
                    .gases
                    .into_iter()
                    .map(|(name, raw)| {
                        (
                            name,
                            GwpEntry {
                                gwp100: raw.gwp100,
                                common_name: raw.common_name,
                            },
                        )
                    })
                    .collect(),
                default_leak_rates: gwp.default_leak_rates_by_equipment,
            },
            scope3: Scope3Factors {
                travel_kg_per_pax_mile: epa.business_travel_kg_per_passenger_mile,
                commute_kg_per_mile: epa.commuting_kg_per_mile,
                transport_kg_per_ton_mile: epa.product_transport_kg_per_ton_mile,
                spend_kg_per_usd: spend.sectors,
                spend_default_kg_per_usd: spend.default_kg_per_usd,
                wtt,
            },
            waste_t_per_short_ton: epa.waste_tco2e_per_short_ton,
            water: WaterFactors {
                supply_kg_per_1000_gal: epa.water_kg_per_1000_gallons.supply,
                treatment_kg_per_1000_gal: epa.water_kg_per_1000_gallons.treatment,
            },
            benchmarks,
            climate: ClimateTable {
                zones: ashrae
                    .zones
                    .into_iter()
                    .map(|(code, raw)| {
                        (
                            code,
                            DegreeDays {
                                hdd65: raw.hdd65,
                                cdd65: raw.cdd65,
                            },
                        )
                    })
                    .collect(),
                base_zone: ashrae.base_zone,
                state_default_zone: ashrae.state_default_zone,
            },
            grid_projection,
        };

        validate(&factors)?;
        Ok(factors)
    }
}

/// Sanity checks on the assembled bundle. All factors must be finite and
/// non-negative; the climate base zone must exist.
fn validate(factors: &FactorSet) -> Result<()> {
    for (fuel, f) in &factors.stationary {
        if !(f.co2_kg_per_unit >= 0.0 && f.ch4_g_per_unit >= 0.0 && f.n2o_g_per_unit >= 0.0) {
            bail!("negative stationary factor for {}", fuel.key());
        }
    }
    for (code, f) in &factors.grid.subregions {
        if !(f.kg_co2e_per_kwh >= 0.0 && f.grid_gross_loss_pct >= 0.0) {
            bail!("negative grid factor for subregion {code}");
        }
    }
    for (state, code) in &factors.grid.state_to_subregion {
        if !factors.grid.subregions.contains_key(code) {
            bail!("state {state} maps to unknown subregion {code}");
        }
    }
    for (name, g) in &factors.refrigerants.gases {
        if !(g.gwp100 >= 0.0) {
            bail!("negative GWP for {name}");
        }
    }
    if !factors.climate.zones.contains_key(&factors.climate.base_zone) {
        bail!("climate base zone {} missing", factors.climate.base_zone);
    }
    Ok(())
}

fn fleet_fuel_from_key(key: &str) -> Result<FleetFuel> {
    match key {
        "gasoline" => Ok(FleetFuel::Gasoline),
        "diesel" => Ok(FleetFuel::Diesel),
        "ev" => Ok(FleetFuel::Ev),
        "hybrid" => Ok(FleetFuel::Hybrid),
        other => bail!("unknown fleet fuel key '{other}'"),
    }
}

fn vehicle_type_from_key(key: &str) -> Result<VehicleType> {
    match key {
        "passenger_car" => Ok(VehicleType::PassengerCar),
        "light_truck" => Ok(VehicleType::LightTruck),
        "heavy_truck" => Ok(VehicleType::HeavyTruck),
        "van" => Ok(VehicleType::Van),
        "bus" => Ok(VehicleType::Bus),
        other => bail!("unknown vehicle type key '{other}'"),
    }
}

fn building_type_from_key(key: &str) -> Result<BuildingType> {
    match key {
        "office" => Ok(BuildingType::Office),
        "warehouse" => Ok(BuildingType::Warehouse),
        "manufacturing" => Ok(BuildingType::Manufacturing),
        "data_center" => Ok(BuildingType::DataCenter),
        "hospital" => Ok(BuildingType::Hospital),
        "retail" => Ok(BuildingType::Retail),
        "education" => Ok(BuildingType::Education),
        "food_service" => Ok(BuildingType::FoodService),
        "lodging" => Ok(BuildingType::Lodging),
        other => bail!("unknown building type key '{other}'"),
    }
}

// Raw file schemas.

#[derive(Deserialize)]
struct EpaFile {
    stationary_combustion: BTreeMap<String, RawStationary>,
    mobile_combustion: RawMobile,
    upstream_wtt: BTreeMap<String, RawWtt>,
    business_travel_kg_per_passenger_mile: BTreeMap<String, f64>,
    commuting_kg_per_mile: BTreeMap<String, f64>,
    product_transport_kg_per_ton_mile: BTreeMap<String, f64>,
    waste_tco2e_per_short_ton: BTreeMap<String, f64>,
    water_kg_per_1000_gallons: RawWater,
}

#[derive(Deserialize)]
struct RawStationary {
    co2_kg_per_unit: f64,
    ch4_g_per_unit: f64,
    n2o_g_per_unit: f64,
    unit: String,
    #[serde(default)]
    heat_content_mmbtu_per_native: Option<f64>,
}

#[derive(Deserialize)]
struct RawMobile {
    co2_kg_per_gallon: BTreeMap<String, f64>,
    ch4_n2o_g_per_mile: Vec<RawMobileGas>,
    default_mpg: Vec<RawMpg>,
}

#[derive(Deserialize)]
struct RawMobileGas {
    vehicle_type: String,
    fuel_type: String,
    ch4: f64,
    n2o: f64,
}

#[derive(Deserialize)]
struct RawMpg {
    vehicle_type: String,
    fuel_type: String,
    mpg: f64,
}

#[derive(Deserialize)]
struct RawWtt {
    kg_co2e_per_unit: f64,
    unit: String,
}

#[derive(Deserialize)]
struct RawWater {
    supply: f64,
    treatment: f64,
}

#[derive(Deserialize)]
struct EgridFile {
    subregions: BTreeMap<String, RawSubregion>,
    state_to_subregion: BTreeMap<String, String>,
    international_grid_factors: BTreeMap<String, f64>,
    us_national_average_kg_per_kwh: f64,
    default_grid_gross_loss_pct: f64,
}

#[derive(Deserialize)]
struct RawSubregion {
    kg_co2e_per_kwh: f64,
    grid_gross_loss_pct: f64,
}

#[derive(Deserialize)]
struct GwpFile {
    gases: BTreeMap<String, RawGas>,
    default_leak_rates_by_equipment: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
struct RawGas {
    gwp100: f64,
    #[serde(default)]
    common_name: Option<String>,
}

#[derive(Deserialize)]
struct RawBenchmark {
    eui_kbtu_per_sqft: RawQuartiles,
    fuel_split: RawFuelSplit,
    kg_co2e_per_sqft: RawQuartiles,
}

#[derive(Deserialize)]
struct RawQuartiles {
    p25: f64,
    median: f64,
    p75: f64,
}

impl RawQuartiles {
    fn into_quartiles(self) -> Quartiles {
        Quartiles {
            p25: self.p25,
            median: self.median,
            p75: self.p75,
        }
    }
}

#[derive(Deserialize)]
struct RawFuelSplit {
    electricity: f64,
    natural_gas: f64,
}

#[derive(Deserialize)]
struct AshraeFile {
    zones: BTreeMap<String, RawDegreeDays>,
    base_zone: String,
    state_default_zone: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RawDegreeDays {
    hdd65: f64,
    cdd65: f64,
}

#[derive(Deserialize)]
struct SpendFile {
    sectors: BTreeMap<String, f64>,
    default_kg_per_usd: f64,
}

#[derive(Deserialize)]
struct EiaFile {
    national_grid_ef_kg_per_kwh: BTreeMap<String, f64>,
}
