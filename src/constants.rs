//! Physical constants, unit conversions, and engine provenance strings.

/// Engine version. Bump on any change to the canonical Monte Carlo
/// perturbation order (it is part of the seed-reproducibility contract).
pub const ENGINE_VERSION: &str = "1.0.0";

/// Version stamp of the bundled reference tables.
pub const FACTOR_VERSION: &str = "epa-2025_egrid-2023_defra-2024_ar6";

/// Default first year of scenario trajectories (factor vintage year).
/// The core has no clock; callers may override via `ScenarioConfig`.
pub const BASE_YEAR: u16 = 2025;

/// GWP-100 of fossil methane (IPCC AR6).
pub const GWP_CH4_FOSSIL: f64 = 29.8;
/// GWP-100 of nitrous oxide (IPCC AR6).
pub const GWP_N2O: f64 = 273.0;

/// MMBtu per kWh of electricity (site energy).
pub const MMBTU_PER_KWH: f64 = 0.003412;
/// Therms per MMBtu.
pub const THERMS_PER_MMBTU: f64 = 10.0;
/// MMBtu per therm of natural gas.
pub const MMBTU_PER_THERM: f64 = 0.1;
/// Metric tonnes per US short ton.
pub const TONNES_PER_SHORT_TON: f64 = 0.9072;

/// US national average grid factor in kg CO2e/kWh, used when no subregion,
/// state, or country can be resolved.
pub const US_NATIONAL_AVG_GRID_KG_PER_KWH: f64 = 0.3716;
/// Default transmission & distribution gross loss in percent.
pub const DEFAULT_GRID_LOSS_PCT: f64 = 5.0;

/// CO2 scalar for hybrid vehicles running on gasoline factors.
pub const HYBRID_CO2_SCALAR: f64 = 0.70;
/// Fleet fuel economy in mpg when neither an override nor a default applies.
pub const FALLBACK_MPG: f64 = 25.0;
/// Refrigerant annual leak rate when neither the input nor the equipment
/// default table provides one.
pub const FALLBACK_LEAK_RATE: f64 = 0.05;

/// Commuting working days per year unless the commute profile overrides.
pub const DEFAULT_WORKING_DAYS: f64 = 250.0;

/// Scope 3 fallback emission factors for unknown table keys.
pub const FALLBACK_SPEND_KG_PER_USD: f64 = 0.30;
pub const FALLBACK_TRANSPORT_KG_PER_TON_MILE: f64 = 0.1616;
pub const FALLBACK_TRAVEL_KG_PER_PAX_MILE: f64 = 0.137;
pub const FALLBACK_WASTE_T_PER_SHORT_TON: f64 = 0.52;

/// Grid projection fallback factor (kg CO2e/kWh) when the EIA table has no
/// entry for the requested year nor for 2035.
pub const FALLBACK_PROJECTED_GRID_EF: f64 = 0.224;
/// Terminal year of the bundled EIA grid projection.
pub const GRID_PROJECTION_LAST_YEAR: u16 = 2035;

/// Estimator defaults when a building type has no benchmark row
/// (office-grade intensity).
pub const DEFAULT_ELECTRIC_KWH_PER_SQFT: f64 = 14.6;
pub const DEFAULT_GAS_THERMS_PER_SQFT: f64 = 0.18;
