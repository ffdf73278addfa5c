use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Commercial building type, aligned with the CBECS benchmark categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Office,
    Warehouse,
    Manufacturing,
    DataCenter,
    Hospital,
    Retail,
    Education,
    FoodService,
    Lodging,
}

impl BuildingType {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Office => "office",
            Self::Warehouse => "warehouse",
            Self::Manufacturing => "manufacturing",
            Self::DataCenter => "data_center",
            Self::Hospital => "hospital",
            Self::Retail => "retail",
            Self::Education => "education",
            Self::FoodService => "food_service",
            Self::Lodging => "lodging",
        }
    }
}

/// Input completeness mode. `Basic` activates the benchmark estimator for
/// energy quantities the user did not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Basic,
    Advanced,
    Expert,
}

/// Fuel keys for facility energy line items.
///
/// Declaration order is the canonical iteration order for deterministic
/// computation and for the Monte Carlo perturbation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fuel {
    Electricity,
    NaturalGas,
    Diesel,
    FuelOil2,
    FuelOil6,
    Propane,
    Kerosene,
}

impl Fuel {
    /// All fuels in canonical order.
    pub const ALL: [Fuel; 7] = [
        Fuel::Electricity,
        Fuel::NaturalGas,
        Fuel::Diesel,
        Fuel::FuelOil2,
        Fuel::FuelOil6,
        Fuel::Propane,
        Fuel::Kerosene,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::NaturalGas => "natural_gas",
            Self::Diesel => "diesel",
            Self::FuelOil2 => "fuel_oil_2",
            Self::FuelOil6 => "fuel_oil_6",
            Self::Propane => "propane",
            Self::Kerosene => "kerosene",
        }
    }

    pub fn from_key(key: &str) -> Option<Fuel> {
        Fuel::ALL.iter().copied().find(|f| f.key() == key)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Electricity => "Electricity",
            Self::NaturalGas => "Natural gas",
            Self::Diesel => "Diesel",
            Self::FuelOil2 => "Fuel oil No. 2",
            Self::FuelOil6 => "Fuel oil No. 6",
            Self::Propane => "Propane",
            Self::Kerosene => "Kerosene",
        }
    }

    /// Units accepted for this fuel's line item.
    pub fn expected_units(&self) -> &'static [EnergyUnit] {
        match self {
            Self::Electricity => &[EnergyUnit::Kwh],
            Self::NaturalGas => &[EnergyUnit::Therms, EnergyUnit::Mmbtu],
            _ => &[EnergyUnit::Gallons],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyUnit {
    Kwh,
    Therms,
    Mmbtu,
    Gallons,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Annual,
    Monthly,
}

/// Provenance tier of an input value. Drives the analytical uncertainty
/// weights and the data-quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Measured,
    Estimated,
    Modeled,
}

/// One annual (or monthly) energy quantity for a single fuel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyLineItem {
    /// Quantity in `unit` per `period`. Must be >= 0.
    pub quantity: f64,
    pub unit: EnergyUnit,
    pub period: Period,
    pub data_quality: DataQuality,
    /// Electricity only: covered by RECs/PPA (zero-rated market-based).
    #[serde(default)]
    pub is_renewable: bool,
    /// Electricity only: supplier-specific emission factor in kg CO2e/kWh.
    #[serde(default)]
    pub supplier_ef_kg_per_kwh: Option<f64>,
}

impl EnergyLineItem {
    pub fn annual(quantity: f64, unit: EnergyUnit, data_quality: DataQuality) -> Self {
        Self {
            quantity,
            unit,
            period: Period::Annual,
            data_quality,
            is_renewable: false,
            supplier_ef_kg_per_kwh: None,
        }
    }

    /// Quantity normalized to a yearly basis.
    pub fn normalized_annual_quantity(&self) -> f64 {
        match self.period {
            Period::Annual => self.quantity,
            Period::Monthly => self.quantity * 12.0,
        }
    }
}

/// A refrigerant charge subject to fugitive leakage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefrigerantEntry {
    /// Formal or common gas name (e.g. "R-410A", "HFC-134a").
    pub refrigerant: String,
    /// Installed charge in kg. Must be >= 0.
    pub charge_kg: f64,
    /// Annual leak fraction in [0, 1]. 0 means "use the equipment default".
    pub leak_rate: f64,
    /// Equipment category for default leak rate lookup.
    #[serde(default)]
    pub equipment_type: Option<String>,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    PassengerCar,
    LightTruck,
    HeavyTruck,
    Van,
    Bus,
}

impl VehicleType {
    pub fn key(&self) -> &'static str {
        match self {
            Self::PassengerCar => "passenger_car",
            Self::LightTruck => "light_truck",
            Self::HeavyTruck => "heavy_truck",
            Self::Van => "van",
            Self::Bus => "bus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetFuel {
    Gasoline,
    Diesel,
    Ev,
    Hybrid,
}

impl FleetFuel {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Gasoline => "gasoline",
            Self::Diesel => "diesel",
            Self::Ev => "ev",
            Self::Hybrid => "hybrid",
        }
    }
}

/// A homogeneous group of fleet vehicles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetGroup {
    pub vehicle_type: VehicleType,
    pub fuel_type: FleetFuel,
    /// Number of vehicles in the group.
    pub count: u32,
    /// Annual mileage per vehicle.
    pub annual_miles_per_vehicle: f64,
    /// User-measured fuel economy in mpg (overrides the default table).
    #[serde(default)]
    pub fuel_efficiency_mpg: Option<f64>,
    pub data_quality: DataQuality,
}

/// An annual waste stream in metric tonnes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteEntry {
    /// Material key, e.g. "mixed_msw", "paper", "food".
    pub waste_type: String,
    /// Disposal key, e.g. "landfill", "recycled", "composted", "combustion".
    pub disposal_method: String,
    pub annual_tonnes: f64,
    pub data_quality: DataQuality,
}

/// An annual water line in gallons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterEntry {
    /// Supply source label (informational).
    pub source: String,
    pub annual_gallons: f64,
    /// Wastewater treatment type, when treatment emissions apply.
    #[serde(default)]
    pub treatment_type: Option<String>,
    pub data_quality: DataQuality,
}

/// Upstream/downstream product transport mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Truck,
    Rail,
    Waterborne,
    Air,
    /// Unmatched modes fall back to the default transport factor and emit a
    /// data-gap warning.
    Other(String),
}

impl TransportMode {
    /// Normalized factor-table key.
    pub fn factor_key(&self) -> &str {
        match self {
            Self::Truck => "truck_medium_heavy",
            Self::Rail => "rail",
            Self::Waterborne => "waterborne_cargo",
            Self::Air => "air_freight",
            Self::Other(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    AirShortHaul,
    AirLongHaul,
    Air,
    Rail,
    Car,
    Bus,
    Other(String),
}

impl TravelMode {
    pub fn factor_key(&self) -> &str {
        match self {
            Self::AirShortHaul => "air_short_haul",
            Self::AirLongHaul => "air_long_haul",
            Self::Air => "air",
            Self::Rail => "rail",
            Self::Car => "car",
            Self::Bus => "bus",
            Self::Other(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommuteMode {
    CarAlone,
    Carpool,
    Bus,
    TransitRail,
    Motorcycle,
    Bike,
    Walk,
    Telecommute,
    Other(String),
}

impl CommuteMode {
    pub fn factor_key(&self) -> &str {
        match self {
            Self::CarAlone => "car_alone",
            Self::Carpool => "carpool",
            Self::Bus => "bus",
            Self::TransitRail => "transit_rail",
            Self::Motorcycle => "motorcycle",
            Self::Bike => "bike",
            Self::Walk => "walk",
            Self::Telecommute => "telecommute",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Active and remote modes carry a zero emission factor.
    pub fn is_zero_emission(&self) -> bool {
        matches!(self, Self::Bike | Self::Walk | Self::Telecommute)
    }
}

/// GHG Protocol Scope 3 category number (1..=15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope3Category(pub u8);

impl Scope3Category {
    pub fn key(&self) -> String {
        format!("scope3_cat{}", self.0)
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "Purchased goods & services",
            2 => "Capital goods",
            3 => "Fuel- and energy-related activities",
            4 => "Upstream transportation & distribution",
            5 => "Waste generated in operations",
            6 => "Business travel",
            7 => "Employee commuting",
            8 => "Upstream leased assets",
            9 => "Downstream transportation & distribution",
            10 => "Processing of sold products",
            11 => "Use of sold products",
            12 => "End-of-life treatment of sold products",
            13 => "Downstream leased assets",
            14 => "Franchises",
            15 => "Investments",
            _ => "Unknown category",
        }
    }
}

/// Annual spend attributed to a Scope 3 category (EEIO spend method).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendEntry {
    /// Target category: 1, 2, 8, or 10..=15.
    pub category: Scope3Category,
    /// EEIO sector key; unknown sectors use the default spend factor.
    pub sector: String,
    pub annual_usd: f64,
    pub data_quality: DataQuality,
}

/// Freight activity in ton-miles for categories 4 and 9.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportEntry {
    pub mode: TransportMode,
    pub ton_miles: f64,
    pub data_quality: DataQuality,
}

/// Business travel activity in passenger-miles (category 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelEntry {
    pub mode: TravelMode,
    pub passenger_miles: f64,
    pub data_quality: DataQuality,
}

/// One commute mode's share of the workforce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommuteModeShare {
    pub mode: CommuteMode,
    /// Fraction of employees in [0, 1].
    pub share: f64,
    /// One-way commute distance in miles.
    pub one_way_miles: f64,
}

/// Category 7 commute distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommuteProfile {
    pub mode_shares: Vec<CommuteModeShare>,
    /// Commuting days per year; defaults to 250.
    #[serde(default)]
    pub working_days: Option<f64>,
}

/// Optional Scope 3 inputs across the 15 categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope3Inputs {
    /// Spend entries for categories 1, 2, 8, 10..=15.
    #[serde(default)]
    pub spend: Vec<SpendEntry>,
    /// Category 4 freight.
    #[serde(default)]
    pub upstream_transport: Vec<TransportEntry>,
    /// Category 9 freight.
    #[serde(default)]
    pub downstream_transport: Vec<TransportEntry>,
    /// Category 6 travel.
    #[serde(default)]
    pub business_travel: Vec<TravelEntry>,
    /// Category 7 commute distribution.
    #[serde(default)]
    pub commuting: Option<CommuteProfile>,
    /// Auto-compute category 3 from the Scope 1/2 energy inputs.
    #[serde(default = "default_true")]
    pub auto_fuel_energy: bool,
    /// Auto-compute category 5 from the facility waste streams.
    #[serde(default = "default_true")]
    pub auto_waste: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Scope3Inputs {
    fn default() -> Self {
        Self {
            spend: vec![],
            upstream_transport: vec![],
            downstream_transport: vec![],
            business_travel: vec![],
            commuting: None,
            auto_fuel_energy: true,
            auto_waste: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Occupancy {
    pub employees: u32,
    #[serde(default)]
    pub annual_visitors: Option<u32>,
}

/// Immutable facility input to the engine.
///
/// Every line group is optional; computation skips absent inputs without
/// propagating nulls into arithmetic. The profile is consumed read-only:
/// the estimator works on its own clone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityProfile {
    pub name: String,
    pub building_type: BuildingType,
    /// Gross floor area in square feet. Must be > 0.
    pub square_feet: f64,
    #[serde(default)]
    pub year_built: Option<u16>,

    /// ISO-ish country name; "US" enables state/subregion resolution.
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// ASHRAE climate zone, e.g. "4A".
    #[serde(default)]
    pub climate_zone: Option<String>,
    /// Explicit eGRID subregion code, e.g. "NYCW".
    #[serde(default)]
    pub egrid_subregion: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,

    pub input_mode: InputMode,
    #[serde(default)]
    pub energy: BTreeMap<Fuel, EnergyLineItem>,
    #[serde(default)]
    pub refrigerants: Vec<RefrigerantEntry>,
    #[serde(default)]
    pub fleet: Vec<FleetGroup>,
    #[serde(default)]
    pub waste: Vec<WasteEntry>,
    #[serde(default)]
    pub water: Vec<WaterEntry>,
    #[serde(default)]
    pub scope3: Scope3Inputs,
    #[serde(default)]
    pub occupancy: Option<Occupancy>,
}

impl FacilityProfile {
    /// Creates a minimal profile with the given identity and no line items.
    pub fn new(name: &str, building_type: BuildingType, square_feet: f64) -> Self {
        Self {
            name: name.to_string(),
            building_type,
            square_feet,
            year_built: None,
            country: "US".to_string(),
            state: None,
            zip: None,
            city: None,
            climate_zone: None,
            egrid_subregion: None,
            latitude: None,
            longitude: None,
            input_mode: InputMode::Advanced,
            energy: BTreeMap::new(),
            refrigerants: vec![],
            fleet: vec![],
            waste: vec![],
            water: vec![],
            scope3: Scope3Inputs::default(),
            occupancy: None,
        }
    }

    /// Annual electricity consumption in kWh, 0.0 when the line is absent.
    pub fn electricity_kwh(&self) -> f64 {
        self.energy
            .get(&Fuel::Electricity)
            .map(|e| e.normalized_annual_quantity())
            .unwrap_or(0.0)
    }

    /// Total number of fleet vehicles across all groups.
    pub fn fleet_vehicle_count(&self) -> u32 {
        self.fleet.iter().map(|g| g.count).sum()
    }

    /// Checks shape and numeric ranges. Rejects what the engine cannot give
    /// a physical meaning; everything else is handled by skip-and-note.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.square_feet > 0.0) || !self.square_feet.is_finite() {
            return Err(CoreError::Validation(format!(
                "square_feet must be positive and finite, got {}",
                self.square_feet
            )));
        }
        for (fuel, item) in &self.energy {
            if !(item.quantity >= 0.0) || !item.quantity.is_finite() {
                return Err(CoreError::Validation(format!(
                    "{}: quantity must be >= 0 and finite, got {}",
                    fuel.key(),
                    item.quantity
                )));
            }
            if !fuel.expected_units().contains(&item.unit) {
                return Err(CoreError::Validation(format!(
                    "{}: unit {:?} not valid for this fuel",
                    fuel.key(),
                    item.unit
                )));
            }
            if let Some(ef) = item.supplier_ef_kg_per_kwh
                && (!(ef >= 0.0) || !ef.is_finite())
            {
                return Err(CoreError::Validation(format!(
                    "{}: supplier EF must be >= 0 and finite, got {ef}",
                    fuel.key()
                )));
            }
        }
        for r in &self.refrigerants {
            if !(r.charge_kg >= 0.0) || !r.charge_kg.is_finite() {
                return Err(CoreError::Validation(format!(
                    "refrigerant {}: charge must be >= 0 and finite",
                    r.refrigerant
                )));
            }
            if !(0.0..=1.0).contains(&r.leak_rate) {
                return Err(CoreError::Validation(format!(
                    "refrigerant {}: leak rate {} outside [0, 1]",
                    r.refrigerant, r.leak_rate
                )));
            }
        }
        for g in &self.fleet {
            if !(g.annual_miles_per_vehicle >= 0.0) || !g.annual_miles_per_vehicle.is_finite() {
                return Err(CoreError::Validation(
                    "fleet: annual miles must be >= 0 and finite".to_string(),
                ));
            }
            if let Some(mpg) = g.fuel_efficiency_mpg
                && (!(mpg > 0.0) || !mpg.is_finite())
            {
                return Err(CoreError::Validation(
                    "fleet: fuel efficiency override must be positive".to_string(),
                ));
            }
        }
        for w in &self.waste {
            if !(w.annual_tonnes >= 0.0) || !w.annual_tonnes.is_finite() {
                return Err(CoreError::Validation(format!(
                    "waste {}: tonnage must be >= 0 and finite",
                    w.waste_type
                )));
            }
        }
        for w in &self.water {
            if !(w.annual_gallons >= 0.0) || !w.annual_gallons.is_finite() {
                return Err(CoreError::Validation(format!(
                    "water {}: gallons must be >= 0 and finite",
                    w.source
                )));
            }
        }
        for s in &self.scope3.spend {
            if !(s.annual_usd >= 0.0) || !s.annual_usd.is_finite() {
                return Err(CoreError::Validation(format!(
                    "spend {}: amount must be >= 0 and finite",
                    s.sector
                )));
            }
        }
        if let Some(c) = &self.scope3.commuting {
            for m in &c.mode_shares {
                if !(0.0..=1.0).contains(&m.share) {
                    return Err(CoreError::Validation(format!(
                        "commute share {} outside [0, 1]",
                        m.share
                    )));
                }
                if !(m.one_way_miles >= 0.0) || !m.one_way_miles.is_finite() {
                    return Err(CoreError::Validation(
                        "commute distance must be >= 0 and finite".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office() -> FacilityProfile {
        FacilityProfile::new("HQ", BuildingType::Office, 50_000.0)
    }

    #[test]
    fn test_minimal_profile_validates() {
        assert!(office().validate().is_ok());
    }

    #[test]
    fn test_rejects_nonpositive_sqft() {
        let mut f = office();
        f.square_feet = 0.0;
        assert!(f.validate().is_err());
        f.square_feet = -10.0;
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_rejects_unit_mismatch() {
        let mut f = office();
        f.energy.insert(
            Fuel::Electricity,
            EnergyLineItem::annual(1000.0, EnergyUnit::Gallons, DataQuality::Measured),
        );
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_rejects_leak_rate_above_one() {
        let mut f = office();
        f.refrigerants.push(RefrigerantEntry {
            refrigerant: "R-410A".to_string(),
            charge_kg: 10.0,
            leak_rate: 1.5,
            equipment_type: None,
            data_quality: DataQuality::Measured,
        });
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_monthly_normalization() {
        let item = EnergyLineItem {
            quantity: 1000.0,
            unit: EnergyUnit::Kwh,
            period: Period::Monthly,
            data_quality: DataQuality::Measured,
            is_renewable: false,
            supplier_ef_kg_per_kwh: None,
        };
        assert!((item.normalized_annual_quantity() - 12_000.0).abs() < 1e-10);
    }

    #[test]
    fn test_fuel_canonical_order_matches_declaration() {
        let keys: Vec<&str> = Fuel::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(keys[0], "electricity");
        assert_eq!(keys[1], "natural_gas");
        assert_eq!(keys.last(), Some(&"kerosene"));
        // BTreeMap iteration must match Fuel::ALL order.
        let mut sorted = Fuel::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Fuel::ALL.to_vec());
    }

    #[test]
    fn test_natural_gas_accepts_both_units() {
        let mut f = office();
        f.energy.insert(
            Fuel::NaturalGas,
            EnergyLineItem::annual(2000.0, EnergyUnit::Mmbtu, DataQuality::Measured),
        );
        assert!(f.validate().is_ok());
    }
}
