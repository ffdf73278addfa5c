//! Parameter-type to distribution mapping for uncertainty propagation.
//!
//! The table is fixed by convention (IPCC Tier 2 defaults tuned for facility
//! inventories). GWPs are never perturbed: the GHG Protocol treats them as
//! exact conversion constants.

use super::rng::{Mulberry32, sample_lognormal, sample_normal, sample_triangular};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Normal,
    Lognormal,
    Triangular,
    Fixed,
}

/// Kinds of perturbable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    EnergyMeasured,
    EnergyEstimated,
    StationaryEf,
    GridEf,
    RefrigerantCharge,
    RefrigerantLeakRate,
    FleetMileage,
    FleetFuelEconomy,
    Scope3Spend,
    Scope3Distance,
    WasteQuantity,
    WaterQuantity,
    Gwp,
}

#[derive(Debug, Clone, Copy)]
pub struct PerturbationSpec {
    pub distribution: Distribution,
    pub relative_uncertainty: f64,
}

/// Fixed lookup of the distribution and relative uncertainty per kind.
pub fn spec_for(kind: ParameterKind) -> PerturbationSpec {
    use Distribution::*;
    let (distribution, relative_uncertainty) = match kind {
        ParameterKind::EnergyMeasured => (Normal, 0.025),
        ParameterKind::EnergyEstimated => (Lognormal, 0.15),
        ParameterKind::StationaryEf => (Normal, 0.01),
        ParameterKind::GridEf => (Normal, 0.05),
        ParameterKind::RefrigerantCharge => (Normal, 0.20),
        ParameterKind::RefrigerantLeakRate => (Triangular, 0.50),
        ParameterKind::FleetMileage => (Normal, 0.10),
        ParameterKind::FleetFuelEconomy => (Normal, 0.08),
        ParameterKind::Scope3Spend => (Lognormal, 0.30),
        ParameterKind::Scope3Distance => (Normal, 0.15),
        ParameterKind::WasteQuantity => (Normal, 0.20),
        ParameterKind::WaterQuantity => (Normal, 0.10),
        ParameterKind::Gwp => (Fixed, 0.0),
    };
    PerturbationSpec {
        distribution,
        relative_uncertainty,
    }
}

/// Draws a perturbed value for the parameter, floored at zero so physical
/// quantities never go negative.
pub fn perturb(value: f64, kind: ParameterKind, rng: &mut Mulberry32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let spec = spec_for(kind);
    let sampled = match spec.distribution {
        Distribution::Normal => {
            sample_normal(rng, value, value.abs() * spec.relative_uncertainty)
        }
        Distribution::Lognormal => sample_lognormal(rng, value, spec.relative_uncertainty),
        // Triangular spreads to [0.5x, 2.0x] around the input as the mode.
        Distribution::Triangular => sample_triangular(rng, value * 0.5, value, value * 2.0),
        Distribution::Fixed => value,
    };
    sampled.max(0.0)
}
