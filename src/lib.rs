//! Facility greenhouse-gas inventory engine.
//!
//! A pure, deterministic core that turns a facility profile and a bundle of
//! reference emission factors into a fully attributed Scope 1/2/3 inventory
//! (GHG Protocol Corporate Standard), propagates input and factor
//! uncertainty with a seeded Monte Carlo simulation, and evaluates
//! decarbonization scenarios with NPV/IRR/payback metrics.
//!
//! The three entry points are [`compute_all`], [`run_monte_carlo`], and
//! [`evaluate_scenario`]; reference tables come from
//! [`FactorRegistry::load`]. The core performs no I/O and holds no mutable
//! state: identical inputs produce identical results, bit for bit.

pub mod constants;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod facility;
pub mod factors;
pub mod montecarlo;
pub mod scenario;
pub mod scopes;

// Prelude
pub use engine::{ComputeOptions, EmissionResult, compute_all};
pub use error::CoreError;
pub use facility::FacilityProfile;
pub use factors::{FactorRegistry, FactorSet};
pub use montecarlo::{SimulationConfig, SimulationResult, run_monte_carlo};
pub use scenario::{
    Intervention, ScenarioConfig, ScenarioResult, evaluate_scenario,
    evaluate_scenario_with_config,
};
