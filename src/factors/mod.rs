pub mod registry;
pub mod tables;

pub use registry::FactorRegistry;
pub use tables::{FactorSet, GridResolution};
