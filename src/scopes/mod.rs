pub mod row;
pub mod scope1;
pub mod scope2;
pub mod scope3;

pub use row::{EmissionRow, GasComponents, Scope, ScopeOutput};
