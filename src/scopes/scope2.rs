//! Scope 2: purchased electricity, always reported under both the
//! location-based and market-based methods.

use tracing::debug;

use crate::constants::DEFAULT_GRID_LOSS_PCT;
use crate::facility::{FacilityProfile, Fuel};
use crate::factors::FactorSet;

use super::row::{EmissionRow, Scope, ScopeOutput};

const EGRID_SOURCE: &str = "EPA eGRID (2023) subregion output emission rates";

/// Location-based method: resolved grid average factor, grossed up for
/// transmission & distribution losses.
pub fn calculate_location(facility: &FacilityProfile, factors: &FactorSet) -> ScopeOutput {
    let mut out = ScopeOutput::new();
    let Some(item) = facility.energy.get(&Fuel::Electricity) else {
        return out;
    };
    let kwh = item.normalized_annual_quantity();
    if kwh <= 0.0 {
        return out;
    }

    let grid = factors.resolve_grid(facility);
    let loss = grid.loss_pct / 100.0;
    let value_t = kwh * grid.kg_co2e_per_kwh * (1.0 + loss) / 1000.0;

    out.push(EmissionRow {
        scope: Scope::Scope2Location,
        category: "grid_electricity_location".to_string(),
        subcategory: grid.subregion.clone(),
        label: "Purchased electricity (location-based)".to_string(),
        value_t,
        components: None,
        data_quality: item.data_quality,
        methodology: format!(
            "{kwh:.0} kWh x {:.4} kg/kWh x {:.1}% T&D gross-up",
            grid.kg_co2e_per_kwh, grid.loss_pct
        ),
        source: format!("{EGRID_SOURCE}; {}", grid.source),
    });
    out
}

/// Market-based method, applied in hierarchy order and terminating on the
/// first match:
/// 1) supplier-specific emission factor
/// 2) REC/PPA coverage (zero-rated)
/// 3) residual-mix proxy (grid average with a flat 5% T&D loss)
pub fn calculate_market(facility: &FacilityProfile, factors: &FactorSet) -> ScopeOutput {
    let mut out = ScopeOutput::new();
    let Some(item) = facility.energy.get(&Fuel::Electricity) else {
        return out;
    };
    let kwh = item.normalized_annual_quantity();
    if kwh <= 0.0 {
        return out;
    }

    if let Some(supplier_ef) = item.supplier_ef_kg_per_kwh {
        debug!(supplier_ef, "market-based scope 2 uses supplier-specific EF");
        out.push(EmissionRow {
            scope: Scope::Scope2Market,
            category: "grid_electricity_market".to_string(),
            subcategory: Some("supplier_specific".to_string()),
            label: "Purchased electricity (market-based)".to_string(),
            value_t: kwh * supplier_ef / 1000.0,
            components: None,
            data_quality: item.data_quality,
            methodology: format!("{kwh:.0} kWh x supplier-specific {supplier_ef:.4} kg/kWh"),
            source: "Supplier-specific emission factor (contractual instrument)".to_string(),
        });
        return out;
    }

    if item.is_renewable {
        out.push(EmissionRow {
            scope: Scope::Scope2Market,
            category: "grid_electricity_market".to_string(),
            subcategory: Some("renewable_rec".to_string()),
            label: "Purchased electricity (market-based)".to_string(),
            value_t: 0.0,
            components: None,
            data_quality: item.data_quality,
            methodology: format!(
                "{kwh:.0} kWh covered by RECs/PPA, zero-rated under market-based accounting"
            ),
            source: "Renewable energy certificates / power purchase agreement".to_string(),
        });
        return out;
    }

    // Residual mix is approximated by the grid average for the same region.
    let grid = factors.resolve_grid(facility);
    let value_t = kwh * grid.kg_co2e_per_kwh * (1.0 + DEFAULT_GRID_LOSS_PCT / 100.0) / 1000.0;
    out.push(EmissionRow {
        scope: Scope::Scope2Market,
        category: "grid_electricity_market".to_string(),
        subcategory: Some("residual_mix".to_string()),
        label: "Purchased electricity (market-based)".to_string(),
        value_t,
        components: None,
        data_quality: item.data_quality,
        methodology: format!(
            "{kwh:.0} kWh x residual-mix proxy {:.4} kg/kWh x 5.0% T&D gross-up",
            grid.kg_co2e_per_kwh
        ),
        source: format!("{EGRID_SOURCE} (residual-mix proxy); {}", grid.source),
    });
    out
}
