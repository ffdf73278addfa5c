use serde::{Deserialize, Serialize};

use crate::facility::DataQuality;

/// GHG Protocol scope of a breakdown row. The two Scope 2 methods are kept
/// distinct so the dual totals can be reassembled from the row multiset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Scope1,
    Scope2Location,
    Scope2Market,
    Scope3,
}

/// Per-gas audit components of a combustion row, all in tonnes CO2e.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GasComponents {
    pub co2_t: f64,
    pub ch4_t_co2e: f64,
    pub n2o_t_co2e: f64,
}

/// One fully attributed line of the emission inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionRow {
    pub scope: Scope,
    /// Stable category tag, e.g. "stationary_combustion", "scope3_cat5".
    pub category: String,
    /// Finer attribution inside the category, e.g. "renewable_rec".
    #[serde(default)]
    pub subcategory: Option<String>,
    /// Human-readable line label, e.g. "Natural gas".
    pub label: String,
    /// Emissions in tonnes CO2e. Always >= 0.
    pub value_t: f64,
    #[serde(default)]
    pub components: Option<GasComponents>,
    pub data_quality: DataQuality,
    /// One-line description of the calculation.
    pub methodology: String,
    /// Citation of the factor table used.
    pub source: String,
}

/// Output of one scope calculator: rows plus their exact sum.
#[derive(Debug, Clone, Default)]
pub struct ScopeOutput {
    pub total_t: f64,
    pub rows: Vec<EmissionRow>,
    /// Non-fatal notes about inputs that were skipped or defaulted.
    pub data_gaps: Vec<String>,
}

impl ScopeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row, keeping the running total consistent with the rows.
    pub fn push(&mut self, row: EmissionRow) {
        self.total_t += row.value_t;
        self.rows.push(row);
    }

    pub fn note_gap(&mut self, note: impl Into<String>) {
        self.data_gaps.push(note.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_total_in_sync() {
        let mut out = ScopeOutput::new();
        for value in [1.5, 2.5, 0.0] {
            out.push(EmissionRow {
                scope: Scope::Scope1,
                category: "stationary_combustion".to_string(),
                subcategory: None,
                label: "test".to_string(),
                value_t: value,
                components: None,
                data_quality: DataQuality::Measured,
                methodology: String::new(),
                source: String::new(),
            });
        }
        let row_sum: f64 = out.rows.iter().map(|r| r.value_t).sum();
        assert!((out.total_t - row_sum).abs() < 1e-12);
        assert!((out.total_t - 4.0).abs() < 1e-12);
    }
}
