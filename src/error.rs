use thiserror::Error;

/// Errors surfaced at the public entry points.
///
/// Scope calculators never fail on data shape: malformed or missing line
/// items are skipped (with a data-gap note on the methodology record), so
/// partial facilities stay computable. Only validation of the overall input,
/// unknown refrigerant lookups through [`crate::factors::FactorSet::gwp_for`],
/// and out-of-range simulation configs are fatal.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input shape or out-of-range numeric value.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A refrigerant name matched neither a formal nor a common name in the
    /// bundled AR6 table.
    #[error("unknown refrigerant: {0}")]
    UnknownRefrigerant(String),

    /// Fewer than 100 Monte Carlo runs requested.
    #[error("monte carlo degenerate: {runs} runs requested, minimum is 100")]
    MonteCarloDegenerate { runs: usize },

    /// A simulation or scenario config field is outside its allowed range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
