//! Financial metrics for decarbonization scenarios: NPV, IRR, payback, and
//! cash-flow assembly.

/// Newton-Raphson controls for IRR.
const IRR_INITIAL_RATE: f64 = 0.10;
const IRR_MAX_ITERATIONS: usize = 100;
const IRR_NPV_TOLERANCE: f64 = 1e-7;
const IRR_RATE_TOLERANCE: f64 = 1e-7;
const IRR_MIN_RATE: f64 = -0.99;
const IRR_MIN_DERIVATIVE: f64 = 1e-15;

/// Net present value of a cash-flow series. Index 0 is the (sign-bearing)
/// initial investment and is not discounted.
pub fn npv(rate: f64, cash_flows: &[f64]) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

fn npv_derivative(rate: f64, cash_flows: &[f64]) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(t, cf)| -(t as f64) * cf / (1.0 + rate).powi(t as i32 + 1))
        .sum()
}

/// Internal rate of return via Newton-Raphson.
///
/// Returns `None` when the iteration leaves the valid domain, the derivative
/// collapses, or it fails to converge; the caller must not guess.
pub fn irr(cash_flows: &[f64]) -> Option<f64> {
    let mut rate = IRR_INITIAL_RATE;
    for _ in 0..IRR_MAX_ITERATIONS {
        let value = npv(rate, cash_flows);
        if value.abs() < IRR_NPV_TOLERANCE {
            return Some(rate);
        }
        let derivative = npv_derivative(rate, cash_flows);
        if derivative.abs() < IRR_MIN_DERIVATIVE {
            return None;
        }
        let next = rate - value / derivative;
        if next < IRR_MIN_RATE {
            return None;
        }
        if (next - rate).abs() < IRR_RATE_TOLERANCE {
            return Some(next);
        }
        rate = next;
    }
    None
}

/// Simple payback in years: capex over annual savings. Zero capex pays back
/// immediately; non-positive savings never do.
pub fn simple_payback(capex: f64, annual_savings: f64) -> f64 {
    if annual_savings <= 0.0 {
        return f64::INFINITY;
    }
    capex / annual_savings
}

/// `[-capex, savings, savings, ...]` of length `1 + years`.
pub fn build_cash_flows(capex: f64, annual_savings: f64, years: usize) -> Vec<f64> {
    let mut flows = Vec::with_capacity(1 + years);
    flows.push(-capex);
    flows.extend(std::iter::repeat_n(annual_savings, years));
    flows
}

/// Cumulative CO2 avoided over `years` when the annual avoidance decays
/// geometrically (e.g. a greening grid eroding a solar array's benefit).
pub fn cumulative_avoided(annual_t: f64, annual_decay: f64, years: usize) -> f64 {
    (0..years)
        .map(|i| annual_t * (1.0 - annual_decay).powi(i as i32))
        .sum()
}
