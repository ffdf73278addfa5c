//! Seeded PRNG and distribution samplers.
//!
//! The generator is a Mulberry32 variant implemented with 32-bit wrapping
//! arithmetic so that a given seed yields the same stream in any conforming
//! implementation. The step is pinned by a golden-vector test; do not touch
//! it without updating the engine version.

use std::f64::consts::TAU;

/// Floor for Box-Muller's first uniform draw, protecting `ln`.
const U1_EPSILON: f64 = 1e-10;

/// Mulberry32 PRNG producing uniforms in [0, 1).
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advances the state and returns the next uniform draw.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let s = self.state;
        let mut t = (s ^ (s >> 15)).wrapping_mul(1 | s);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        (t ^ (t >> 14)) as f64 / 4_294_967_296.0
    }
}

/// Standard normal via Box-Muller, consuming exactly two draws.
pub fn sample_standard_normal(rng: &mut Mulberry32) -> f64 {
    let u1 = rng.next_f64().max(U1_EPSILON);
    let u2 = rng.next_f64();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Normal with the given mean and standard deviation.
pub fn sample_normal(rng: &mut Mulberry32, mean: f64, std_dev: f64) -> f64 {
    mean + std_dev * sample_standard_normal(rng)
}

/// Lognormal parameterized by the desired arithmetic mean and coefficient of
/// variation. Returns 0 for a non-positive mean.
pub fn sample_lognormal(rng: &mut Mulberry32, mean: f64, cv: f64) -> f64 {
    if mean <= 0.0 {
        return 0.0;
    }
    let sigma_ln = (1.0 + cv * cv).ln().sqrt();
    let mu_ln = mean.ln() - sigma_ln * sigma_ln / 2.0;
    sample_normal(rng, mu_ln, sigma_ln).exp()
}

/// Triangular(min, mode, max) via inverse CDF, consuming one draw.
pub fn sample_triangular(rng: &mut Mulberry32, min: f64, mode: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return mode;
    }
    let u = rng.next_f64();
    let break_point = (mode - min) / span;
    if u < break_point {
        min + (u * span * (mode - min)).sqrt()
    } else {
        max - ((1.0 - u) * span * (max - mode)).sqrt()
    }
}

/// Uniform(min, max), consuming one draw.
pub fn sample_uniform(rng: &mut Mulberry32, min: f64, max: f64) -> f64 {
    min + rng.next_f64() * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// First 20 draws of seed 42, pinned for cross-implementation seed
    /// equivalence.
    const GOLDEN_SEED_42: [f64; 20] = [
        0.6011037519201636,
        0.44829055899754167,
        0.8524657934904099,
        0.6697340414393693,
        0.17481389874592423,
        0.5265925421845168,
        0.2732279943302274,
        0.6247446539346129,
        0.8654746483080089,
        0.4723170551005751,
        0.24992373422719538,
        0.8820588334929198,
        0.7457375649828464,
        0.3070015134289861,
        0.19725383794866502,
        0.5007294877432287,
        0.6866120179183781,
        0.6106208984274417,
        0.003842951962724328,
        0.47078192373737693,
    ];

    #[test]
    fn test_golden_vector_seed_42() {
        let mut rng = Mulberry32::new(42);
        for (i, expected) in GOLDEN_SEED_42.iter().enumerate() {
            let got = rng.next_f64();
            assert!(
                (got - expected).abs() < 1e-15,
                "draw {i}: got {got}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = Mulberry32::new(123_456);
        let mut b = Mulberry32::new(123_456);
        for _ in 0..1000 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn test_draws_stay_in_unit_interval() {
        let mut rng = Mulberry32::new(7);
        for _ in 0..10_000 {
            let u = rng.next_f64();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_normal_sample_statistics() {
        let mut rng = Mulberry32::new(42);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| sample_normal(&mut rng, 100.0, 10.0)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!((mean - 100.0).abs() < 0.5, "mean {mean}");
        assert!((var.sqrt() - 10.0).abs() < 0.5, "std {}", var.sqrt());
    }

    #[test]
    fn test_lognormal_mean_and_positivity() {
        let mut rng = Mulberry32::new(42);
        let n = 20_000;
        let samples: Vec<f64> =
            (0..n).map(|_| sample_lognormal(&mut rng, 50.0, 0.3)).collect();
        assert!(samples.iter().all(|&x| x > 0.0));
        let mean = samples.iter().sum::<f64>() / n as f64;
        assert!((mean - 50.0).abs() < 1.5, "mean {mean}");
        assert!((sample_lognormal(&mut rng, 0.0, 0.3) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangular_bounds_and_degenerate_range() {
        let mut rng = Mulberry32::new(9);
        for _ in 0..5_000 {
            let x = sample_triangular(&mut rng, 5.0, 10.0, 20.0);
            assert!((5.0..=20.0).contains(&x));
        }
        assert!((sample_triangular(&mut rng, 3.0, 3.0, 3.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_bounds() {
        let mut rng = Mulberry32::new(11);
        for _ in 0..5_000 {
            let x = sample_uniform(&mut rng, -2.0, 2.0);
            assert!((-2.0..2.0).contains(&x));
        }
    }

    #[test]
    fn test_normal_consumes_two_draws() {
        // The draw count is part of the reproducibility contract.
        let mut a = Mulberry32::new(42);
        let mut b = Mulberry32::new(42);
        let _ = sample_normal(&mut a, 0.0, 1.0);
        let _ = b.next_f64();
        let _ = b.next_f64();
        assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
    }
}
