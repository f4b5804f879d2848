//! Chi-square goodness-of-fit test.
//!
//! Used by the opponent model to decide whether the distribution of values
//! offered for an issue shifted between two windows of offers.

use std::f64::consts::PI;

const EPS: f64 = 1e-14;
const FPMIN: f64 = 1e-300;
const MAX_ITERATIONS: usize = 500;

/// Outcome of a chi-square goodness-of-fit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquareTest {
    /// Test statistic `sum((obs - exp)^2 / exp)`.
    pub statistic: f64,
    /// Degrees of freedom, `k - 1`.
    pub dof: usize,
    /// Probability of a statistic at least this large under the null hypothesis.
    pub p_value: f64,
}

/// Tests `observed` frequencies against `expected` ones.
///
/// Categories with a non-positive expected frequency are skipped. With fewer
/// than two usable categories there is nothing to test and the p-value is 1.
#[must_use]
pub fn chi_square_test(observed: &[f64], expected: &[f64]) -> ChiSquareTest {
    let mut statistic = 0.0;
    let mut categories = 0usize;
    for (&o, &e) in observed.iter().zip(expected) {
        if e > 0.0 {
            statistic += (o - e).powi(2) / e;
            categories += 1;
        }
    }
    let dof = categories.saturating_sub(1);
    ChiSquareTest {
        statistic,
        dof,
        p_value: chi_square_sf(statistic, dof),
    }
}

/// Survival function of the chi-square distribution.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn chi_square_sf(statistic: f64, dof: usize) -> f64 {
    if dof == 0 || statistic.is_nan() || statistic <= 0.0 {
        return 1.0;
    }
    gamma_q(dof as f64 / 2.0, statistic / 2.0).clamp(0.0, 1.0)
}

/// Regularised upper incomplete gamma function `Q(a, x)`.
fn gamma_q(a: f64, x: f64) -> f64 {
    if x < a + 1.0 {
        1.0 - gamma_p_series(a, x)
    } else {
        gamma_q_continued_fraction(a, x)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut term = 1.0 / a;
    let mut sum = term;
    for _ in 0..MAX_ITERATIONS {
        ap += 1.0;
        term *= x / ap;
        sum += term;
        if term.abs() < sum.abs() * EPS {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

#[allow(clippy::cast_precision_loss)]
fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=MAX_ITERATIONS {
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = an.mul_add(d, b);
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Natural log of the gamma function (Lanczos approximation, g = 7).
#[allow(clippy::excessive_precision, clippy::unreadable_literal)]
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut acc = COEFFICIENTS[0];
    for (i, c) in COEFFICIENTS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    let t = x + G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}
