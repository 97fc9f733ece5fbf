//! Akra-Bazzi critical exponent: the unique `p` solving
//! `sum_i a_i * b_i^(-p) = 1` (spec.md §4.3), found by Newton-Raphson
//! with a bracketing-Brent fallback when Newton fails to converge --
//! the same two-tier strategy the teacher's `Newton`/`Brent` solvers
//! model for general root-finding, specialized here to the one equation
//! this crate ever needs it for.

use crate::config::EngineConfig;
use crate::core::recurrence::DivideTerm;
use crate::error::{ComplexityError, Result};

/// `g(p) = sum_i a_i * b_i^(-p) - 1`. Strictly decreasing in `p` for any
/// well-formed term set (`a_i > 0`, `b_i > 1`), so it has exactly one
/// root.
fn g(terms: &[DivideTerm], p: f64) -> f64 {
    terms.iter().map(|t| t.subproblem_count * t.size_divisor.powf(-p)).sum::<f64>() - 1.0
}

/// `g'(p) = -sum_i a_i * ln(b_i) * b_i^(-p)`.
fn dg(terms: &[DivideTerm], p: f64) -> f64 {
    -terms
        .iter()
        .map(|t| t.subproblem_count * t.size_divisor.ln() * t.size_divisor.powf(-p))
        .sum::<f64>()
}

/// Solve for the critical exponent of `terms`.
pub fn solve_critical_exponent(terms: &[DivideTerm], config: &EngineConfig) -> Result<f64> {
    if terms.is_empty() {
        return Err(ComplexityError::invalid("divide recurrence has no recursive terms"));
    }
    for t in terms {
        if t.subproblem_count <= 0.0 || t.size_divisor <= 1.0 {
            return Err(ComplexityError::invalid(format!(
                "divide term a={} b={} must have a>0, b>1",
                t.subproblem_count, t.size_divisor
            )));
        }
    }

    if let Ok(p) = newton_raphson(terms, config) {
        return Ok(p);
    }
    brent_fallback(terms, config)
}

fn newton_raphson(terms: &[DivideTerm], config: &EngineConfig) -> Result<f64> {
    let mut p = 1.0;
    for _ in 0..config.newton_max_iter {
        let gp = g(terms, p);
        if gp.abs() < config.newton_tol {
            return Ok(p);
        }
        let slope = dg(terms, p);
        if slope.abs() < 1e-300 || !slope.is_finite() {
            return Err(ComplexityError::numerical("newton-raphson", "zero or non-finite derivative"));
        }
        let step = gp / slope;
        let next = p - step;
        if !next.is_finite() {
            return Err(ComplexityError::numerical("newton-raphson", "iterate diverged to infinity"));
        }
        if (next - p).abs() < config.newton_tol {
            return Ok(next);
        }
        p = next;
    }
    Err(ComplexityError::numerical("newton-raphson", "exceeded maximum iterations"))
}

/// Brent's root-finding method (inverse quadratic interpolation, secant,
/// and bisection, falling back progressively): the robust fallback when
/// Newton fails to converge from the default starting point.
fn brent_fallback(terms: &[DivideTerm], config: &EngineConfig) -> Result<f64> {
    let (mut lo, mut hi) = bracket(terms)?;
    let mut f_lo = g(terms, lo);
    let mut f_hi = g(terms, hi);
    if f_lo * f_hi > 0.0 {
        return Err(ComplexityError::numerical("brent", "failed to bracket a sign change"));
    }
    if f_lo.abs() < f_hi.abs() {
        std::mem::swap(&mut lo, &mut hi);
        std::mem::swap(&mut f_lo, &mut f_hi);
    }
    let mut prev = lo;
    let mut f_prev = f_lo;
    let mut use_bisection = true;
    let mut cur = hi;
    let mut f_cur = f_hi;

    for _ in 0..config.brent_max_iter {
        if f_cur.abs() < config.newton_tol || (cur - prev).abs() < config.newton_tol {
            return Ok(cur);
        }
        let s = if (f_lo - f_prev).abs() > 1e-300 && (f_lo - f_cur).abs() > 1e-300 {
            // Inverse quadratic interpolation.
            lo * f_prev * f_cur / ((f_lo - f_prev) * (f_lo - f_cur))
                + prev * f_lo * f_cur / ((f_prev - f_lo) * (f_prev - f_cur))
                + cur * f_lo * f_prev / ((f_cur - f_lo) * (f_cur - f_prev))
        } else {
            // Secant.
            cur - f_cur * (cur - lo) / (f_cur - f_lo)
        };

        let bisection_midpoint = (3.0 * lo + cur) / 4.0;
        let needs_bisection = !((s > bisection_midpoint.min(cur) && s < bisection_midpoint.max(cur))
            && (use_bisection && (s - cur).abs() < (cur - prev).abs() / 2.0
                || !use_bisection && (s - cur).abs() < (prev - f_prev).abs() / 2.0));

        let next = if needs_bisection { (lo + cur) / 2.0 } else { s };
        use_bisection = needs_bisection;
        let f_next = g(terms, next);

        prev = cur;
        f_prev = f_cur;
        if f_lo * f_next < 0.0 {
            cur = next;
            f_cur = f_next;
        } else {
            lo = next;
            f_lo = f_next;
        }
        if f_lo.abs() < f_cur.abs() {
            std::mem::swap(&mut lo, &mut cur);
            std::mem::swap(&mut f_lo, &mut f_cur);
        }
    }
    Err(ComplexityError::numerical("brent", "exceeded maximum iterations"))
}

/// Expand an interval around `0` until `g` changes sign, since `g` is
/// monotone this always succeeds for a well-formed term set.
fn bracket(terms: &[DivideTerm]) -> Result<(f64, f64)> {
    let mut lo = -4.0;
    let mut hi = 4.0;
    for _ in 0..40 {
        let f_lo = g(terms, lo);
        let f_hi = g(terms, hi);
        if f_lo * f_hi <= 0.0 {
            return Ok((lo, hi));
        }
        lo *= 2.0;
        hi *= 2.0;
    }
    Err(ComplexityError::numerical("brent", "could not bracket a root"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sort_critical_exponent_is_one() {
        let terms = vec![DivideTerm::new(2.0, 2.0)];
        let config = EngineConfig::default();
        let p = solve_critical_exponent(&terms, &config).unwrap();
        assert!((p - 1.0).abs() < 1e-6);
    }

    #[test]
    fn strassen_critical_exponent_is_log2_7() {
        let terms = vec![DivideTerm::new(7.0, 2.0)];
        let config = EngineConfig::default();
        let p = solve_critical_exponent(&terms, &config).unwrap();
        assert!((p - 7f64.log2()).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_positive_subproblem_count() {
        let terms = vec![DivideTerm::new(0.0, 2.0)];
        let config = EngineConfig::default();
        assert!(solve_critical_exponent(&terms, &config).is_err());
    }

    #[test]
    fn multi_term_akra_bazzi_example() {
        // T(n) = T(n/3) + T(2n/3) + n: critical exponent is 1.
        let terms = vec![DivideTerm::new(1.0, 3.0), DivideTerm::new(1.0, 1.5)];
        let config = EngineConfig::default();
        let p = solve_critical_exponent(&terms, &config).unwrap();
        assert!((p - 1.0).abs() < 1e-6);
    }
}
