//! Linear (subtractive) recurrence solving via the characteristic
//! polynomial (spec.md §4.3): closed forms for order 1 and 2, and a
//! manual companion-matrix power iteration for order >= 3 rather than
//! pulling in a BLAS-backed eigensolver -- this crate only ever needs
//! the dominant root's magnitude (the growth rate), not the full
//! spectrum, so a heavier dependency bought nothing here.

use std::collections::VecDeque;

use crate::config::EngineConfig;
use crate::core::expr::{BinOp, ComplexityExpression};
use crate::core::recurrence::{CharacteristicRoot, LinearRecurrence};
use crate::core::simplify::simplify;
use crate::error::{ComplexityError, Result};

/// Find the characteristic roots of `rec`. For order 1/2 this is exact;
/// for order >= 3 only the dominant root's magnitude is reported (see
/// module docs), with `multiplicity` left at `1` since the power
/// iteration below cannot distinguish a repeated dominant root from a
/// simple one.
pub fn solve_characteristic_roots(rec: &LinearRecurrence, config: &EngineConfig) -> Result<Vec<CharacteristicRoot>> {
    if rec.coefficients.is_empty() {
        return Err(ComplexityError::invalid("linear recurrence has no coefficients"));
    }
    match rec.order() {
        1 => Ok(vec![CharacteristicRoot::new(rec.coefficients[0].abs(), 1)]),
        2 => Ok(solve_quadratic(rec.coefficients[0], rec.coefficients[1])),
        _ => {
            let matrix = rec.companion_matrix();
            let magnitude = dominant_eigenvalue_magnitude(&matrix, config.newton_max_iter.max(200), config.newton_tol)?;
            Ok(vec![CharacteristicRoot::new(magnitude, 1)])
        }
    }
}

/// `x^2 - c1*x - c2 = 0`.
fn solve_quadratic(c1: f64, c2: f64) -> Vec<CharacteristicRoot> {
    let discriminant = c1 * c1 + 4.0 * c2;
    if discriminant >= 0.0 {
        let sqrt_d = discriminant.sqrt();
        let r1 = (c1 + sqrt_d) / 2.0;
        let r2 = (c1 - sqrt_d) / 2.0;
        if (r1 - r2).abs() < 1e-12 {
            vec![CharacteristicRoot::new(r1.abs(), 2)]
        } else {
            vec![CharacteristicRoot::new(r1.abs(), 1), CharacteristicRoot::new(r2.abs(), 1)]
        }
    } else {
        // Complex conjugate pair; product of roots is -c2, and their
        // common magnitude is the square root of that product.
        let magnitude = (-c2).max(0.0).sqrt();
        vec![CharacteristicRoot::new(magnitude, 1)]
    }
}

/// Power iteration on the companion matrix, tracking the growth ratio
/// `||A v_k|| / ||v_{k-1}||` (both normalized) and averaging the last
/// few steps to damp the oscillation a complex dominant eigenvalue pair
/// produces -- the magnitude still converges even though the iterate's
/// direction keeps rotating.
fn dominant_eigenvalue_magnitude(matrix: &[Vec<f64>], max_iter: usize, tol: f64) -> Result<f64> {
    let k = matrix.len();
    let mut v = vec![1.0 / (k as f64).sqrt(); k];
    let mut history: VecDeque<f64> = VecDeque::with_capacity(8);

    for _ in 0..max_iter {
        let next = mat_vec(matrix, &v);
        let norm = l2_norm(&next);
        if norm < 1e-300 || !norm.is_finite() {
            return Err(ComplexityError::numerical("companion-matrix power iteration", "iterate collapsed to zero"));
        }
        history.push_back(norm);
        if history.len() > 8 {
            history.pop_front();
        }
        v = next.into_iter().map(|x| x / norm).collect();

        if history.len() == 8 {
            let recent_mean = history.iter().rev().take(4).sum::<f64>() / 4.0;
            let older_mean = history.iter().take(4).sum::<f64>() / 4.0;
            if (recent_mean - older_mean).abs() < tol.max(1e-9) * recent_mean.max(1.0) {
                return Ok(recent_mean);
            }
        }
    }
    history
        .back()
        .copied()
        .ok_or_else(|| ComplexityError::numerical("companion-matrix power iteration", "no iterations ran"))
}

fn mat_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter().map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum()).collect()
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Build the asymptotic bound expression from the dominant root, per
/// the standard result that a linear recurrence's solution grows as
/// `Theta(dominant_root^n)` (homogeneous case). When the dominant root
/// is `1` the homogeneous part stays bounded and the driving term's
/// effect accumulates across all `n` steps instead -- `T(n) = T(n-1) +
/// f(n)` sums `f` over `1..=n`, which by the integral test grows like
/// `integral_1^n f(u) du` (the same closed-form table the Akra-Bazzi
/// solver uses, with `p = -1` so the divisor `u^(p+1)` drops out).
pub fn bound_from_roots(rec: &LinearRecurrence, roots: &[CharacteristicRoot]) -> ComplexityExpression {
    let dominant = roots.iter().map(|r| r.magnitude).fold(0.0, f64::max);
    if rec.is_homogeneous() {
        return if dominant <= 1.0 + 1e-9 {
            ComplexityExpression::Constant(1.0)
        } else {
            ComplexityExpression::Exponential {
                coefficient: 1.0,
                base: dominant,
                var: rec.variable.clone(),
            }
        };
    }
    if dominant <= 1.0 + 1e-9 {
        let accumulated = super::integral::evaluate_integral(&rec.inhomogeneous, &rec.variable, -1.0);
        simplify(&accumulated.expression)
    } else {
        let homogeneous_term = ComplexityExpression::Exponential {
            coefficient: 1.0,
            base: dominant,
            var: rec.variable.clone(),
        };
        simplify(&ComplexityExpression::Binary {
            op: BinOp::Max,
            left: std::rc::Rc::new(homogeneous_term),
            right: std::rc::Rc::new(rec.inhomogeneous.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::variable::Variable;

    #[test]
    fn fibonacci_recurrence_root_is_golden_ratio() {
        let rec = LinearRecurrence::new(Variable::n(), vec![1.0, 1.0], ComplexityExpression::Constant(0.0));
        let config = EngineConfig::default();
        let roots = solve_characteristic_roots(&rec, &config).unwrap();
        let dominant = roots.iter().map(|r| r.magnitude).fold(0.0, f64::max);
        let phi = (1.0 + 5f64.sqrt()) / 2.0;
        assert!((dominant - phi).abs() < 1e-6);
    }

    #[test]
    fn order_one_recurrence_is_exact() {
        let rec = LinearRecurrence::new(Variable::n(), vec![2.0], ComplexityExpression::Constant(0.0));
        let config = EngineConfig::default();
        let roots = solve_characteristic_roots(&rec, &config).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].magnitude, 2.0);
    }

    #[test]
    fn third_order_recurrence_converges_to_a_dominant_root() {
        // T(n) = T(n-1) + T(n-2) + T(n-3): tribonacci-like, dominant
        // root is the real root of x^3 - x^2 - x - 1, approx 1.839.
        let rec = LinearRecurrence::new(Variable::n(), vec![1.0, 1.0, 1.0], ComplexityExpression::Constant(0.0));
        let config = EngineConfig::default();
        let roots = solve_characteristic_roots(&rec, &config).unwrap();
        let dominant = roots[0].magnitude;
        assert!((dominant - 1.839).abs() < 0.01);
    }
}
