//! Evaluates `integral_1^n f(u) / u^(p+1) du` for the Akra-Bazzi
//! solver (spec.md §4.3), via a closed-form table for the elementary
//! growth classes and a symbolic fallback otherwise.
//!
//! Only the asymptotically dominant part of each closed form is kept --
//! this crate reports growth classes, not exact antiderivatives, so a
//! bounded (converges to a constant as `n -> infinity`) contribution
//! collapses to `O(1)` rather than carrying its exact limit value.

use crate::core::expr::{BinOp, ComplexityExpression, SpecialFunction};
use crate::core::simplify::simplify;
use crate::core::variable::Variable;

/// Result of evaluating the Akra-Bazzi integral: a closed-form (or
/// symbolic-fallback) expression for its asymptotic growth, and a
/// confidence in that expression being accurate.
#[derive(Debug, Clone)]
pub struct IntegralResult {
    pub expression: ComplexityExpression,
    pub confidence: f64,
}

/// Evaluate the integral of `f` against the critical exponent `p`, with
/// respect to `var`.
pub fn evaluate_integral(f: &ComplexityExpression, var: &Variable, p: f64) -> IntegralResult {
    match linear_terms(f, var) {
        Some(terms) if !terms.is_empty() => {
            let parts: Vec<ComplexityExpression> = terms
                .into_iter()
                .map(|(poly_exp, log_exp, coeff)| monomial_integral_contribution(var, p, poly_exp, log_exp, coeff))
                .collect();
            let summed = parts
                .into_iter()
                .reduce(|a, b| ComplexityExpression::Binary {
                    op: BinOp::Add,
                    left: std::rc::Rc::new(a),
                    right: std::rc::Rc::new(b),
                })
                .unwrap_or(ComplexityExpression::Constant(0.0));
            IntegralResult {
                expression: simplify(&summed),
                confidence: 0.9,
            }
        }
        Some(_) => IntegralResult {
            expression: ComplexityExpression::Constant(0.0),
            confidence: 0.9,
        },
        None => IntegralResult {
            expression: ComplexityExpression::Special(SpecialFunction::SymbolicIntegral {
                integrand_description: f.big_o(),
                variable: var.clone(),
                asymptotic_estimate: Box::new(f.clone()),
            }),
            confidence: 0.4,
        },
    }
}

/// Asymptotic contribution of `integral u^(poly_exp - p - 1) * ln(u)^log_exp du`
/// (the dominant term only -- see module docs).
fn monomial_integral_contribution(var: &Variable, p: f64, poly_exp: f64, log_exp: f64, coeff: f64) -> ComplexityExpression {
    let q = p - poly_exp;
    if log_exp == 0.0 {
        if q.abs() < 1e-9 {
            ComplexityExpression::Logarithmic {
                coefficient: coeff,
                var: var.clone(),
                base: std::f64::consts::E,
            }
        } else if q > 0.0 {
            ComplexityExpression::Constant(coeff / q)
        } else {
            let degree = -q;
            if (degree - 1.0).abs() < 1e-9 {
                ComplexityExpression::Linear {
                    coefficient: coeff / degree,
                    var: var.clone(),
                }
            } else {
                let mut coeffs = std::collections::BTreeMap::new();
                coeffs.insert(degree.round() as u32, coeff / degree);
                ComplexityExpression::Polynomial { var: var.clone(), coeffs }
            }
        }
    } else if q.abs() < 1e-9 {
        ComplexityExpression::PolyLog {
            coefficient: coeff / (log_exp + 1.0),
            var: var.clone(),
            poly_exp: 0.0,
            log_exp: log_exp + 1.0,
        }
    } else if q > 0.0 {
        ComplexityExpression::Constant(coeff)
    } else {
        let degree = -q;
        ComplexityExpression::PolyLog {
            coefficient: coeff / degree,
            var: var.clone(),
            poly_exp: degree,
            log_exp,
        }
    }
}

/// Decompose `f` into a sum of `coeff * var^poly_exp * ln(var)^log_exp`
/// monomials, or `None` if `f` contains something this closed-form
/// table does not cover (exponential/factorial combine costs, a
/// variable other than `var`, or any non-additive/non-scalar-multiply
/// structure).
fn linear_terms(f: &ComplexityExpression, var: &Variable) -> Option<Vec<(f64, f64, f64)>> {
    use ComplexityExpression::*;
    match f {
        Constant(c) => Some(vec![(0.0, 0.0, *c)]),
        Var(v) if v == var => Some(vec![(1.0, 0.0, 1.0)]),
        Linear { coefficient, var: v } if v == var => Some(vec![(1.0, 0.0, *coefficient)]),
        Polynomial { var: v, coeffs } if v == var => Some(
            coeffs
                .iter()
                .filter(|(_, &c)| c != 0.0)
                .map(|(&d, &c)| (d as f64, 0.0, c))
                .collect(),
        ),
        Logarithmic { coefficient, var: v, .. } if v == var => Some(vec![(0.0, 1.0, *coefficient)]),
        PolyLog {
            coefficient,
            var: v,
            poly_exp,
            log_exp,
        } if v == var => Some(vec![(*poly_exp, *log_exp, *coefficient)]),
        Binary {
            op: BinOp::Add,
            left,
            right,
        } => {
            let mut l = linear_terms(left, var)?;
            l.extend(linear_terms(right, var)?);
            Some(l)
        }
        Binary {
            op: BinOp::Mul,
            left,
            right,
        } => match (left.as_ref(), right.as_ref()) {
            (Constant(c), other) => Some(linear_terms(other, var)?.into_iter().map(|(p, l, co)| (p, l, co * c)).collect()),
            (other, Constant(c)) => Some(linear_terms(other, var)?.into_iter().map(|(p, l, co)| (p, l, co * c)).collect()),
            _ => None,
        },
        _ => None,
    }
}
