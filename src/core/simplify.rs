//! Simplification: constant folding, dominated-term dropping, and
//! same-variable polynomial/poly-log merging (spec.md §4.1).
//!
//! Simplification is a pure, idempotent transform: `simplify(simplify(e))
//! == simplify(e)` for any `e` (exercised in `tests/algebra_laws.rs`).

use std::collections::BTreeMap;
use std::rc::Rc;

use super::classify::{classify, compare_asymptotic, ComplexityForm};
use super::expr::{BinOp, ComplexityExpression};
use super::variable::{FreeVariables, Variable};

/// Simplify `expr`: drop `O(1)` additive/multiplicative identities, merge
/// same-variable polynomial terms, merge poly-log products, and drop
/// additive terms strictly dominated by another term in the same sum.
pub fn simplify(expr: &ComplexityExpression) -> ComplexityExpression {
    use ComplexityExpression::*;
    match expr {
        Constant(_) | ComplexityExpression::Var(_) | Linear { .. } | Logarithmic { .. } | PolyLog { .. }
        | Exponential { .. } | Factorial { .. } | InverseAckermann { .. } => expr.clone(),
        Polynomial { var, coeffs } => simplify_poly_map(var, coeffs),
        Binary { op, left, right } => simplify_binary(*op, left, right),
        Conditional {
            description,
            then_branch,
            else_branch,
        } => {
            let t = simplify(then_branch);
            let e = simplify(else_branch);
            if t == e {
                t
            } else {
                Conditional {
                    description: description.clone(),
                    then_branch: Rc::new(t),
                    else_branch: Rc::new(e),
                }
            }
        }
        ComplexityExpression::PowerOf { base, exponent } => {
            let b = simplify(base);
            let e = simplify(exponent);
            match (&b, &e) {
                (_, Constant(k)) if *k == 0.0 => Constant(1.0),
                (_, Constant(k)) if *k == 1.0 => b,
                (Constant(1.0), _) => Constant(1.0),
                _ => ComplexityExpression::PowerOf {
                    base: Rc::new(b),
                    exponent: Rc::new(e),
                },
            }
        }
        ComplexityExpression::LogOf { argument, base } => ComplexityExpression::LogOf {
            argument: Rc::new(simplify(argument)),
            base: *base,
        },
        ComplexityExpression::ExpOf { exponent, base } => ComplexityExpression::ExpOf {
            exponent: Rc::new(simplify(exponent)),
            base: *base,
        },
        ComplexityExpression::FactorialOf { argument } => ComplexityExpression::FactorialOf {
            argument: Rc::new(simplify(argument)),
        },
        ComplexityExpression::Special(_) => expr.clone(),
        ComplexityExpression::Amortized {
            amortized,
            worst_case,
            method,
        } => ComplexityExpression::Amortized {
            amortized: Rc::new(simplify(amortized)),
            worst_case: Rc::new(simplify(worst_case)),
            method: method.clone(),
        },
        ComplexityExpression::Parallel { work, span, processors } => ComplexityExpression::Parallel {
            work: Rc::new(simplify(work)),
            span: Rc::new(simplify(span)),
            processors: Rc::new(simplify(processors)),
        },
        ComplexityExpression::Probabilistic {
            expected,
            worst,
            best,
            distribution,
            assumptions,
        } => ComplexityExpression::Probabilistic {
            expected: Rc::new(simplify(expected)),
            worst: Rc::new(simplify(worst)),
            best: Rc::new(simplify(best)),
            distribution: distribution.clone(),
            assumptions: assumptions.clone(),
        },
        ComplexityExpression::Memory {
            total,
            stack,
            heap,
            auxiliary,
            allocations,
        } => ComplexityExpression::Memory {
            total: Rc::new(simplify(total)),
            stack: Rc::new(simplify(stack)),
            heap: Rc::new(simplify(heap)),
            auxiliary: Rc::new(simplify(auxiliary)),
            allocations: Rc::new(simplify(allocations)),
        },
    }
}

fn simplify_poly_map(var: &Variable, coeffs: &BTreeMap<u32, f64>) -> ComplexityExpression {
    let filtered: BTreeMap<u32, f64> = coeffs.iter().filter(|(_, &c)| c != 0.0).map(|(&d, &c)| (d, c)).collect();
    match filtered.len() {
        0 => ComplexityExpression::Constant(0.0),
        1 => {
            let (&degree, &coeff) = filtered.iter().next().unwrap();
            match degree {
                0 => ComplexityExpression::Constant(coeff),
                1 => ComplexityExpression::Linear {
                    coefficient: coeff,
                    var: var.clone(),
                },
                _ => ComplexityExpression::Polynomial {
                    var: var.clone(),
                    coeffs: filtered,
                },
            }
        }
        _ => ComplexityExpression::Polynomial {
            var: var.clone(),
            coeffs: filtered,
        },
    }
}

fn simplify_binary(op: BinOp, left: &ComplexityExpression, right: &ComplexityExpression) -> ComplexityExpression {
    let l = simplify(left);
    let r = simplify(right);
    match op {
        BinOp::Add => simplify_add(l, r),
        BinOp::Mul => simplify_mul(l, r),
        BinOp::Max => simplify_extremum(l, r, true),
        BinOp::Min => simplify_extremum(l, r, false),
    }
}

/// Flatten a tree of `Add` nodes into its leaves (pre-simplified).
fn flatten_add(expr: ComplexityExpression) -> Vec<ComplexityExpression> {
    match expr {
        ComplexityExpression::Binary {
            op: BinOp::Add,
            left,
            right,
        } => {
            let mut out = flatten_add((*left).clone());
            out.extend(flatten_add((*right).clone()));
            out
        }
        other => vec![other],
    }
}

fn simplify_add(l: ComplexityExpression, r: ComplexityExpression) -> ComplexityExpression {
    let mut terms: Vec<ComplexityExpression> = Vec::new();
    terms.extend(flatten_add(l));
    terms.extend(flatten_add(r));
    terms.retain(|t| !matches!(t, ComplexityExpression::Constant(c) if *c == 0.0));
    if terms.is_empty() {
        return ComplexityExpression::Constant(0.0);
    }

    // Group by free-variable set so polynomial merging and dominance
    // dropping only ever compare like with like.
    let mut groups: Vec<(FreeVariables, Vec<ComplexityExpression>)> = Vec::new();
    for term in terms {
        let fv = term.free_variables();
        if let Some(group) = groups.iter_mut().find(|(key, _)| *key == fv) {
            group.1.push(term);
        } else {
            groups.push((fv, vec![term]));
        }
    }

    let mut group_results: Vec<ComplexityExpression> = Vec::new();
    for (fv, members) in groups {
        group_results.push(simplify_same_variable_sum(fv, members));
    }
    rebuild_sum(group_results)
}

fn simplify_same_variable_sum(fv: FreeVariables, members: Vec<ComplexityExpression>) -> ComplexityExpression {
    if fv.len() != 1 {
        // Multiple (or zero) variables in common: nothing to merge or
        // drop against, just fold constants together.
        return rebuild_sum(members);
    }
    let var = fv.into_iter().next().unwrap();

    // Merge every elementary single-variable polynomial term into one
    // coefficient map; everything else is kept as its own candidate.
    let mut poly_coeffs: BTreeMap<u32, f64> = BTreeMap::new();
    let mut others: Vec<ComplexityExpression> = Vec::new();
    for m in members {
        match &m {
            ComplexityExpression::Constant(c) => {
                *poly_coeffs.entry(0).or_insert(0.0) += *c;
            }
            ComplexityExpression::Var(v) if *v == var => {
                *poly_coeffs.entry(1).or_insert(0.0) += 1.0;
            }
            ComplexityExpression::Linear { coefficient, var: v } if *v == var => {
                *poly_coeffs.entry(1).or_insert(0.0) += *coefficient;
            }
            ComplexityExpression::Polynomial { var: v, coeffs } if *v == var => {
                for (&d, &c) in coeffs {
                    *poly_coeffs.entry(d).or_insert(0.0) += c;
                }
            }
            _ => others.push(m),
        }
    }
    let merged_poly = simplify_poly_map(&var, &poly_coeffs);
    let mut candidates = others;
    if !matches!(&merged_poly, ComplexityExpression::Constant(c) if *c == 0.0) {
        candidates.push(merged_poly);
    }
    if candidates.is_empty() {
        return ComplexityExpression::Constant(0.0);
    }
    drop_dominated(candidates, Some(var))
}

/// Drop every candidate strictly dominated by another under the
/// asymptotic order; candidates that classify as `Unknown` are kept
/// regardless (an unknown term might not actually be dominated).
fn drop_dominated(candidates: Vec<ComplexityExpression>, var: Option<Variable>) -> ComplexityExpression {
    let classified: Vec<_> = candidates
        .iter()
        .map(|c| classify(c, var.clone()))
        .collect();
    let max_tier = classified
        .iter()
        .filter(|c| c.form != ComplexityForm::Unknown)
        .map(|c| (c.form.tier(), ordered_float(c.primary_parameter), ordered_float(c.log_exponent)))
        .max();
    let mut survivors = Vec::new();
    for (term, class) in candidates.into_iter().zip(classified.into_iter()) {
        if class.form == ComplexityForm::Unknown {
            survivors.push(term);
            continue;
        }
        let key = (class.form.tier(), ordered_float(class.primary_parameter), ordered_float(class.log_exponent));
        if Some(key) == max_tier {
            survivors.push(term);
        }
    }
    // Merge any surviving ties that classified identically (e.g. n + n).
    if survivors.len() > 1 {
        let reclassified: Vec<_> = survivors.iter().map(|s| classify(s, var.clone())).collect();
        let all_same_tier_params = reclassified
            .windows(2)
            .all(|w| compare_asymptotic(&w[0], &w[1]) == 0 && w[0].form != ComplexityForm::Unknown);
        if all_same_tier_params && !reclassified.is_empty() {
            let coeff_sum: f64 = reclassified.iter().map(|c| c.coefficient).sum();
            return rebuild_scaled(&reclassified[0], coeff_sum);
        }
    }
    rebuild_sum(survivors)
}

fn rebuild_scaled(class: &super::classify::Classification, coeff: f64) -> ComplexityExpression {
    let var = class.variable.clone().unwrap_or_else(Variable::n);
    match class.form {
        ComplexityForm::Constant => ComplexityExpression::Constant(coeff),
        ComplexityForm::Logarithmic => ComplexityExpression::Logarithmic {
            coefficient: coeff,
            var,
            base: 2.0,
        },
        ComplexityForm::Polynomial => {
            if class.primary_parameter == 1.0 {
                ComplexityExpression::Linear { coefficient: coeff, var }
            } else {
                let mut coeffs = BTreeMap::new();
                coeffs.insert(class.primary_parameter.round() as u32, coeff);
                ComplexityExpression::Polynomial { var, coeffs }
            }
        }
        ComplexityForm::PolyLog => ComplexityExpression::PolyLog {
            coefficient: coeff,
            var,
            poly_exp: class.primary_parameter,
            log_exp: class.log_exponent,
        },
        ComplexityForm::Exponential => ComplexityExpression::Exponential {
            coefficient: coeff,
            base: class.primary_parameter,
            var,
        },
        ComplexityForm::Factorial => ComplexityExpression::Factorial { var },
        ComplexityForm::Unknown => ComplexityExpression::Constant(coeff),
    }
}

fn ordered_float(f: f64) -> i64 {
    (f * 1_000_000.0).round() as i64
}

fn rebuild_sum(mut terms: Vec<ComplexityExpression>) -> ComplexityExpression {
    terms.retain(|t| !matches!(t, ComplexityExpression::Constant(c) if *c == 0.0));
    let mut iter = terms.into_iter();
    match iter.next() {
        None => ComplexityExpression::Constant(0.0),
        Some(first) => iter.fold(first, |acc, t| ComplexityExpression::Binary {
            op: BinOp::Add,
            left: Rc::new(acc),
            right: Rc::new(t),
        }),
    }
}

fn simplify_mul(l: ComplexityExpression, r: ComplexityExpression) -> ComplexityExpression {
    use ComplexityExpression::*;
    match (&l, &r) {
        (Constant(a), Constant(b)) => Constant(a * b),
        (Constant(c), _) if *c == 1.0 => r,
        (_, Constant(c)) if *c == 1.0 => l,
        (Constant(c), _) if *c == 0.0 => Constant(0.0),
        (_, Constant(c)) if *c == 0.0 => Constant(0.0),
        _ => {
            if let Some(merged) = merge_poly_log_product(&l, &r) {
                merged
            } else {
                Binary {
                    op: BinOp::Mul,
                    left: Rc::new(l),
                    right: Rc::new(r),
                }
            }
        }
    }
}

/// `n^k * log^j n` style merging: if both factors are elementary
/// same-variable poly/log terms, fold the exponents together rather than
/// leaving a `Mul` node (spec.md §4.1 "Merge poly-log multiplications by
/// summing both the polynomial and log exponents").
fn merge_poly_log_product(l: &ComplexityExpression, r: &ComplexityExpression) -> Option<ComplexityExpression> {
    let (var_l, poly_l, log_l, coeff_l) = poly_log_shape(l)?;
    let (var_r, poly_r, log_r, coeff_r) = poly_log_shape(r)?;
    if var_l != var_r {
        return None;
    }
    let poly_exp = poly_l + poly_r;
    let log_exp = log_l + log_r;
    let coeff = coeff_l * coeff_r;
    Some(if log_exp == 0.0 {
        simplify_poly_map(&var_l, &BTreeMap::from([(poly_exp.round() as u32, coeff)]))
    } else {
        ComplexityExpression::PolyLog {
            coefficient: coeff,
            var: var_l,
            poly_exp,
            log_exp,
        }
    })
}

fn poly_log_shape(expr: &ComplexityExpression) -> Option<(Variable, f64, f64, f64)> {
    use ComplexityExpression::*;
    match expr {
        ComplexityExpression::Var(v) => Some((v.clone(), 1.0, 0.0, 1.0)),
        Linear { coefficient, var } => Some((var.clone(), 1.0, 0.0, *coefficient)),
        Polynomial { var, coeffs } if coeffs.len() == 1 => {
            let (&d, &c) = coeffs.iter().next().unwrap();
            Some((var.clone(), d as f64, 0.0, c))
        }
        Logarithmic { coefficient, var, .. } => Some((var.clone(), 0.0, 1.0, *coefficient)),
        PolyLog {
            coefficient,
            var,
            poly_exp,
            log_exp,
        } => Some((var.clone(), *poly_exp, *log_exp, *coefficient)),
        _ => None,
    }
}

fn simplify_extremum(l: ComplexityExpression, r: ComplexityExpression, is_max: bool) -> ComplexityExpression {
    if l == r {
        return l;
    }
    let fv_l = l.free_variables();
    let fv_r = r.free_variables();
    if fv_l == fv_r && fv_l.len() <= 1 {
        let var = fv_l.into_iter().next();
        let cl = classify(&l, var.clone());
        let cr = classify(&r, var);
        if cl.form != ComplexityForm::Unknown && cr.form != ComplexityForm::Unknown {
            return match compare_asymptotic(&cl, &cr) {
                ord if is_max && ord >= 0 => l,
                ord if is_max && ord < 0 => r,
                ord if !is_max && ord <= 0 => l,
                _ => r,
            };
        }
    }
    ComplexityExpression::Binary {
        op: if is_max { BinOp::Max } else { BinOp::Min },
        left: Rc::new(l),
        right: Rc::new(r),
    }
}
