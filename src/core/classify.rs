//! Classification, simplification support, and asymptotic comparison.
//!
//! Implements spec.md §4.2: given an expression and a chosen variable,
//! determine which of `{constant, logarithmic, polynomial, polylog,
//! exponential, factorial, unknown}` it belongs to, with the dominant
//! parameters (polynomial degree, log exponent, exponential base) needed
//! to compare two classifications under the total asymptotic order
//! `1 < log n < n < n log n < n^k (k>1) < 2^n < n!`.

use std::cmp::Ordering;

use super::expr::{BinOp, ComplexityExpression, SpecialFunction};
use super::variable::Variable;

/// Which of the elementary growth-rate families an expression belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ComplexityForm {
    Constant,
    Logarithmic,
    Polynomial,
    PolyLog,
    Exponential,
    Factorial,
    Unknown,
}

impl ComplexityForm {
    pub(crate) fn tier(self) -> u8 {
        match self {
            ComplexityForm::Constant => 0,
            ComplexityForm::Logarithmic => 1,
            ComplexityForm::Polynomial | ComplexityForm::PolyLog => 2,
            ComplexityForm::Exponential => 3,
            ComplexityForm::Factorial => 4,
            // Conservatively assumed to dominate: an unclassified term
            // might hide arbitrary growth, so treat it as the worst case
            // rather than silently under-reporting.
            ComplexityForm::Unknown => 5,
        }
    }
}

/// The result of classifying an expression with respect to a variable.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Classification {
    pub form: ComplexityForm,
    pub variable: Option<Variable>,
    /// Polynomial degree (`Polynomial`/`PolyLog`), or exponential base
    /// (`Exponential`); unused (`0.0`) otherwise.
    pub primary_parameter: f64,
    /// Log exponent `j` in `log^j n` (`Logarithmic`/`PolyLog`).
    pub log_exponent: f64,
    /// Leading coefficient.
    pub coefficient: f64,
    /// Confidence in `[0, 1]`, reduced by incomparable `max`/`min`
    /// branches and by special-function/unknown leaves.
    pub confidence: f64,
}

impl Classification {
    fn new(form: ComplexityForm, var: Option<&Variable>, primary: f64, log_exp: f64, coeff: f64, confidence: f64) -> Self {
        Classification {
            form,
            variable: var.cloned(),
            primary_parameter: primary,
            log_exponent: log_exp,
            coefficient: coeff,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    fn constant(var: Option<&Variable>) -> Self {
        Classification::new(ComplexityForm::Constant, var, 0.0, 0.0, 1.0, 1.0)
    }

    fn unknown(var: Option<&Variable>, confidence: f64) -> Self {
        Classification::new(ComplexityForm::Unknown, var, 0.0, 0.0, 1.0, confidence)
    }

    /// Ordering key for the total asymptotic order.
    fn order_key(&self) -> (u8, f64, f64) {
        (self.form.tier(), self.primary_parameter, self.log_exponent)
    }

    /// Render the Big-O string for this classification, e.g. `"O(n log n)"`.
    pub fn big_o_string(&self) -> String {
        let var = self
            .variable
            .as_ref()
            .map(|v| v.name.clone())
            .unwrap_or_else(|| "n".to_string());
        match self.form {
            ComplexityForm::Constant => "O(1)".to_string(),
            ComplexityForm::Logarithmic => {
                if (self.log_exponent - 1.0).abs() < 1e-9 {
                    format!("O(log {var})")
                } else {
                    format!("O(log^{:.0} {var})", self.log_exponent)
                }
            }
            ComplexityForm::Polynomial => render_poly(&var, self.primary_parameter),
            ComplexityForm::PolyLog => {
                let log = if (self.log_exponent - 1.0).abs() < 1e-9 {
                    format!("log {var}")
                } else {
                    format!("log^{:.0} {var}", self.log_exponent)
                };
                if self.primary_parameter.abs() < 1e-9 {
                    format!("O({log})")
                } else {
                    let poly = render_poly_bare(&var, self.primary_parameter);
                    format!("O({poly} {log})")
                }
            }
            ComplexityForm::Exponential => {
                let base = self.primary_parameter;
                if (base - base.round()).abs() < 1e-9 {
                    format!("O({}^{var})", base.round() as i64)
                } else {
                    format!("O({base:.3}^{var})")
                }
            }
            ComplexityForm::Factorial => format!("O({var}!)"),
            ComplexityForm::Unknown => "O(?)".to_string(),
        }
    }
}

fn render_poly(var: &str, degree: f64) -> String {
    if (degree - 1.0).abs() < 1e-9 {
        format!("O({var})")
    } else if (degree - degree.round()).abs() < 1e-9 {
        format!("O({var}^{})", degree.round() as i64)
    } else {
        format!("O({var}^{degree:.3})")
    }
}

fn render_poly_bare(var: &str, degree: f64) -> String {
    if (degree - 1.0).abs() < 1e-9 {
        var.to_string()
    } else if (degree - degree.round()).abs() < 1e-9 {
        format!("{var}^{}", degree.round() as i64)
    } else {
        format!("{var}^{degree:.3}")
    }
}

/// Classify `expr` with respect to `var`. Subexpressions not mentioning
/// `var` at all classify as `Constant` -- the classifier is always
/// relative to a single chosen variable, per spec.md §4.2.
pub fn classify(expr: &ComplexityExpression, var: Option<Variable>) -> Classification {
    match &var {
        None => classify_no_var(expr),
        Some(v) => classify_with_var(expr, v),
    }
}

fn classify_no_var(expr: &ComplexityExpression) -> Classification {
    // No variable was named and the expression has none free: it is
    // trivially constant.
    if expr.free_variables().is_empty() {
        return Classification::constant(None);
    }
    // Otherwise classify with respect to the expression's own default
    // dominant variable so callers still get a useful answer.
    let v = expr.dominant_variable();
    classify_with_var(expr, v.as_ref().unwrap())
}

fn classify_with_var(expr: &ComplexityExpression, var: &Variable) -> Classification {
    if !expr.free_variables().contains(var) {
        return Classification::constant(Some(var));
    }
    use ComplexityExpression::*;
    match expr {
        Constant(c) => Classification::new(ComplexityForm::Constant, Some(var), 0.0, 0.0, c.abs(), 1.0),
        Var(v) if v == var => Classification::new(ComplexityForm::Polynomial, Some(var), 1.0, 0.0, 1.0, 1.0),
        Var(_) => Classification::constant(Some(var)),
        Linear { coefficient, var: v } if v == var => {
            Classification::new(ComplexityForm::Polynomial, Some(var), 1.0, 0.0, coefficient.abs(), 1.0)
        }
        Linear { .. } => Classification::constant(Some(var)),
        Polynomial { var: v, coeffs } if v == var => {
            let (degree, coeff) = coeffs
                .iter()
                .filter(|(_, &c)| c != 0.0)
                .map(|(&d, &c)| (d as f64, c.abs()))
                .fold((0.0, 0.0), |acc, cur| if cur.0 >= acc.0 { cur } else { acc });
            Classification::new(ComplexityForm::Polynomial, Some(var), degree, 0.0, coeff, 1.0)
        }
        Polynomial { .. } => Classification::constant(Some(var)),
        Logarithmic { coefficient, var: v, .. } if v == var => {
            Classification::new(ComplexityForm::Logarithmic, Some(var), 0.0, 1.0, coefficient.abs(), 1.0)
        }
        Logarithmic { .. } => Classification::constant(Some(var)),
        PolyLog {
            coefficient,
            var: v,
            poly_exp,
            log_exp,
        } if v == var => Classification::new(ComplexityForm::PolyLog, Some(var), *poly_exp, *log_exp, coefficient.abs(), 1.0),
        PolyLog { .. } => Classification::constant(Some(var)),
        Exponential { coefficient, base, var: v } if v == var => {
            Classification::new(ComplexityForm::Exponential, Some(var), *base, 0.0, coefficient.abs(), 1.0)
        }
        Exponential { .. } => Classification::constant(Some(var)),
        Factorial { var: v } if v == var => Classification::new(ComplexityForm::Factorial, Some(var), 0.0, 0.0, 1.0, 1.0),
        Factorial { .. } => Classification::constant(Some(var)),
        Binary { op, left, right } => {
            let l = classify_with_var(left, var);
            let r = classify_with_var(right, var);
            combine_binary(*op, l, r)
        }
        Conditional {
            then_branch, else_branch, ..
        } => {
            let l = classify_with_var(then_branch, var);
            let r = classify_with_var(else_branch, var);
            combine_binary(BinOp::Max, l, r)
        }
        PowerOf { base, exponent } => classify_power_of(base, exponent, var),
        LogOf { argument, .. } => {
            let inner = classify_with_var(argument, var);
            Classification::new(ComplexityForm::Logarithmic, Some(var), 0.0, 1.0, inner.coefficient.max(1.0), inner.confidence)
        }
        ExpOf { exponent, base } => {
            let inner = classify_with_var(exponent, var);
            Classification::new(ComplexityForm::Exponential, Some(var), *base, 0.0, 1.0, inner.confidence)
        }
        FactorialOf { .. } => Classification::new(ComplexityForm::Factorial, Some(var), 0.0, 0.0, 1.0, 0.9),
        Special(special) => classify_special(special, var),
        Amortized { amortized, .. } => classify_with_var(amortized, var),
        Parallel { work, .. } => classify_with_var(work, var),
        Probabilistic { worst, .. } => classify_with_var(worst, var),
        Memory { total, .. } => classify_with_var(total, var),
        InverseAckermann { var: v } if v == var => {
            Classification::new(ComplexityForm::Logarithmic, Some(var), 0.0, 0.01, 1.0, 0.8)
        }
        InverseAckermann { .. } => Classification::constant(Some(var)),
    }
}

fn classify_power_of(base: &ComplexityExpression, exponent: &ComplexityExpression, var: &Variable) -> Classification {
    let base_has_var = base.free_variables().contains(var);
    let exp_has_var = exponent.free_variables().contains(var);
    match (base_has_var, exp_has_var) {
        (true, false) => {
            if let Some(k) = as_constant(exponent) {
                let base_class = classify_with_var(base, var);
                Classification::new(
                    ComplexityForm::Polynomial,
                    Some(var),
                    base_class.primary_parameter * k,
                    0.0,
                    base_class.coefficient,
                    base_class.confidence,
                )
            } else {
                Classification::unknown(Some(var), 0.4)
            }
        }
        (false, true) => {
            if let Some(b) = as_constant(base) {
                Classification::new(ComplexityForm::Exponential, Some(var), b, 0.0, 1.0, 0.9)
            } else {
                Classification::unknown(Some(var), 0.4)
            }
        }
        (true, true) => Classification::unknown(Some(var), 0.3),
        (false, false) => Classification::constant(Some(var)),
    }
}

fn as_constant(expr: &ComplexityExpression) -> Option<f64> {
    match expr {
        ComplexityExpression::Constant(c) => Some(*c),
        _ => None,
    }
}

fn classify_special(special: &SpecialFunction, var: &Variable) -> Classification {
    match special {
        SpecialFunction::SymbolicIntegral {
            asymptotic_estimate,
            variable,
            ..
        } if variable == var => {
            let mut inner = classify_with_var(asymptotic_estimate, var);
            inner.confidence *= 0.6;
            inner
        }
        _ => Classification::unknown(Some(var), 0.4),
    }
}

fn combine_binary(op: BinOp, l: Classification, r: Classification) -> Classification {
    match op {
        BinOp::Add | BinOp::Max => {
            let confidence_penalty =
                if l.form == ComplexityForm::Unknown || r.form == ComplexityForm::Unknown { 0.5 } else { 1.0 };
            match l.order_key().partial_cmp(&r.order_key()).unwrap_or(Ordering::Equal) {
                Ordering::Greater => scaled(l, confidence_penalty),
                Ordering::Less => scaled(r, confidence_penalty),
                Ordering::Equal => {
                    let mut combined = l.clone();
                    combined.coefficient = l.coefficient + r.coefficient;
                    combined.confidence = (l.confidence.min(r.confidence)) * confidence_penalty;
                    combined
                }
            }
        }
        BinOp::Min => match l.order_key().partial_cmp(&r.order_key()).unwrap_or(Ordering::Equal) {
            Ordering::Less => l,
            Ordering::Greater => r,
            Ordering::Equal => l,
        },
        BinOp::Mul => combine_mul(l, r),
    }
}

fn scaled(mut c: Classification, factor: f64) -> Classification {
    c.confidence = (c.confidence * factor).clamp(0.0, 1.0);
    c
}

fn combine_mul(l: Classification, r: Classification) -> Classification {
    use ComplexityForm::*;
    // Exponential or factorial absorb any polynomial/log factor
    // asymptotically; this loses the sub-dominant factor's exact shape,
    // which is why confidence is shaved slightly (spec.md §4.1 "drop
    // dominated terms").
    if matches!(l.form, Exponential | Factorial) || matches!(r.form, Exponential | Factorial) {
        let dominant = if l.form.tier() >= r.form.tier() { &l } else { &r };
        let mut out = dominant.clone();
        out.coefficient = l.coefficient * r.coefficient;
        out.confidence = (l.confidence.min(r.confidence) * 0.95).clamp(0.0, 1.0);
        return out;
    }
    if l.form == Unknown || r.form == Unknown {
        return Classification::unknown(l.variable.as_ref().or(r.variable.as_ref()), l.confidence.min(r.confidence) * 0.5);
    }
    let degree = l.primary_parameter + r.primary_parameter;
    let log_exp = l.log_exponent + r.log_exponent;
    let form = if log_exp > 0.0 {
        PolyLog
    } else if degree > 0.0 {
        Polynomial
    } else {
        Constant
    };
    Classification::new(
        form,
        l.variable.as_ref().or(r.variable.as_ref()),
        degree,
        log_exp,
        l.coefficient * r.coefficient,
        l.confidence.min(r.confidence),
    )
}

/// Total order over classifications: `-1`/`0`/`1` for "grows strictly
/// slower"/"ties"/"grows strictly faster", matching spec.md §4.2's
/// `1 < log n < n < n log n < n^k (k>1) < 2^n < n!`.
pub fn compare_asymptotic(a: &Classification, b: &Classification) -> i32 {
    match a.order_key().partial_cmp(&b.order_key()).unwrap_or(Ordering::Equal) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expr::ComplexityExpression as E;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    fn poly(var: &Variable, degree: u32, coeff: f64) -> E {
        let mut coeffs = BTreeMap::new();
        coeffs.insert(degree, coeff);
        E::Polynomial { var: var.clone(), coeffs }
    }

    #[test]
    fn classifies_quadratic() {
        let n = Variable::n();
        let c = classify(&poly(&n, 2, 1.0), Some(n));
        assert_eq!(c.form, ComplexityForm::Polynomial);
        assert_eq!(c.primary_parameter, 2.0);
    }

    #[test]
    fn drop_lower_order_terms_quadratic_dominates() {
        let n = Variable::n();
        let log_n = E::Logarithmic {
            coefficient: 1.0,
            var: n.clone(),
            base: 2.0,
        };
        let linear = E::Linear {
            coefficient: 1.0,
            var: n.clone(),
        };
        let quad = poly(&n, 2, 1.0);
        let sum = E::Binary {
            op: BinOp::Add,
            left: Rc::new(quad),
            right: Rc::new(E::Binary {
                op: BinOp::Add,
                left: Rc::new(linear),
                right: Rc::new(log_n),
            }),
        };
        let c = classify(&sum, Some(n));
        assert_eq!(c.form, ComplexityForm::Polynomial);
        assert_eq!(c.primary_parameter, 2.0);
        assert_eq!(c.big_o_string(), "O(n^2)");
    }

    #[test]
    fn asymptotic_order_respects_total_order() {
        let n = Variable::n();
        let log_c = classify(
            &E::Logarithmic {
                coefficient: 1.0,
                var: n.clone(),
                base: 2.0,
            },
            Some(n.clone()),
        );
        let lin_c = classify(&poly(&n, 1, 1.0), Some(n.clone()));
        assert_eq!(compare_asymptotic(&log_c, &lin_c), -1);
    }
}
