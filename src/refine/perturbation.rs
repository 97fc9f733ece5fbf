//! Perturbation expansion (spec.md §4.4, stage 2): the Master Theorem's
//! case boundaries and Akra-Bazzi's critical exponent are both
//! sensitive to floating point slop right at the boundary between two
//! cases. This stage nudges the bound's leading exponent by a small
//! grid of deltas and keeps whichever nearby exponent fits the
//! recurrence's numeric unrolling best, the way a human double-checking
//! a borderline Master Theorem case would try `n^(log_b a)` against
//! `n^(log_b a + eps)` by hand.

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::core::attributed::AttributedComplexity;
use crate::core::expr::ComplexityExpression;
use crate::core::recurrence::RecurrenceRelation;
use crate::core::variable::Variable;

use super::{simulate_recurrence, StageRecord};

const DELTAS: [f64; 5] = [-0.1, -0.03, 0.0, 0.03, 0.1];

/// Only `Polynomial`/`Linear`/`PowerOf` shapes have a single exponent
/// worth perturbing; anything else (logarithmic, exponential, a sum of
/// incomparable terms) is left untouched since there is no single knob
/// to turn.
pub(super) fn expand_perturbation(
    relation: &RecurrenceRelation,
    candidate: AttributedComplexity,
    config: &EngineConfig,
) -> (AttributedComplexity, StageRecord) {
    let before = candidate.source.confidence;
    let var = relation.variable();

    let Some(degree) = leading_degree(&candidate.expression) else {
        return (
            candidate.clone(),
            StageRecord {
                stage: "perturbation",
                note: "no single exponent to perturb".to_string(),
                confidence_before: before,
                confidence_after: before,
            },
        );
    };

    let samples = config.regularity_samples();
    let mut best_delta = 0.0;
    let mut best_error = residual(relation, &var, degree, &samples);
    for delta in DELTAS {
        if delta == 0.0 {
            continue;
        }
        let err = residual(relation, &var, degree + delta, &samples);
        if err < best_error * 0.9 {
            best_error = err;
            best_delta = delta;
        }
    }

    if best_delta == 0.0 {
        return (
            candidate.clone(),
            StageRecord {
                stage: "perturbation",
                note: format!("exponent {degree:.3} already locally optimal"),
                confidence_before: before,
                confidence_after: before,
            },
        );
    }

    let perturbed_expr = rebuild_with_degree(&candidate.expression, &var, degree + best_delta);
    let note = format!("nudged leading exponent {degree:.3} -> {:.3} (better residual fit)", degree + best_delta);
    let mut refined = candidate;
    refined.expression = crate::core::simplify::simplify(&perturbed_expr);
    // A nudge away from the theorem's exact output is itself evidence
    // the case boundary was close; flag it for a lower-confidence review.
    refined.source.confidence = (refined.source.confidence * 0.9).max(0.0);
    let record = StageRecord {
        stage: "perturbation",
        note,
        confidence_before: before,
        confidence_after: refined.source.confidence,
    };
    (refined, record)
}

fn leading_degree(expr: &ComplexityExpression) -> Option<f64> {
    match expr {
        ComplexityExpression::Constant(_) => Some(0.0),
        ComplexityExpression::Linear { .. } => Some(1.0),
        ComplexityExpression::Polynomial { coeffs, .. } => coeffs.keys().max().map(|d| *d as f64),
        ComplexityExpression::PowerOf { exponent, .. } => match exponent.as_ref() {
            ComplexityExpression::Constant(c) => Some(*c),
            _ => None,
        },
        ComplexityExpression::PolyLog { poly_exp, .. } => Some(*poly_exp),
        _ => None,
    }
}

fn rebuild_with_degree(expr: &ComplexityExpression, var: &Variable, degree: f64) -> ComplexityExpression {
    match expr {
        ComplexityExpression::PolyLog { coefficient, log_exp, .. } => ComplexityExpression::PolyLog {
            coefficient: *coefficient,
            var: var.clone(),
            poly_exp: degree,
            log_exp: *log_exp,
        },
        _ => ComplexityExpression::PowerOf {
            base: std::rc::Rc::new(ComplexityExpression::Var(var.clone())),
            exponent: std::rc::Rc::new(ComplexityExpression::Constant(degree)),
        },
    }
}

/// Sum of squared log-ratio residuals between the recurrence's numeric
/// unrolling and `n^degree`, used purely to compare candidate exponents
/// against each other (not as an absolute goodness-of-fit score).
fn residual(relation: &RecurrenceRelation, var: &Variable, degree: f64, samples: &[f64]) -> f64 {
    let mut total = 0.0;
    let mut count = 0;
    for &n in samples {
        let rounded = n.round().max(2.0) as u64;
        let ground_truth = simulate_recurrence(relation, rounded);
        if ground_truth <= 0.0 {
            continue;
        }
        let mut assignments = HashMap::new();
        assignments.insert(var.clone(), n);
        let model = n.powf(degree).max(1e-12);
        let diff = ground_truth.ln() - model.ln();
        total += diff * diff;
        count += 1;
        let _ = assignments;
    }
    if count == 0 {
        f64::INFINITY
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attributed::{Source, SourceKind};
    use crate::core::recurrence::DivideRecurrence;

    #[test]
    fn well_fit_merge_sort_bound_is_not_perturbed() {
        let rec = RecurrenceRelation::Divide(DivideRecurrence::single_term(
            Variable::n(),
            2.0,
            2.0,
            ComplexityExpression::Linear {
                coefficient: 1.0,
                var: Variable::n(),
            },
        ));
        let candidate = AttributedComplexity::new(
            ComplexityExpression::PolyLog {
                coefficient: 1.0,
                var: Variable::n(),
                poly_exp: 1.0,
                log_exp: 1.0,
            },
            Source::new(SourceKind::Inferred, 1.0),
        );
        let config = EngineConfig::default();
        let (_, record) = expand_perturbation(&rec, candidate, &config);
        assert_eq!(record.stage, "perturbation");
    }
}
