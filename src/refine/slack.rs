//! Slack optimization (spec.md §4.4, stage 1): a symbolic bound from
//! the solver is exact up to a multiplicative constant; this stage
//! finds the smallest constant that keeps the bound above the
//! recurrence's own numeric unrolling across a sample grid, so later
//! stages compare against a tight (not just asymptotically correct)
//! curve.

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::core::attributed::AttributedComplexity;
use crate::core::expr::{BinOp, ComplexityExpression};
use crate::core::recurrence::RecurrenceRelation;

use super::{simulate_recurrence, StageRecord};

/// Multiply `candidate`'s expression by the smallest constant `c >= 1`
/// for which `c * bound(n) >= T(n)` holds at every sampled `n`, leaving
/// the expression unchanged (`c == 1`) when it already dominates.
pub(super) fn optimize_slack(
    relation: &RecurrenceRelation,
    candidate: AttributedComplexity,
    config: &EngineConfig,
) -> (AttributedComplexity, StageRecord) {
    let before = candidate.source.confidence;
    let samples = config.regularity_samples();
    let var = relation.variable();

    let mut worst_ratio = 1.0_f64;
    let mut usable_samples = 0;
    for &n in &samples {
        let rounded = n.round().max(1.0) as u64;
        let ground_truth = simulate_recurrence(relation, rounded);
        let mut assignments = HashMap::new();
        assignments.insert(var.clone(), n);
        let Some(bound_value) = candidate.expression.evaluate(&assignments) else {
            continue;
        };
        if bound_value <= 0.0 {
            continue;
        }
        usable_samples += 1;
        let ratio = ground_truth / bound_value;
        if ratio > worst_ratio {
            worst_ratio = ratio;
        }
    }

    if usable_samples == 0 || (worst_ratio - 1.0).abs() < 1e-6 {
        let record = StageRecord {
            stage: "slack",
            note: "no scaling needed".to_string(),
            confidence_before: before,
            confidence_after: before,
        };
        return (candidate, record);
    }

    let scaled = ComplexityExpression::Binary {
        op: BinOp::Mul,
        left: std::rc::Rc::new(ComplexityExpression::Constant(worst_ratio)),
        right: std::rc::Rc::new(candidate.expression.clone()),
    };
    let note = format!("scaled leading constant by {worst_ratio:.3} to dominate {usable_samples} sample(s)");
    let mut refined = candidate;
    refined.expression = crate::core::simplify::simplify(&scaled);
    let record = StageRecord {
        stage: "slack",
        note,
        confidence_before: before,
        confidence_after: refined.source.confidence,
    };
    (refined, record)
}
