//! The refinement engine (spec.md §4.4): a five-stage pipeline that
//! takes a solver's symbolic bound and checks/tightens it against the
//! recurrence it was derived from, purely numerically (no code is run
//! here -- that is `crate::bench`'s job). Stages: slack optimization,
//! perturbation expansion, induction verification, and confidence
//! scoring; the fifth "stage" is simply running the first three and
//! folding their effect on confidence.

pub mod induction;
pub mod perturbation;
pub mod slack;

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::core::attributed::AttributedComplexity;
use crate::core::fold_mutual_recursion;
use crate::core::recurrence::{DivideRecurrence, LinearRecurrence, RecurrenceRelation};
use crate::error::Result;

/// One stage's effect on the candidate bound, kept for diagnostics.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StageRecord {
    pub stage: &'static str,
    pub note: String,
    pub confidence_before: f64,
    pub confidence_after: f64,
}

/// Outcome of running the full refinement pipeline on a candidate bound.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RefinementResult {
    pub original: AttributedComplexity,
    pub refined: AttributedComplexity,
    pub stages: Vec<StageRecord>,
}

impl RefinementResult {
    /// `true` when every stage ran without driving confidence below the
    /// configured review threshold.
    pub fn passed(&self, config: &EngineConfig) -> bool {
        !self.refined.source.review_required(config.review_threshold)
    }
}

/// The refinement pipeline, configured once and reused across calls
/// (mirrors `EngineConfig`'s own builder-style threading rather than a
/// mutable global instance).
#[derive(Debug, Clone)]
pub struct RefinementEngine {
    config: EngineConfig,
}

impl RefinementEngine {
    pub fn new(config: EngineConfig) -> Self {
        RefinementEngine { config }
    }

    /// Run the pipeline: slack optimization, perturbation expansion,
    /// induction verification.
    pub fn refine(&self, relation: &RecurrenceRelation, candidate: AttributedComplexity) -> RefinementResult {
        let original = candidate.clone();
        let mut stages = Vec::new();

        let (after_slack, slack_record) = slack::optimize_slack(relation, candidate, &self.config);
        stages.push(slack_record);

        let (after_perturbation, perturbation_record) = perturbation::expand_perturbation(relation, after_slack, &self.config);
        stages.push(perturbation_record);

        let (after_induction, induction_record) = induction::verify_induction(relation, after_perturbation, &self.config);
        stages.push(induction_record);

        RefinementResult {
            original,
            refined: after_induction,
            stages,
        }
    }
}

/// Free-function entry point for callers that do not need a persistent
/// engine.
pub fn verify_bound(relation: &RecurrenceRelation, candidate: AttributedComplexity, config: &EngineConfig) -> Result<RefinementResult> {
    Ok(RefinementEngine::new(config.clone()).refine(relation, candidate))
}

/// Numerically unroll `relation` at `n`, the ground truth the
/// refinement stages check candidate bounds against.
pub(crate) fn simulate_recurrence(relation: &RecurrenceRelation, n: u64) -> f64 {
    match relation {
        RecurrenceRelation::Linear(l) => simulate_linear(l, n),
        RecurrenceRelation::Divide(d) => {
            let mut memo = HashMap::new();
            simulate_divide(d, n, &mut memo)
        }
        RecurrenceRelation::Mutual(m) => simulate_recurrence(&fold_mutual_recursion(m), n),
    }
}

fn simulate_linear(l: &LinearRecurrence, n: u64) -> f64 {
    let order = l.order().max(1);
    if (n as usize) < order {
        return 1.0;
    }
    let mut values: Vec<f64> = vec![1.0; order];
    for k in order as u64..=n {
        let mut assignments = HashMap::new();
        assignments.insert(l.variable.clone(), k as f64);
        let mut val = l.inhomogeneous.evaluate(&assignments).unwrap_or(0.0);
        for (i, &c) in l.coefficients.iter().enumerate() {
            let idx = values.len() - 1 - i;
            val += c * values[idx];
        }
        values.push(val);
        values.remove(0);
    }
    *values.last().unwrap()
}

fn simulate_divide(d: &DivideRecurrence, n: u64, memo: &mut HashMap<u64, f64>) -> f64 {
    if n <= 1 {
        return 1.0;
    }
    if let Some(&v) = memo.get(&n) {
        return v;
    }
    let mut assignments = HashMap::new();
    assignments.insert(d.variable.clone(), n as f64);
    let f_n = d.combine_cost.evaluate(&assignments).unwrap_or(0.0).max(0.0);
    let mut total = f_n;
    for term in &d.terms {
        let reduced = ((n as f64) / term.size_divisor).floor() as u64;
        let reduced = reduced.min(n.saturating_sub(1));
        total += term.subproblem_count * simulate_divide(d, reduced, memo);
    }
    memo.insert(n, total);
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expr::ComplexityExpression;
    use crate::core::recurrence::DivideTerm;
    use crate::core::variable::Variable;

    #[test]
    fn fibonacci_simulation_matches_known_values() {
        let rec = RecurrenceRelation::Linear(LinearRecurrence::new(
            Variable::n(),
            vec![1.0, 1.0],
            ComplexityExpression::Constant(0.0),
        ));
        // With both seeds at 1.0 this is the Fibonacci recurrence shifted
        // by an index offset; what matters here is growth, not the exact
        // index convention.
        let v10 = simulate_recurrence(&rec, 10);
        let v20 = simulate_recurrence(&rec, 20);
        assert!(v20 > v10 * 10.0);
    }

    #[test]
    fn merge_sort_simulation_grows_like_n_log_n() {
        let rec = RecurrenceRelation::Divide(DivideRecurrence::single_term(
            Variable::n(),
            2.0,
            2.0,
            ComplexityExpression::Linear {
                coefficient: 1.0,
                var: Variable::n(),
            },
        ));
        let v1024 = simulate_recurrence(&rec, 1024);
        let v2048 = simulate_recurrence(&rec, 2048);
        // Doubling n should a bit more than double the cost (the extra
        // `log n` factor), not hold flat and not quadruple.
        assert!(v2048 > v1024 * 2.0);
        assert!(v2048 < v1024 * 3.0);
    }
}
