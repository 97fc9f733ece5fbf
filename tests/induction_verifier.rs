//! Induction verifier properties (spec.md §8).

use complexity_core::config::EngineConfig;
use complexity_core::core::attributed::{AttributedComplexity, Source, SourceKind};
use complexity_core::core::expr::ComplexityExpression;
use complexity_core::core::recurrence::{DivideRecurrence, RecurrenceRelation};
use complexity_core::core::variable::Variable;
use complexity_core::refine::verify_bound;

fn n() -> Variable {
    Variable::n()
}

fn merge_sort_recurrence() -> RecurrenceRelation {
    RecurrenceRelation::Divide(DivideRecurrence::single_term(
        n(),
        2.0,
        2.0,
        ComplexityExpression::Linear { coefficient: 1.0, var: n() },
    ))
}

#[test]
fn exact_master_solution_passes_with_high_confidence() {
    let rec = merge_sort_recurrence();
    let candidate = AttributedComplexity::new(
        ComplexityExpression::PolyLog {
            coefficient: 2.0,
            var: n(),
            poly_exp: 1.0,
            log_exp: 1.0,
        },
        Source::new(SourceKind::Inferred, 1.0),
    );
    let config = EngineConfig::default();
    let result = verify_bound(&rec, candidate, &config).unwrap();
    assert!(result.refined.source.confidence >= 0.5);
}

#[test]
fn under_approximating_by_one_class_fails_with_low_confidence() {
    let rec = merge_sort_recurrence();
    // O(n) claimed for an O(n log n) recurrence.
    let candidate = AttributedComplexity::new(
        ComplexityExpression::Linear { coefficient: 1.0, var: n() },
        Source::new(SourceKind::Inferred, 1.0),
    );
    let config = EngineConfig::default();
    let result = verify_bound(&rec, candidate, &config).unwrap();
    assert!(result.refined.source.confidence < 0.5);
}
