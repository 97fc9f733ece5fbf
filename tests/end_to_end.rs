//! End-to-end scenarios (spec.md §8).

use std::collections::BTreeMap;

use complexity_core::bench::curvefit::{verify_complexity_claim, CurveClass};
use complexity_core::bench::runner::{BenchmarkPreset, CancellationToken};
use complexity_core::config::EngineConfig;
use complexity_core::core::attributed::{AttributedComplexity, Source, SourceKind};
use complexity_core::core::classify::classify;
use complexity_core::core::expr::ComplexityExpression;
use complexity_core::core::recurrence::{DivideRecurrence, DivideTerm, LinearRecurrence, RecurrenceRelation};
use complexity_core::core::variable::Variable;
use complexity_core::refine::verify_bound;
use complexity_core::solver::{applicable_theorem, solve, MasterCase, TheoremApplicability};

fn n() -> Variable {
    Variable::n()
}

/// 1. `2*T(n/2) + n` is a Master case 2 recurrence: "O(n log n)", form
/// poly-log with degree 1, log exponent 1.
#[test]
fn scenario_one_merge_sort_master_case_two() {
    let rec = RecurrenceRelation::Divide(DivideRecurrence::single_term(
        n(),
        2.0,
        2.0,
        ComplexityExpression::Linear { coefficient: 1.0, var: n() },
    ));
    let config = EngineConfig::default();
    assert_eq!(applicable_theorem(&rec, &config), TheoremApplicability::MasterApplies(MasterCase::Balanced));
    let result = solve(&rec, &config).unwrap();
    assert_eq!(result.expression.big_o(), "O(n log n)");
    let classification = classify(&result.expression, Some(n()));
    assert!((classification.primary_parameter - 1.0).abs() < 1e-6);
    assert!((classification.log_exponent - 1.0).abs() < 1e-6);
}

/// 2. `T(n/3) + T(2n/3) + n`: Akra-Bazzi, p ~ 1.0, integral yields
/// `log n`, final "O(n log n)", confidence >= 0.7.
#[test]
fn scenario_two_unbalanced_akra_bazzi() {
    let rec = RecurrenceRelation::Divide(DivideRecurrence::new(
        n(),
        vec![DivideTerm::new(1.0, 3.0), DivideTerm::new(1.0, 1.5)],
        ComplexityExpression::Linear { coefficient: 1.0, var: n() },
    ));
    let config = EngineConfig::default();
    assert_eq!(applicable_theorem(&rec, &config), TheoremApplicability::AkraBazziApplies);
    let result = solve(&rec, &config).unwrap();
    assert_eq!(result.expression.big_o(), "O(n log n)");
    assert!(result.source.confidence >= 0.7);
}

/// 3. Linear recurrence `[1, 1]`, homogeneous, base `O(1)`: dominant
/// root 1.61803, solution string contains "1.618".
#[test]
fn scenario_three_fibonacci_dominant_root() {
    let rec = RecurrenceRelation::Linear(LinearRecurrence::new(n(), vec![1.0, 1.0], ComplexityExpression::Constant(0.0)));
    let config = EngineConfig::default();
    let result = solve(&rec, &config).unwrap();
    assert!(result.expression.big_o().contains("1.618"));
}

/// 4. A benchmark of a linear scan across sizes 100..50000 is verified
/// as O(n) with R^2 >= 0.95 and a positive constant factor.
#[test]
fn scenario_four_linear_scan_benchmark_verifies_as_linear() {
    use complexity_core::bench::runner::run_benchmark;
    use complexity_core::bench::runner::NoAllocationProbe;

    let grid = vec![100usize, 1000, 10000, 50000];
    let token = CancellationToken::new();
    let result = run_benchmark(
        |size| {
            let data: Vec<u64> = (0..size as u64).collect();
            let mut sum = 0u64;
            for x in &data {
                sum = sum.wrapping_add(*x);
            }
            std::hint::black_box(sum);
        },
        &grid,
        BenchmarkPreset::Quick.warmup_iterations(),
        BenchmarkPreset::Quick.measurement_iterations(),
        &token,
        NoAllocationProbe,
    )
    .unwrap();

    let claimed = ComplexityExpression::Linear { coefficient: 1.0, var: n() };
    let verification = verify_complexity_claim(&claimed, &result);
    assert!(verification.claimed_fit.coefficient > 0.0);
    assert_eq!(verification.best_fit.class, CurveClass::Linear);
}

/// 5. The analyzer must not select Master on a two-term divide
/// recurrence; it must fall through to Akra-Bazzi.
#[test]
fn scenario_five_two_term_recurrence_never_uses_master() {
    let rec = RecurrenceRelation::Divide(DivideRecurrence::new(
        n(),
        vec![DivideTerm::new(1.0, 3.0), DivideTerm::new(1.0, 1.5)],
        ComplexityExpression::Linear { coefficient: 1.0, var: n() },
    ));
    let config = EngineConfig::default();
    match applicable_theorem(&rec, &config) {
        TheoremApplicability::AkraBazziApplies => {}
        other => panic!("expected AkraBazziApplies, got {other:?}"),
    }
}

/// 6. `2*T(n/2) + n^0.95`: boundary case close to the Master case 1/2
/// transition; perturbation should flag it and confidence should drop
/// below 0.8 with a review note attached.
#[test]
fn scenario_six_near_boundary_case_flags_for_review() {
    let combine = ComplexityExpression::PowerOf {
        base: std::rc::Rc::new(ComplexityExpression::Var(n())),
        exponent: std::rc::Rc::new(ComplexityExpression::Constant(0.95)),
    };
    let rec = RecurrenceRelation::Divide(DivideRecurrence::single_term(n(), 2.0, 2.0, combine));
    let config = EngineConfig::default();
    let bound = solve(&rec, &config).unwrap();
    let refined = verify_bound(&rec, bound, &config).unwrap();
    assert!(refined.refined.source.confidence < 0.8 || refined.refined.source.review_required(config.review_threshold));
}

#[test]
fn attributed_complexity_can_round_trip_through_serde_json() {
    let attributed = AttributedComplexity::new(
        ComplexityExpression::Polynomial {
            var: n(),
            coeffs: BTreeMap::from([(2, 1.0)]),
        },
        Source::new(SourceKind::Inferred, 0.9),
    );
    let serialized = serde_json::to_string(&attributed).unwrap();
    let deserialized: AttributedComplexity = serde_json::from_str(&serialized).unwrap();
    assert_eq!(attributed.expression.big_o(), deserialized.expression.big_o());
}
