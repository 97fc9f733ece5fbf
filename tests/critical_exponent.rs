//! Critical-exponent solver properties (spec.md §8): for any
//! `{a_i > 0, b_i in (0,1)}` with `sum a_i >= 1`, the solver returns a
//! `p` with `|sum a_i * b_i^p - 1| < 1e-8`.

use complexity_core::config::EngineConfig;
use complexity_core::core::recurrence::DivideTerm;
use complexity_core::solver::solve_critical_exponent;

fn residual(terms: &[DivideTerm], p: f64) -> f64 {
    let sum: f64 = terms.iter().map(|t| t.subproblem_count * t.size_divisor.powf(-p)).sum();
    (sum - 1.0).abs()
}

#[test]
fn merge_sort_terms_solve_to_p_near_one() {
    let terms = vec![DivideTerm::new(2.0, 2.0)];
    let config = EngineConfig::default();
    let p = solve_critical_exponent(&terms, &config).unwrap();
    assert!(residual(&terms, p) < 1e-8);
    assert!((p - 1.0).abs() < 1e-6);
}

#[test]
fn unbalanced_akra_bazzi_terms_solve_consistently() {
    let terms = vec![DivideTerm::new(1.0, 3.0), DivideTerm::new(1.0, 1.5)];
    let config = EngineConfig::default();
    let p = solve_critical_exponent(&terms, &config).unwrap();
    assert!(residual(&terms, p) < 1e-8);
}

#[test]
fn a_spread_of_random_like_term_sets_all_converge() {
    // Deterministic set standing in for "random with sum a_i >= 1",
    // spanning several term counts and divisor magnitudes.
    let cases: Vec<Vec<DivideTerm>> = vec![
        vec![DivideTerm::new(4.0, 2.0)],
        vec![DivideTerm::new(1.0, 1.2), DivideTerm::new(1.0, 1.1)],
        vec![DivideTerm::new(0.5, 1.3), DivideTerm::new(0.5, 1.3), DivideTerm::new(0.5, 1.3)],
        vec![DivideTerm::new(3.0, 4.0), DivideTerm::new(1.0, 2.0)],
    ];
    let config = EngineConfig::default();
    for terms in cases {
        let p = solve_critical_exponent(&terms, &config).unwrap();
        assert!(residual(&terms, p) < 1e-8, "residual too large for {terms:?} at p={p}");
    }
}

#[test]
fn non_positive_subproblem_count_is_rejected() {
    let terms = vec![DivideTerm::new(-1.0, 2.0)];
    let config = EngineConfig::default();
    assert!(solve_critical_exponent(&terms, &config).is_err());
}
