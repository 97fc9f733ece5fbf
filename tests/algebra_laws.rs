//! Algebraic laws the simplifier must satisfy (spec.md §8).

use std::collections::BTreeMap;
use std::rc::Rc;

use complexity_core::core::classify::classify;
use complexity_core::core::expr::{BinOp, ComplexityExpression};
use complexity_core::core::simplify::simplify;
use complexity_core::core::variable::Variable;

fn n() -> Variable {
    Variable::n()
}

fn poly(degree: u32) -> ComplexityExpression {
    let mut coeffs = BTreeMap::new();
    coeffs.insert(degree, 1.0);
    ComplexityExpression::Polynomial { var: n(), coeffs }
}

fn add(a: &ComplexityExpression, b: &ComplexityExpression) -> ComplexityExpression {
    ComplexityExpression::Binary {
        op: BinOp::Add,
        left: Rc::new(a.clone()),
        right: Rc::new(b.clone()),
    }
}

fn mul(a: &ComplexityExpression, b: &ComplexityExpression) -> ComplexityExpression {
    ComplexityExpression::Binary {
        op: BinOp::Mul,
        left: Rc::new(a.clone()),
        right: Rc::new(b.clone()),
    }
}

#[test]
fn addition_is_commutative_after_simplification() {
    let e1 = poly(2);
    let e2 = ComplexityExpression::Logarithmic {
        coefficient: 1.0,
        var: n(),
        base: 2.0,
    };
    let forward = simplify(&add(&e1, &e2));
    let backward = simplify(&add(&e2, &e1));
    assert_eq!(forward.big_o(), backward.big_o());
}

#[test]
fn multiplication_is_commutative_after_simplification() {
    let e1 = poly(2);
    let e2 = ComplexityExpression::Linear { coefficient: 1.0, var: n() };
    let forward = simplify(&mul(&e1, &e2));
    let backward = simplify(&mul(&e2, &e1));
    assert_eq!(forward.big_o(), backward.big_o());
}

#[test]
fn adding_a_constant_to_an_unbounded_term_drops_the_constant() {
    let unbounded = poly(2);
    let with_constant = add(&unbounded, &ComplexityExpression::Constant(5.0));
    assert_eq!(simplify(&with_constant).big_o(), simplify(&unbounded).big_o());
}

#[test]
fn multiplying_by_one_is_the_identity() {
    let e = poly(3);
    let scaled = mul(&ComplexityExpression::Constant(1.0), &e);
    assert_eq!(simplify(&scaled).big_o(), simplify(&e).big_o());
}

#[test]
fn lower_order_terms_are_dropped_from_a_sum() {
    let quadratic = poly(2);
    let linear = ComplexityExpression::Linear { coefficient: 1.0, var: n() };
    let log = ComplexityExpression::Logarithmic {
        coefficient: 1.0,
        var: n(),
        base: 2.0,
    };
    let sum = add(&add(&quadratic, &linear), &log);
    let simplified = simplify(&sum);
    assert_eq!(simplified.big_o(), "O(n^2)");
}

#[test]
fn simplify_is_idempotent() {
    let quadratic = poly(2);
    let linear = ComplexityExpression::Linear { coefficient: 1.0, var: n() };
    let sum = add(&quadratic, &linear);
    let once = simplify(&sum);
    let twice = simplify(&once);
    assert_eq!(once.big_o(), twice.big_o());
}

#[test]
fn big_o_round_trip_preserves_classification() {
    let quadratic = poly(2);
    let linear = ComplexityExpression::Linear { coefficient: 1.0, var: n() };
    let simplified = simplify(&add(&quadratic, &linear));
    let reclassified = classify(&simplified, Some(n()));
    let original_classified = classify(&quadratic, Some(n()));
    assert_eq!(reclassified.form, original_classified.form);
    assert!((reclassified.primary_parameter - original_classified.primary_parameter).abs() < 1e-9);
}
