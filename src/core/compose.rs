//! Composition rules (spec.md §4.1): how a front-end's control-flow
//! constructs turn into [`ComplexityExpression`] trees or, for
//! recursion, a [`RecurrenceRelation`] for the solver pipeline.
//!
//!   sequential -> `+`
//!   nested     -> `*`
//!   branch     -> `max`
//!   loop       -> iterations * body
//!   recursion  -> a recurrence relation, not an expression
//!
//! These are free functions rather than methods on `ComplexityExpression`
//! itself: composition is a front-end-facing API (it is how a syntax
//! walker turns its traversal into this crate's algebra), while the
//! expression type itself stays a plain data model.

use std::rc::Rc;

use super::expr::{BinOp, ComplexityExpression};
use super::recurrence::{DivideRecurrence, DivideTerm, LinearRecurrence, RecurrenceRelation};
use super::variable::Variable;

/// Sequential composition: statements executed one after another cost
/// the sum of their costs.
pub fn sequential(steps: &[ComplexityExpression]) -> ComplexityExpression {
    fold_binary(steps, BinOp::Add, ComplexityExpression::Constant(0.0))
}

/// Nested composition: a construct executed once per iteration of an
/// enclosing one costs the product.
pub fn nested(outer: &ComplexityExpression, inner: &ComplexityExpression) -> ComplexityExpression {
    ComplexityExpression::Binary {
        op: BinOp::Mul,
        left: Rc::new(outer.clone()),
        right: Rc::new(inner.clone()),
    }
}

/// Branch composition: the worst-case cost of an `if`/`match` is the
/// most expensive arm.
pub fn branch(arms: &[ComplexityExpression]) -> ComplexityExpression {
    fold_binary(arms, BinOp::Max, ComplexityExpression::Constant(0.0))
}

/// Best-case branch composition, for callers building a best-case bound
/// alongside the worst case (spec.md §4.1's `Probabilistic`/best-case
/// leaves are built this way).
pub fn branch_best_case(arms: &[ComplexityExpression]) -> ComplexityExpression {
    match arms.split_first() {
        None => ComplexityExpression::Constant(0.0),
        Some((first, rest)) => rest.iter().fold(first.clone(), |acc, e| ComplexityExpression::Binary {
            op: BinOp::Min,
            left: Rc::new(acc),
            right: Rc::new(e.clone()),
        }),
    }
}

/// Loop composition: `iterations * body`, the same shape as `nested`
/// but named for the common case of a counted loop rather than a
/// one-off nested call, matching how a front-end's traversal would
/// name the two call sites differently even though the algebra is
/// identical.
pub fn loop_cost(iterations: &ComplexityExpression, body: &ComplexityExpression) -> ComplexityExpression {
    nested(iterations, body)
}

/// Build a single-term divide-and-conquer recurrence,
/// `T(n) = a*T(n/b) + f(n)`, from a recursion builder's call-site
/// counts.
pub fn recursion_divide(variable: Variable, subproblem_count: f64, size_divisor: f64, combine_cost: ComplexityExpression) -> RecurrenceRelation {
    RecurrenceRelation::Divide(DivideRecurrence::single_term(variable, subproblem_count, size_divisor, combine_cost))
}

/// Build a multi-term divide-and-conquer recurrence,
/// `T(n) = sum_i a_i*T(n/b_i) + f(n)`, for recursion builders that
/// found more than one distinct recursive-call shape (e.g. an algorithm
/// that recurses on both halves with different combine costs folded
/// together by the caller).
pub fn recursion_divide_multi(variable: Variable, terms: Vec<(f64, f64)>, combine_cost: ComplexityExpression) -> RecurrenceRelation {
    let terms = terms.into_iter().map(|(a, b)| DivideTerm::new(a, b)).collect();
    RecurrenceRelation::Divide(DivideRecurrence::new(variable, terms, combine_cost))
}

/// Build a linear (subtractive) recurrence,
/// `T(n) = sum_i coefficients[i-1]*T(n-i) + g(n)`, from a recursion
/// builder that found calls at fixed offsets from `n` rather than
/// scaled fractions of it.
pub fn recursion_linear(variable: Variable, coefficients: Vec<f64>, inhomogeneous: ComplexityExpression) -> RecurrenceRelation {
    RecurrenceRelation::Linear(LinearRecurrence::new(variable, coefficients, inhomogeneous))
}

fn fold_binary(items: &[ComplexityExpression], op: BinOp, identity: ComplexityExpression) -> ComplexityExpression {
    match items.split_first() {
        None => identity,
        Some((first, rest)) => rest.iter().fold(first.clone(), |acc, e| ComplexityExpression::Binary {
            op,
            left: Rc::new(acc),
            right: Rc::new(e.clone()),
        }),
    }
}
