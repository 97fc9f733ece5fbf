//! The complexity expression algebra.
//!
//! `ComplexityExpression` is a sum type over every construct the rest of
//! the crate needs to reason about: the elementary growth-rate terms
//! (constant, polynomial, logarithmic, poly-log, exponential, factorial),
//! binary composition, branching, and the handful of "structured" leaves
//! (amortized, parallel, probabilistic, memory, inverse-Ackermann,
//! special-function) that carry more than a single growth curve. The
//! source re-architects the original deep-inheritance + virtual-dispatch
//! hierarchy as a single tagged enum with exhaustive matches, per
//! spec.md §9 -- new variants are added by extending the tag and the
//! [`ComplexityVisitor`] trait, not by growing a class hierarchy.
//!
//! All variants are value types; trees may share subexpressions via `Rc`
//! where convenient but sharing is never required.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::variable::{FreeVariables, Variable};

/// Binary composition operator for [`ComplexityExpression::Binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinOp {
    /// Sequential composition: `left + right`.
    Add,
    /// Nested composition: `left * right`.
    Mul,
    /// Worst-case branch: `max(left, right)`.
    Max,
    /// Best-case branch: `min(left, right)`.
    Min,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Max => write!(f, "max"),
            BinOp::Min => write!(f, "min"),
        }
    }
}

/// A special function that does not reduce to the elementary growth
/// classes: polylogarithm, incomplete gamma/beta, hypergeometric, or an
/// as-yet-unevaluated symbolic integral (the integral evaluator's
/// reduced-confidence fallback, spec.md §4.5).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SpecialFunction {
    /// `Li_s(z)`.
    Polylogarithm { order: f64, argument: Box<ComplexityExpression> },
    /// Lower incomplete gamma `gamma(s, x)`.
    IncompleteGamma { s: Box<ComplexityExpression>, x: Box<ComplexityExpression> },
    /// Incomplete beta `B(x; a, b)`.
    IncompleteBeta {
        x: Box<ComplexityExpression>,
        a: Box<ComplexityExpression>,
        b: Box<ComplexityExpression>,
    },
    /// Generalized hypergeometric function, parameters elided to a label.
    Hypergeometric { label: String, argument: Box<ComplexityExpression> },
    /// An integral that could not be reduced to closed form. Carries a
    /// best-effort asymptotic bound estimate and is always attached with
    /// reduced confidence by its producer.
    SymbolicIntegral {
        integrand_description: String,
        variable: Variable,
        asymptotic_estimate: Box<ComplexityExpression>,
    },
}

/// A method describing how an amortized bound was derived (aggregate,
/// accounting/banker's, potential-function, ...). Free text because the
/// front-end and library tables are the authority on what methods exist.
pub type AmortizedMethod = String;

/// The complexity expression algebra.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ComplexityExpression {
    /// A bare constant, `O(1)` when nonzero.
    Constant(f64),
    /// A single variable, `n`.
    Var(Variable),
    /// `coefficient * var`.
    Linear { coefficient: f64, var: Variable },
    /// `sum_d coeffs[d] * var^d`, degree -> coefficient.
    Polynomial { var: Variable, coeffs: BTreeMap<u32, f64> },
    /// `coefficient * log_base(var)`.
    Logarithmic { coefficient: f64, var: Variable, base: f64 },
    /// `coefficient * var^poly_exp * log_2(var)^log_exp`.
    PolyLog {
        coefficient: f64,
        var: Variable,
        poly_exp: f64,
        log_exp: f64,
    },
    /// `coefficient * base^var`.
    Exponential { coefficient: f64, base: f64, var: Variable },
    /// `var!`.
    Factorial { var: Variable },
    /// Binary composition of two subexpressions.
    Binary {
        op: BinOp,
        left: Rc<ComplexityExpression>,
        right: Rc<ComplexityExpression>,
    },
    /// A worst-case branch between two paths, kept distinct from `Binary`
    /// with `Max` so the classifier can attach per-branch confidence
    /// even when the composition rule collapses it to a `Max` later.
    Conditional {
        description: String,
        then_branch: Rc<ComplexityExpression>,
        else_branch: Rc<ComplexityExpression>,
    },
    /// `base^exponent` for non-constant exponents.
    PowerOf {
        base: Rc<ComplexityExpression>,
        exponent: Rc<ComplexityExpression>,
    },
    /// `log_base(argument)`.
    LogOf { argument: Rc<ComplexityExpression>, base: f64 },
    /// `base^exponent`, written the other way round from `PowerOf` for
    /// the common "growth of the exponent is itself nontrivial" case.
    ExpOf { exponent: Rc<ComplexityExpression>, base: f64 },
    /// `argument!`.
    FactorialOf { argument: Rc<ComplexityExpression> },
    /// A non-elementary special function.
    Special(SpecialFunction),
    /// An amortized bound paired with its worst-case single-operation
    /// bound and the method used to derive the amortization.
    Amortized {
        amortized: Rc<ComplexityExpression>,
        worst_case: Rc<ComplexityExpression>,
        method: AmortizedMethod,
    },
    /// Parallel complexity: total work, critical-path span, and processor
    /// count.
    Parallel {
        work: Rc<ComplexityExpression>,
        span: Rc<ComplexityExpression>,
        processors: Rc<ComplexityExpression>,
    },
    /// A probabilistic bound with expected/worst/best cases.
    Probabilistic {
        expected: Rc<ComplexityExpression>,
        worst: Rc<ComplexityExpression>,
        best: Rc<ComplexityExpression>,
        distribution: String,
        assumptions: Vec<String>,
    },
    /// Memory complexity broken down by region.
    Memory {
        total: Rc<ComplexityExpression>,
        stack: Rc<ComplexityExpression>,
        heap: Rc<ComplexityExpression>,
        auxiliary: Rc<ComplexityExpression>,
        allocations: Rc<ComplexityExpression>,
    },
    /// `alpha(var)`, the inverse-Ackermann function.
    InverseAckermann { var: Variable },
}

/// Visitor over [`ComplexityExpression`]. Every method has a default that
/// forwards to [`visit_fallback`](ComplexityVisitor::visit_fallback), so a
/// concrete visitor only needs to override the variants it cares about --
/// a new expression variant added later routes to the fallback hook for
/// every existing visitor until that visitor is updated.
pub trait ComplexityVisitor<T> {
    fn visit_constant(&mut self, _c: f64) -> T {
        self.visit_fallback()
    }
    fn visit_var(&mut self, _v: &Variable) -> T {
        self.visit_fallback()
    }
    fn visit_linear(&mut self, _coefficient: f64, _var: &Variable) -> T {
        self.visit_fallback()
    }
    fn visit_polynomial(&mut self, _var: &Variable, _coeffs: &BTreeMap<u32, f64>) -> T {
        self.visit_fallback()
    }
    fn visit_logarithmic(&mut self, _coefficient: f64, _var: &Variable, _base: f64) -> T {
        self.visit_fallback()
    }
    fn visit_polylog(&mut self, _coefficient: f64, _var: &Variable, _poly_exp: f64, _log_exp: f64) -> T {
        self.visit_fallback()
    }
    fn visit_exponential(&mut self, _coefficient: f64, _base: f64, _var: &Variable) -> T {
        self.visit_fallback()
    }
    fn visit_factorial(&mut self, _var: &Variable) -> T {
        self.visit_fallback()
    }
    fn visit_binary(&mut self, _op: BinOp, _left: &ComplexityExpression, _right: &ComplexityExpression) -> T {
        self.visit_fallback()
    }
    fn visit_conditional(
        &mut self,
        _description: &str,
        _then_branch: &ComplexityExpression,
        _else_branch: &ComplexityExpression,
    ) -> T {
        self.visit_fallback()
    }
    fn visit_power_of(&mut self, _base: &ComplexityExpression, _exponent: &ComplexityExpression) -> T {
        self.visit_fallback()
    }
    fn visit_log_of(&mut self, _argument: &ComplexityExpression, _base: f64) -> T {
        self.visit_fallback()
    }
    fn visit_exp_of(&mut self, _exponent: &ComplexityExpression, _base: f64) -> T {
        self.visit_fallback()
    }
    fn visit_factorial_of(&mut self, _argument: &ComplexityExpression) -> T {
        self.visit_fallback()
    }
    fn visit_special(&mut self, _special: &SpecialFunction) -> T {
        self.visit_fallback()
    }
    fn visit_amortized(
        &mut self,
        _amortized: &ComplexityExpression,
        _worst_case: &ComplexityExpression,
        _method: &str,
    ) -> T {
        self.visit_fallback()
    }
    fn visit_parallel(
        &mut self,
        _work: &ComplexityExpression,
        _span: &ComplexityExpression,
        _processors: &ComplexityExpression,
    ) -> T {
        self.visit_fallback()
    }
    fn visit_probabilistic(
        &mut self,
        _expected: &ComplexityExpression,
        _worst: &ComplexityExpression,
        _best: &ComplexityExpression,
        _distribution: &str,
        _assumptions: &[String],
    ) -> T {
        self.visit_fallback()
    }
    fn visit_memory(
        &mut self,
        _total: &ComplexityExpression,
        _stack: &ComplexityExpression,
        _heap: &ComplexityExpression,
        _auxiliary: &ComplexityExpression,
        _allocations: &ComplexityExpression,
    ) -> T {
        self.visit_fallback()
    }
    fn visit_inverse_ackermann(&mut self, _var: &Variable) -> T {
        self.visit_fallback()
    }

    /// Hook every default method above forwards to. Required: there is no
    /// sensible generic default for "I don't know this variant."
    fn visit_fallback(&mut self) -> T;
}

impl ComplexityExpression {
    /// Dispatch to the appropriate `visit_*` method of `visitor`.
    pub fn accept<T, V: ComplexityVisitor<T>>(&self, visitor: &mut V) -> T {
        match self {
            ComplexityExpression::Constant(c) => visitor.visit_constant(*c),
            ComplexityExpression::Var(v) => visitor.visit_var(v),
            ComplexityExpression::Linear { coefficient, var } => visitor.visit_linear(*coefficient, var),
            ComplexityExpression::Polynomial { var, coeffs } => visitor.visit_polynomial(var, coeffs),
            ComplexityExpression::Logarithmic { coefficient, var, base } => {
                visitor.visit_logarithmic(*coefficient, var, *base)
            }
            ComplexityExpression::PolyLog {
                coefficient,
                var,
                poly_exp,
                log_exp,
            } => visitor.visit_polylog(*coefficient, var, *poly_exp, *log_exp),
            ComplexityExpression::Exponential { coefficient, base, var } => {
                visitor.visit_exponential(*coefficient, *base, var)
            }
            ComplexityExpression::Factorial { var } => visitor.visit_factorial(var),
            ComplexityExpression::Binary { op, left, right } => visitor.visit_binary(*op, left, right),
            ComplexityExpression::Conditional {
                description,
                then_branch,
                else_branch,
            } => visitor.visit_conditional(description, then_branch, else_branch),
            ComplexityExpression::PowerOf { base, exponent } => visitor.visit_power_of(base, exponent),
            ComplexityExpression::LogOf { argument, base } => visitor.visit_log_of(argument, *base),
            ComplexityExpression::ExpOf { exponent, base } => visitor.visit_exp_of(exponent, *base),
            ComplexityExpression::FactorialOf { argument } => visitor.visit_factorial_of(argument),
            ComplexityExpression::Special(special) => visitor.visit_special(special),
            ComplexityExpression::Amortized {
                amortized,
                worst_case,
                method,
            } => visitor.visit_amortized(amortized, worst_case, method),
            ComplexityExpression::Parallel { work, span, processors } => {
                visitor.visit_parallel(work, span, processors)
            }
            ComplexityExpression::Probabilistic {
                expected,
                worst,
                best,
                distribution,
                assumptions,
            } => visitor.visit_probabilistic(expected, worst, best, distribution, assumptions),
            ComplexityExpression::Memory {
                total,
                stack,
                heap,
                auxiliary,
                allocations,
            } => visitor.visit_memory(total, stack, heap, auxiliary, allocations),
            ComplexityExpression::InverseAckermann { var } => visitor.visit_inverse_ackermann(var),
        }
    }

    /// Free variables appearing anywhere in the tree.
    pub fn free_variables(&self) -> FreeVariables {
        let mut out = FreeVariables::new();
        self.collect_free_variables(&mut out);
        out
    }

    fn collect_free_variables(&self, out: &mut FreeVariables) {
        match self {
            ComplexityExpression::Constant(_) => {}
            ComplexityExpression::Var(v) => {
                out.insert(v.clone());
            }
            ComplexityExpression::Linear { var, .. }
            | ComplexityExpression::Polynomial { var, .. }
            | ComplexityExpression::Logarithmic { var, .. }
            | ComplexityExpression::PolyLog { var, .. }
            | ComplexityExpression::Exponential { var, .. }
            | ComplexityExpression::Factorial { var }
            | ComplexityExpression::InverseAckermann { var } => {
                out.insert(var.clone());
            }
            ComplexityExpression::Binary { left, right, .. } => {
                left.collect_free_variables(out);
                right.collect_free_variables(out);
            }
            ComplexityExpression::Conditional {
                then_branch, else_branch, ..
            } => {
                then_branch.collect_free_variables(out);
                else_branch.collect_free_variables(out);
            }
            ComplexityExpression::PowerOf { base, exponent } => {
                base.collect_free_variables(out);
                exponent.collect_free_variables(out);
            }
            ComplexityExpression::LogOf { argument, .. } | ComplexityExpression::FactorialOf { argument } => {
                argument.collect_free_variables(out);
            }
            ComplexityExpression::ExpOf { exponent, .. } => {
                exponent.collect_free_variables(out);
            }
            ComplexityExpression::Special(special) => match special {
                SpecialFunction::Polylogarithm { argument, .. } => argument.collect_free_variables(out),
                SpecialFunction::IncompleteGamma { s, x } => {
                    s.collect_free_variables(out);
                    x.collect_free_variables(out);
                }
                SpecialFunction::IncompleteBeta { x, a, b } => {
                    x.collect_free_variables(out);
                    a.collect_free_variables(out);
                    b.collect_free_variables(out);
                }
                SpecialFunction::Hypergeometric { argument, .. } => argument.collect_free_variables(out),
                SpecialFunction::SymbolicIntegral {
                    variable,
                    asymptotic_estimate,
                    ..
                } => {
                    out.insert(variable.clone());
                    asymptotic_estimate.collect_free_variables(out);
                }
            },
            ComplexityExpression::Amortized {
                amortized, worst_case, ..
            } => {
                amortized.collect_free_variables(out);
                worst_case.collect_free_variables(out);
            }
            ComplexityExpression::Parallel { work, span, processors } => {
                work.collect_free_variables(out);
                span.collect_free_variables(out);
                processors.collect_free_variables(out);
            }
            ComplexityExpression::Probabilistic {
                expected, worst, best, ..
            } => {
                expected.collect_free_variables(out);
                worst.collect_free_variables(out);
                best.collect_free_variables(out);
            }
            ComplexityExpression::Memory {
                total,
                stack,
                heap,
                auxiliary,
                allocations,
            } => {
                total.collect_free_variables(out);
                stack.collect_free_variables(out);
                heap.collect_free_variables(out);
                auxiliary.collect_free_variables(out);
                allocations.collect_free_variables(out);
            }
        }
    }

    /// Structural substitution of `var` by `replacement` at every leaf
    /// mentioning it. Pure; returns a new tree.
    pub fn substitute(&self, var: &Variable, replacement: &ComplexityExpression) -> ComplexityExpression {
        use ComplexityExpression::*;
        let sub1 = |e: &Rc<ComplexityExpression>| Rc::new(e.substitute(var, replacement));
        match self {
            Constant(c) => Constant(*c),
            Var(v) if v == var => replacement.clone(),
            Var(v) => Var(v.clone()),
            Linear { coefficient, var: v } if v == var => {
                mul_const(*coefficient, replacement)
            }
            Linear { coefficient, var: v } => Linear {
                coefficient: *coefficient,
                var: v.clone(),
            },
            Polynomial { var: v, coeffs } if v == var => {
                let mut terms: Vec<ComplexityExpression> = Vec::new();
                for (&degree, &coeff) in coeffs {
                    if coeff == 0.0 {
                        continue;
                    }
                    terms.push(power_const(replacement, degree, coeff));
                }
                sum_all(terms)
            }
            Polynomial { var: v, coeffs } => Polynomial {
                var: v.clone(),
                coeffs: coeffs.clone(),
            },
            Logarithmic { coefficient, var: v, base } if v == var => {
                mul_const(*coefficient, &LogOf {
                    argument: Rc::new(replacement.clone()),
                    base: *base,
                })
            }
            Logarithmic { coefficient, var: v, base } => Logarithmic {
                coefficient: *coefficient,
                var: v.clone(),
                base: *base,
            },
            PolyLog {
                coefficient,
                var: v,
                poly_exp,
                log_exp,
            } if v == var => {
                let poly = PowerOf {
                    base: Rc::new(replacement.clone()),
                    exponent: Rc::new(Constant(*poly_exp)),
                };
                let log = PowerOf {
                    base: Rc::new(LogOf {
                        argument: Rc::new(replacement.clone()),
                        base: 2.0,
                    }),
                    exponent: Rc::new(Constant(*log_exp)),
                };
                mul_const(*coefficient, &Binary {
                    op: BinOp::Mul,
                    left: Rc::new(poly),
                    right: Rc::new(log),
                })
            }
            PolyLog {
                coefficient,
                var: v,
                poly_exp,
                log_exp,
            } => PolyLog {
                coefficient: *coefficient,
                var: v.clone(),
                poly_exp: *poly_exp,
                log_exp: *log_exp,
            },
            Exponential { coefficient, base, var: v } if v == var => {
                mul_const(*coefficient, &ExpOf {
                    exponent: Rc::new(replacement.clone()),
                    base: *base,
                })
            }
            Exponential { coefficient, base, var: v } => Exponential {
                coefficient: *coefficient,
                base: *base,
                var: v.clone(),
            },
            Factorial { var: v } if v == var => FactorialOf {
                argument: Rc::new(replacement.clone()),
            },
            Factorial { var: v } => Factorial { var: v.clone() },
            Binary { op, left, right } => Binary {
                op: *op,
                left: sub1(left),
                right: sub1(right),
            },
            Conditional {
                description,
                then_branch,
                else_branch,
            } => Conditional {
                description: description.clone(),
                then_branch: sub1(then_branch),
                else_branch: sub1(else_branch),
            },
            PowerOf { base, exponent } => PowerOf {
                base: sub1(base),
                exponent: sub1(exponent),
            },
            LogOf { argument, base } => LogOf {
                argument: sub1(argument),
                base: *base,
            },
            ExpOf { exponent, base } => ExpOf {
                exponent: sub1(exponent),
                base: *base,
            },
            FactorialOf { argument } => FactorialOf { argument: sub1(argument) },
            Special(special) => Special(substitute_special(special, var, replacement)),
            Amortized {
                amortized,
                worst_case,
                method,
            } => Amortized {
                amortized: sub1(amortized),
                worst_case: sub1(worst_case),
                method: method.clone(),
            },
            Parallel { work, span, processors } => Parallel {
                work: sub1(work),
                span: sub1(span),
                processors: sub1(processors),
            },
            Probabilistic {
                expected,
                worst,
                best,
                distribution,
                assumptions,
            } => Probabilistic {
                expected: sub1(expected),
                worst: sub1(worst),
                best: sub1(best),
                distribution: distribution.clone(),
                assumptions: assumptions.clone(),
            },
            Memory {
                total,
                stack,
                heap,
                auxiliary,
                allocations,
            } => Memory {
                total: sub1(total),
                stack: sub1(stack),
                heap: sub1(heap),
                auxiliary: sub1(auxiliary),
                allocations: sub1(allocations),
            },
            InverseAckermann { var: v } if v == var => InverseAckermann { var: v.clone() },
            InverseAckermann { var: v } => InverseAckermann { var: v.clone() },
        }
    }

    /// Numerical evaluation given bindings for every free variable.
    /// Returns `None` for unbound variables, non-positive logarithms, or
    /// detected overflow (callers may treat overflow as saturation to
    /// `f64::MAX` instead of propagating `None`, see
    /// [`evaluate_saturating`](Self::evaluate_saturating)).
    pub fn evaluate(&self, assignments: &std::collections::HashMap<Variable, f64>) -> Option<f64> {
        evaluate_inner(self, assignments).filter(|v| v.is_finite())
    }

    /// Like [`evaluate`](Self::evaluate), but overflow saturates to
    /// `f64::MAX` instead of producing `None`. Unbound variables and
    /// undefined operations (e.g. `log` of a non-positive number) still
    /// produce `None`.
    pub fn evaluate_saturating(&self, assignments: &std::collections::HashMap<Variable, f64>) -> Option<f64> {
        evaluate_inner(self, assignments).map(|v| if v.is_infinite() { f64::MAX.copysign(v) } else { v })
    }

    /// Render the Big-O classification of this expression as a string.
    /// Always succeeds (spec.md §4.1 "Big-O rendering always succeeds").
    pub fn big_o(&self) -> String {
        let classification = crate::core::classify::classify(self, self.dominant_variable());
        classification.big_o_string()
    }

    /// Best-effort choice of "the" variable this expression is dominated
    /// by, used when a caller asks for `big_o()` without specifying one.
    /// Picks the lexicographically smallest free variable as a
    /// deterministic default; when there is exactly one free variable
    /// this is simply it.
    pub fn dominant_variable(&self) -> Option<Variable> {
        self.free_variables().into_iter().next()
    }

    /// `true` for `Constant(0.0)`, used by [`LinearRecurrence::is_homogeneous`](crate::core::recurrence::LinearRecurrence::is_homogeneous).
    pub fn is_zero(&self) -> bool {
        matches!(self, ComplexityExpression::Constant(c) if *c == 0.0)
    }
}

fn substitute_special(special: &SpecialFunction, var: &Variable, replacement: &ComplexityExpression) -> SpecialFunction {
    match special {
        SpecialFunction::Polylogarithm { order, argument } => SpecialFunction::Polylogarithm {
            order: *order,
            argument: Box::new(argument.substitute(var, replacement)),
        },
        SpecialFunction::IncompleteGamma { s, x } => SpecialFunction::IncompleteGamma {
            s: Box::new(s.substitute(var, replacement)),
            x: Box::new(x.substitute(var, replacement)),
        },
        SpecialFunction::IncompleteBeta { x, a, b } => SpecialFunction::IncompleteBeta {
            x: Box::new(x.substitute(var, replacement)),
            a: Box::new(a.substitute(var, replacement)),
            b: Box::new(b.substitute(var, replacement)),
        },
        SpecialFunction::Hypergeometric { label, argument } => SpecialFunction::Hypergeometric {
            label: label.clone(),
            argument: Box::new(argument.substitute(var, replacement)),
        },
        SpecialFunction::SymbolicIntegral {
            integrand_description,
            variable,
            asymptotic_estimate,
        } => SpecialFunction::SymbolicIntegral {
            integrand_description: integrand_description.clone(),
            variable: variable.clone(),
            asymptotic_estimate: Box::new(asymptotic_estimate.substitute(var, replacement)),
        },
    }
}

fn mul_const(coefficient: f64, expr: &ComplexityExpression) -> ComplexityExpression {
    if coefficient == 1.0 {
        expr.clone()
    } else {
        ComplexityExpression::Binary {
            op: BinOp::Mul,
            left: Rc::new(ComplexityExpression::Constant(coefficient)),
            right: Rc::new(expr.clone()),
        }
    }
}

fn power_const(base: &ComplexityExpression, degree: u32, coeff: f64) -> ComplexityExpression {
    let powered = if degree == 0 {
        ComplexityExpression::Constant(1.0)
    } else if degree == 1 {
        base.clone()
    } else {
        ComplexityExpression::PowerOf {
            base: Rc::new(base.clone()),
            exponent: Rc::new(ComplexityExpression::Constant(degree as f64)),
        }
    };
    mul_const(coeff, &powered)
}

fn sum_all(terms: Vec<ComplexityExpression>) -> ComplexityExpression {
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

fn lookup(assignments: &std::collections::HashMap<Variable, f64>, var: &Variable) -> Option<f64> {
    assignments.get(var).copied()
}

fn evaluate_inner(expr: &ComplexityExpression, assignments: &std::collections::HashMap<Variable, f64>) -> Option<f64> {
    use ComplexityExpression::*;
    match expr {
        Constant(c) => Some(*c),
        Var(v) => lookup(assignments, v),
        Linear { coefficient, var } => lookup(assignments, var).map(|x| coefficient * x),
        Polynomial { var, coeffs } => {
            let x = lookup(assignments, var)?;
            Some(coeffs.iter().map(|(&d, &c)| c * x.powi(d as i32)).sum())
        }
        Logarithmic { coefficient, var, base } => {
            let x = lookup(assignments, var)?;
            if x <= 0.0 {
                return None;
            }
            Some(coefficient * x.log(*base))
        }
        PolyLog {
            coefficient,
            var,
            poly_exp,
            log_exp,
        } => {
            let x = lookup(assignments, var)?;
            if x <= 0.0 {
                return None;
            }
            Some(coefficient * x.powf(*poly_exp) * x.ln().powf(*log_exp))
        }
        Exponential { coefficient, base, var } => {
            let x = lookup(assignments, var)?;
            Some(coefficient * base.powf(x))
        }
        Factorial { var } => {
            let x = lookup(assignments, var)?;
            Some(stirling_gamma(x + 1.0))
        }
        Binary { op, left, right } => {
            let l = evaluate_inner(left, assignments)?;
            let r = evaluate_inner(right, assignments)?;
            Some(match op {
                BinOp::Add => l + r,
                BinOp::Mul => l * r,
                BinOp::Max => l.max(r),
                BinOp::Min => l.min(r),
            })
        }
        Conditional {
            then_branch, else_branch, ..
        } => {
            let t = evaluate_inner(then_branch, assignments)?;
            let e = evaluate_inner(else_branch, assignments)?;
            Some(t.max(e))
        }
        PowerOf { base, exponent } => {
            let b = evaluate_inner(base, assignments)?;
            let e = evaluate_inner(exponent, assignments)?;
            Some(b.powf(e))
        }
        LogOf { argument, base } => {
            let x = evaluate_inner(argument, assignments)?;
            if x <= 0.0 {
                return None;
            }
            Some(x.log(*base))
        }
        ExpOf { exponent, base } => {
            let e = evaluate_inner(exponent, assignments)?;
            Some(base.powf(e))
        }
        FactorialOf { argument } => {
            let x = evaluate_inner(argument, assignments)?;
            Some(stirling_gamma(x + 1.0))
        }
        Special(special) => evaluate_special(special, assignments),
        Amortized { amortized, .. } => evaluate_inner(amortized, assignments),
        Parallel { work, .. } => evaluate_inner(work, assignments),
        Probabilistic { expected, .. } => evaluate_inner(expected, assignments),
        Memory { total, .. } => evaluate_inner(total, assignments),
        InverseAckermann { var } => {
            let x = lookup(assignments, var)?;
            Some(inverse_ackermann(x))
        }
    }
    .filter(|v: &f64| !v.is_nan())
}

fn evaluate_special(special: &SpecialFunction, assignments: &std::collections::HashMap<Variable, f64>) -> Option<f64> {
    match special {
        SpecialFunction::Polylogarithm { order, argument } => {
            let z = evaluate_inner(argument, assignments)?;
            if z.abs() >= 1.0 || z == 0.0 {
                return None;
            }
            // Direct series summation; adequate for the |z| < 1 regime we
            // accept above, not intended for high-precision use.
            let mut sum = 0.0;
            let mut term_pow = z;
            for k in 1..200 {
                let term = term_pow / (k as f64).powf(*order);
                sum += term;
                if term.abs() < 1e-15 {
                    break;
                }
                term_pow *= z;
            }
            Some(sum)
        }
        SpecialFunction::IncompleteGamma { s, x } => {
            let s = evaluate_inner(s, assignments)?;
            let x = evaluate_inner(x, assignments)?;
            if x < 0.0 || s <= 0.0 {
                return None;
            }
            Some(lower_incomplete_gamma(s, x))
        }
        SpecialFunction::IncompleteBeta { .. } | SpecialFunction::Hypergeometric { .. } => None,
        SpecialFunction::SymbolicIntegral { asymptotic_estimate, .. } => {
            evaluate_inner(asymptotic_estimate, assignments)
        }
    }
}

/// Stirling's approximation of `Gamma(x)`, used for `Factorial` leaves so
/// evaluation stays defined beyond small integers.
fn stirling_gamma(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::NAN;
    }
    if x < 20.0 {
        // Direct product for small, near-integer arguments, matching the
        // `n!` semantics the algebra is meant for.
        let mut acc = 1.0;
        let mut k = 1.0;
        while k < x {
            acc *= k;
            k += 1.0;
        }
        acc
    } else {
        (2.0 * std::f64::consts::PI * x).sqrt() * (x / std::f64::consts::E).powf(x)
    }
}

/// Single-digamma-free series approximation of the lower incomplete gamma
/// function, adequate for the asymptotic estimates this crate needs it
/// for (not a general-purpose special-function library).
fn lower_incomplete_gamma(s: f64, x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    let mut term = 1.0 / s;
    let mut sum = term;
    let mut n = 1.0;
    while n < 200.0 {
        term *= x / (s + n);
        sum += term;
        if term.abs() < 1e-15 * sum.abs().max(1e-300) {
            break;
        }
        n += 1.0;
    }
    sum * x.powf(s) * (-x).exp()
}

/// The inverse-Ackermann function, approximated by the standard
/// tower-of-twos threshold construction rather than computed exactly
/// (its exact value is irrelevant beyond "a very slowly growing small
/// integer" for any `n` that occurs in practice).
pub fn inverse_ackermann(n: f64) -> f64 {
    if n <= 1.0 {
        return 0.0;
    }
    let mut k = 1.0;
    let mut tower = 2.0f64;
    while tower < n && k < 6.0 {
        tower = 2f64.powf(tower);
        k += 1.0;
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn evaluate_returns_none_on_exponential_overflow() {
        let expr = ComplexityExpression::Exponential {
            coefficient: 1.0,
            base: 2.0,
            var: Variable::n(),
        };
        let mut assignments = HashMap::new();
        assignments.insert(Variable::n(), 100_000.0);
        assert_eq!(expr.evaluate(&assignments), None);
    }

    #[test]
    fn evaluate_saturating_caps_the_same_overflow_at_f64_max() {
        let expr = ComplexityExpression::Exponential {
            coefficient: 1.0,
            base: 2.0,
            var: Variable::n(),
        };
        let mut assignments = HashMap::new();
        assignments.insert(Variable::n(), 100_000.0);
        assert_eq!(expr.evaluate_saturating(&assignments), Some(f64::MAX));
    }
}
