//! Recurrence relation data model (spec.md §4.2/§4.3).
//!
//! A [`RecurrenceRelation`] is a description of how a recursive
//! algorithm's cost is defined, built by [`super::compose`]'s recursion
//! builder from a front-end's call-graph analysis. It is not itself
//! solved here -- solving is `crate::solver`'s job, this module only
//! owns the shape the solvers consume.

use std::collections::BTreeMap;

use super::expr::ComplexityExpression;
use super::variable::Variable;

/// One `a_i * T(n / b_i)` term of a divide-and-conquer recurrence.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DivideTerm {
    /// Number of subproblems, `a_i`. Must be positive.
    pub subproblem_count: f64,
    /// Size-reduction factor, `b_i`. Must be greater than 1.
    pub size_divisor: f64,
}

impl DivideTerm {
    pub fn new(subproblem_count: f64, size_divisor: f64) -> Self {
        DivideTerm {
            subproblem_count,
            size_divisor,
        }
    }
}

/// `T(n) = sum_i a_i * T(n / b_i) + f(n)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DivideRecurrence {
    pub variable: Variable,
    pub terms: Vec<DivideTerm>,
    pub combine_cost: ComplexityExpression,
}

impl DivideRecurrence {
    pub fn new(variable: Variable, terms: Vec<DivideTerm>, combine_cost: ComplexityExpression) -> Self {
        DivideRecurrence {
            variable,
            terms,
            combine_cost,
        }
    }

    /// Single-term special case, `T(n) = a*T(n/b) + f(n)`, the shape the
    /// Master Theorem applies to directly.
    pub fn single_term(variable: Variable, a: f64, b: f64, combine_cost: ComplexityExpression) -> Self {
        DivideRecurrence::new(variable, vec![DivideTerm::new(a, b)], combine_cost)
    }

    /// `true` when there is exactly one recursive term -- the Master
    /// Theorem's precondition; multi-term recurrences only admit
    /// Akra-Bazzi.
    pub fn is_single_term(&self) -> bool {
        self.terms.len() == 1
    }
}

/// A root of a linear recurrence's characteristic polynomial. Only the
/// magnitude is tracked: asymptotic growth of a linear recurrence
/// depends on `|root|`, not on its phase, and the companion-matrix
/// eigenvalue solver in `crate::solver::linear_recurrence` only needs to
/// report magnitudes to the refinement stage.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CharacteristicRoot {
    pub magnitude: f64,
    pub multiplicity: u32,
}

impl CharacteristicRoot {
    pub fn new(magnitude: f64, multiplicity: u32) -> Self {
        CharacteristicRoot { magnitude, multiplicity }
    }
}

/// `T(n) = sum_{i=1}^{order} coefficients[i-1] * T(n-i) + inhomogeneous(n)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LinearRecurrence {
    pub variable: Variable,
    /// `coefficients[i-1]` is the multiplier on `T(n-i)`.
    pub coefficients: Vec<f64>,
    pub inhomogeneous: ComplexityExpression,
}

impl LinearRecurrence {
    pub fn new(variable: Variable, coefficients: Vec<f64>, inhomogeneous: ComplexityExpression) -> Self {
        LinearRecurrence {
            variable,
            coefficients,
            inhomogeneous,
        }
    }

    /// Order of the recurrence, i.e. how many prior terms it references.
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// `true` when there is no driving term, `T(n) = sum c_i T(n-i)`.
    pub fn is_homogeneous(&self) -> bool {
        self.inhomogeneous.is_zero()
    }

    /// The companion matrix of the characteristic polynomial
    /// `x^k - c_1 x^(k-1) - ... - c_k`, used by
    /// `crate::solver::linear_recurrence` to find its eigenvalues for
    /// order >= 3 (order 1/2 have closed forms and skip this).
    pub fn companion_matrix(&self) -> Vec<Vec<f64>> {
        let k = self.order();
        let mut m = vec![vec![0.0; k]; k];
        for (j, &c) in self.coefficients.iter().enumerate() {
            m[0][j] = c;
        }
        for i in 1..k {
            m[i][i - 1] = 1.0;
        }
        m
    }
}

/// One function in a system of mutually recursive functions, as
/// produced by a front-end's call-graph analysis before
/// [`super::mutual::fold_mutual_recursion`] collapses the system to a
/// single [`RecurrenceRelation`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MutualComponent {
    pub name: String,
    pub variable: Variable,
    /// Calls this function makes to other components in the system,
    /// keyed by callee name, each with a subproblem count and size
    /// divisor (same shape as [`DivideTerm`], reused here since mutual
    /// recursion is divide-and-conquer across multiple functions rather
    /// than within one).
    pub calls: BTreeMap<String, DivideTerm>,
    /// Cost of this function's own body, excluding recursive calls.
    pub local_cost: ComplexityExpression,
}

impl MutualComponent {
    pub fn new(name: impl Into<String>, variable: Variable, local_cost: ComplexityExpression) -> Self {
        MutualComponent {
            name: name.into(),
            variable,
            calls: BTreeMap::new(),
            local_cost,
        }
    }

    pub fn with_call(mut self, callee: impl Into<String>, term: DivideTerm) -> Self {
        self.calls.insert(callee.into(), term);
        self
    }
}

/// A system of mutually recursive functions rooted at `entry_point`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MutualRecurrenceSystem {
    pub entry_point: String,
    pub components: BTreeMap<String, MutualComponent>,
}

impl MutualRecurrenceSystem {
    pub fn new(entry_point: impl Into<String>) -> Self {
        MutualRecurrenceSystem {
            entry_point: entry_point.into(),
            components: BTreeMap::new(),
        }
    }

    pub fn with_component(mut self, component: MutualComponent) -> Self {
        self.components.insert(component.name.clone(), component);
        self
    }
}

/// How a solved recurrence's bound should be treated when the
/// closed-form solution only approximately matches the recurrence
/// (e.g. a scale factor very close to `1`, where the dividing-and-Akra-Bazzi
/// integral approximation loses accuracy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ApproximationMode {
    /// The closed form is exact (or exact up to constant factors).
    Exact,
    /// The closed form was obtained through the numerical refinement
    /// pipeline (`crate::refine`) and should be treated as a refined
    /// estimate, not a proof.
    NumericRefinement,
    /// Kept for backward-compatible deserialization of calibration data
    /// written before the near-`1.0` scale-factor case was routed
    /// through `LinearRecurrence` instead of a dedicated special case;
    /// never constructed by current code.
    LegacyNearOne,
}

/// A recurrence relation, in whichever of the three shapes a front-end's
/// recursion analysis produced.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RecurrenceRelation {
    Divide(DivideRecurrence),
    Linear(LinearRecurrence),
    Mutual(MutualRecurrenceSystem),
}

impl RecurrenceRelation {
    pub fn variable(&self) -> Variable {
        match self {
            RecurrenceRelation::Divide(d) => d.variable.clone(),
            RecurrenceRelation::Linear(l) => l.variable.clone(),
            RecurrenceRelation::Mutual(m) => m
                .components
                .get(&m.entry_point)
                .map(|c| c.variable.clone())
                .unwrap_or_else(Variable::n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_term_divide_recurrence_is_single_term() {
        let r = DivideRecurrence::single_term(Variable::n(), 2.0, 2.0, ComplexityExpression::Linear {
            coefficient: 1.0,
            var: Variable::n(),
        });
        assert!(r.is_single_term());
    }

    #[test]
    fn companion_matrix_has_expected_shape() {
        let lin = LinearRecurrence::new(Variable::n(), vec![1.0, 1.0], ComplexityExpression::Constant(0.0));
        let m = lin.companion_matrix();
        assert_eq!(m.len(), 2);
        assert_eq!(m[0], vec![1.0, 1.0]);
        assert_eq!(m[1], vec![1.0, 0.0]);
    }

    #[test]
    fn homogeneous_detects_zero_driving_term() {
        let lin = LinearRecurrence::new(Variable::n(), vec![1.0, 1.0], ComplexityExpression::Constant(0.0));
        assert!(lin.is_homogeneous());
    }
}
