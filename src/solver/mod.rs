//! Recurrence solving: Master Theorem, Akra-Bazzi, and linear
//! characteristic-polynomial dispatch (spec.md §4.3).

pub mod critical_exponent;
pub mod integral;
pub mod linear_recurrence;
pub mod theorem;

pub use critical_exponent::solve_critical_exponent;
pub use integral::{evaluate_integral, IntegralResult};
pub use linear_recurrence::{bound_from_roots, solve_characteristic_roots};
pub use theorem::{applicable_theorem, solve, MasterCase, TheoremApplicability};
