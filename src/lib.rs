//! Algebraic core for deriving asymptotic running-time and space
//! bounds for procedural source code.
//!
//! A caller's own front-end turns a function body into a
//! [`core::RecurrenceRelation`] (or a flat [`core::AttributedComplexity`]
//! when there is no recursion to solve); this crate takes it from
//! there: [`solver`] picks and applies the Master Theorem, Akra-Bazzi,
//! or a linear characteristic-polynomial solve; [`refine`] checks and
//! tightens the result numerically against the recurrence it came
//! from; [`bench`] and [`calibration`] turn an actual runtime
//! measurement into a calibrated constant factor, persisted for reuse.
//!
//! TODOs
//!
//! * surface per-stage timing budgets so a caller can cap how long
//!   refinement spends chasing a borderline Master Theorem case
//! * let `EngineConfig` load from a project config file, not just
//!   `Default`/builder construction
#![warn(missing_docs)]

/// The complexity algebra: expressions, classification, simplification,
/// composition, and the recurrence data model (spec.md §4.1-§4.2).
pub mod core;

/// Recurrence solving: Master Theorem, Akra-Bazzi, and linear
/// characteristic-polynomial dispatch (spec.md §4.3).
pub mod solver;

/// The refinement engine: slack optimization, perturbation expansion,
/// and induction verification (spec.md §4.4).
pub mod refine;

/// Runtime calibration: micro-benchmarking and curve fitting
/// (spec.md §4.8-§4.9).
pub mod bench;

/// Calibration persistence: hardware profiling and the on-disk
/// calibration store (spec.md §4.10).
pub mod calibration;

/// Progress observation for long-running pipeline stages.
pub mod progress;

/// Front-end and library-method integration seams.
pub mod external;

/// Engine-wide tunables threaded through the solver and refinement
/// pipeline.
pub mod config;

/// The crate's error taxonomy.
pub mod error;

pub use crate::core::{AttributedComplexity, ComplexityExpression, Source, SourceKind};
pub use crate::config::EngineConfig;
pub use crate::error::{ComplexityError, Result};
pub use crate::refine::{verify_bound, RefinementEngine, RefinementResult};
pub use crate::solver::solve;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recurrence::{DivideRecurrence, RecurrenceRelation};
    use crate::core::variable::Variable;

    #[test]
    fn merge_sort_end_to_end_solves_and_refines() {
        let rec = RecurrenceRelation::Divide(DivideRecurrence::single_term(
            Variable::n(),
            2.0,
            2.0,
            ComplexityExpression::Linear {
                coefficient: 1.0,
                var: Variable::n(),
            },
        ));
        let config = EngineConfig::default();
        let bound = solve(&rec, &config).unwrap();
        assert_eq!(bound.expression.big_o(), "O(n log n)");

        let result = verify_bound(&rec, bound, &config).unwrap();
        assert!(result.refined.source.confidence > 0.0);
    }
}
