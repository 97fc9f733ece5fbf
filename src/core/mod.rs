//! The complexity algebra: expressions, classification, simplification,
//! composition, and the recurrence data model (spec.md §4.1-§4.2).

pub mod attributed;
pub mod classify;
pub mod compose;
pub mod expr;
pub mod mutual;
pub mod recurrence;
pub mod simplify;
pub mod variable;

pub use attributed::{AttributedComplexity, Source, SourceKind};
pub use classify::{classify, compare_asymptotic, Classification, ComplexityForm};
pub use expr::{BinOp, ComplexityExpression, ComplexityVisitor, SpecialFunction};
pub use mutual::fold_mutual_recursion;
pub use recurrence::{
    ApproximationMode, CharacteristicRoot, DivideRecurrence, DivideTerm, LinearRecurrence, MutualComponent,
    MutualRecurrenceSystem, RecurrenceRelation,
};
pub use simplify::simplify;
pub use variable::{FreeVariables, Variable, VariableKind};
