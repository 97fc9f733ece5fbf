//! Integration seams (spec.md §4.12): this crate owns the algebra,
//! the recurrence solvers, and the refinement/calibration pipeline,
//! but not source-language parsing. `FrontEnd` is the trait a
//! caller's own parser implements to hand this crate a
//! [`RecurrenceRelation`] or a flat bound; `LibraryMethodTable` is the
//! lookup a front-end consults for calls into code it cannot see the
//! body of (a standard library, an FFI boundary).

use std::collections::HashMap;

use crate::core::attributed::AttributedComplexity;
use crate::core::recurrence::RecurrenceRelation;
use crate::error::Result;

/// What a front-end produced for one analyzed entry point.
#[derive(Debug, Clone)]
pub enum FrontEndOutput {
    /// A recurrence ready for the solver pipeline.
    Recurrence(RecurrenceRelation),
    /// A bound already known without solving (e.g. a single straight-line
    /// function with no recursion, already folded by `crate::core::compose`).
    Flat(AttributedComplexity),
    /// The front-end recognized the entry point but could not model it
    /// (unsupported control flow, an opaque FFI call with no known cost).
    Unsupported { reason: String },
}

/// Implemented by a source-language front-end to hand analysis results
/// to this crate. Never implemented by this crate itself -- see
/// `NullFrontEnd` for the trivial placeholder used where no front-end
/// is wired in yet.
pub trait FrontEnd {
    /// Analyze `entry_point` within `source`, producing whatever this
    /// front-end could determine about its running time.
    fn analyze(&self, source: &str, entry_point: &str) -> Result<FrontEndOutput>;
}

/// A front-end that recognizes nothing. Exists so callers can wire the
/// rest of the pipeline (solver, refinement, calibration) together and
/// exercise it end to end before a real parser is plugged in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFrontEnd;

impl FrontEnd for NullFrontEnd {
    fn analyze(&self, _source: &str, entry_point: &str) -> Result<FrontEndOutput> {
        Ok(FrontEndOutput::Unsupported {
            reason: format!("no front-end wired in for entry point `{entry_point}`"),
        })
    }
}

/// A lookup table mapping a qualified method name (`"Vec::push"`,
/// `"std::collections::HashMap::get"`) to its known attributed
/// complexity, consulted by a front-end when it hits a call whose
/// body it cannot or should not re-derive.
pub trait LibraryMethodTable {
    fn lookup(&self, qualified_name: &str) -> Option<AttributedComplexity>;
}

/// An in-memory `LibraryMethodTable`, pre-seeded with a handful of
/// well-known standard-library operations and open to caller
/// extension via [`InMemoryLibraryTable::with_entry`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryLibraryTable {
    entries: HashMap<String, AttributedComplexity>,
}

impl InMemoryLibraryTable {
    /// An empty table.
    pub fn new() -> Self {
        InMemoryLibraryTable::default()
    }

    /// Builder-style insertion, mirroring `EngineConfig`'s own
    /// by-value configuration style.
    pub fn with_entry(mut self, qualified_name: impl Into<String>, complexity: AttributedComplexity) -> Self {
        self.entries.insert(qualified_name.into(), complexity);
        self
    }

    /// A table pre-seeded with a handful of well-known Rust standard
    /// library operations, useful as a starting point for a front-end
    /// rather than a complete reference.
    pub fn with_rust_standard_library_defaults() -> Self {
        use crate::core::attributed::{Source, SourceKind};
        use crate::core::expr::ComplexityExpression;
        use crate::core::variable::Variable;

        let documented = |expr: ComplexityExpression| {
            let mut source = Source::new(SourceKind::Documented, 1.0);
            source.citation = Some("std library documentation".to_string());
            AttributedComplexity::new(expr, source)
        };

        InMemoryLibraryTable::new()
            .with_entry("Vec::push", documented(ComplexityExpression::Constant(1.0)))
            .with_entry("Vec::get", documented(ComplexityExpression::Constant(1.0)))
            .with_entry(
                "Vec::sort",
                {
                    let mut c = documented(ComplexityExpression::PolyLog {
                        coefficient: 1.0,
                        var: Variable::n(),
                        poly_exp: 1.0,
                        log_exp: 1.0,
                    });
                    c.source.is_amortized = false;
                    c
                },
            )
            .with_entry(
                "HashMap::get",
                {
                    let mut c = documented(ComplexityExpression::Constant(1.0));
                    c.source.is_amortized = true;
                    c
                },
            )
            .with_entry(
                "HashMap::insert",
                {
                    let mut c = documented(ComplexityExpression::Constant(1.0));
                    c.source.is_amortized = true;
                    c
                },
            )
            .with_entry("BTreeMap::get", documented(ComplexityExpression::Logarithmic {
                coefficient: 1.0,
                var: Variable::n(),
                base: 2.0,
            }))
    }
}

impl LibraryMethodTable for InMemoryLibraryTable {
    fn lookup(&self, qualified_name: &str) -> Option<AttributedComplexity> {
        self.entries.get(qualified_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_front_end_reports_unsupported_for_everything() {
        let front_end = NullFrontEnd;
        let result = front_end.analyze("fn f() {}", "f").unwrap();
        assert!(matches!(result, FrontEndOutput::Unsupported { .. }));
    }

    #[test]
    fn standard_library_defaults_know_vec_push_is_constant() {
        let table = InMemoryLibraryTable::with_rust_standard_library_defaults();
        let entry = table.lookup("Vec::push").unwrap();
        assert_eq!(entry.expression.big_o(), "O(1)");
    }

    #[test]
    fn unknown_entries_return_none() {
        let table = InMemoryLibraryTable::new();
        assert!(table.lookup("Widget::frobnicate").is_none());
    }
}
