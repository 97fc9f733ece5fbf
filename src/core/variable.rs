//! Named symbols over which complexity expressions are defined.

use std::fmt;

/// Semantic tag for a [`Variable`], used by front-ends to communicate what
/// a symbol actually measures and by renderers to pick a conventional
/// letter when no name was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum VariableKind {
    /// Primary input size.
    InputSize,
    /// Vertex count of a graph.
    VertexCount,
    /// Edge count of a graph.
    EdgeCount,
    /// Length of a string input.
    StringLength,
    /// Number of available processors.
    ProcessorCount,
    /// Height of a tree.
    TreeHeight,
    /// A secondary size parameter (e.g. the shorter of two dimensions).
    SecondarySize,
    /// Anything else; front-ends attach a description for clarity.
    Custom,
}

impl VariableKind {
    /// Conventional single-letter rendering used when a variable has no
    /// explicit name.
    pub fn conventional_name(&self) -> &'static str {
        match self {
            VariableKind::InputSize => "n",
            VariableKind::VertexCount => "v",
            VariableKind::EdgeCount => "e",
            VariableKind::StringLength => "n",
            VariableKind::ProcessorCount => "p",
            VariableKind::TreeHeight => "h",
            VariableKind::SecondarySize => "m",
            VariableKind::Custom => "x",
        }
    }
}

/// A named symbol with a semantic tag.
///
/// Equality and ordering are structural on `(name, kind)`; `description`
/// is documentation only and does not participate in comparisons, so two
/// variables built from the same source parameter but with different
/// free-form notes still compare equal.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Variable {
    /// Symbol name, e.g. `"n"`.
    pub name: String,
    /// Semantic tag.
    pub kind: VariableKind,
    /// Optional human-readable description.
    pub description: Option<String>,
}

impl Variable {
    /// Construct a variable with no description.
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Variable {
            name: name.into(),
            kind,
            description: None,
        }
    }

    /// Construct a variable annotated with a description.
    pub fn with_description(name: impl Into<String>, kind: VariableKind, description: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            kind,
            description: Some(description.into()),
        }
    }

    /// Shorthand for the common input-size variable named `n`.
    pub fn n() -> Self {
        Variable::new("n", VariableKind::InputSize)
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}
impl Eq for Variable {}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Variable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.name, self.kind).cmp(&(&other.name, other.kind))
    }
}
impl std::hash::Hash for Variable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.kind.hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A set of free variables, kept sorted so rendering and hashing are
/// deterministic.
pub type FreeVariables = std::collections::BTreeSet<Variable>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_description() {
        let a = Variable::new("n", VariableKind::InputSize);
        let b = Variable::with_description("n", VariableKind::InputSize, "array length");
        assert_eq!(a, b);
    }

    #[test]
    fn ordering_is_structural() {
        let a = Variable::new("m", VariableKind::InputSize);
        let b = Variable::new("n", VariableKind::InputSize);
        assert!(a < b);
    }
}
