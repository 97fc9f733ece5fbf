//! Attributed complexity: an expression paired with provenance.

use super::expr::ComplexityExpression;

/// Where a complexity bound came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SourceKind {
    /// Taken from documentation (e.g. a language reference).
    Documented,
    /// Asserted by a trusted author without a specific citation.
    Attested,
    /// Derived from runtime calibration (§4.8-4.10).
    Empirical,
    /// Derived by this crate's solver pipeline.
    Inferred,
    /// Derived by a front-end heuristic with no formal justification.
    Heuristic,
    /// Provenance not tracked.
    Unknown,
}

/// Provenance and confidence metadata for an [`AttributedComplexity`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Source {
    /// Where this bound came from.
    pub kind: SourceKind,
    /// Citation text (a URL, a paper reference, a commit hash), if any.
    pub citation: Option<String>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Whether the expression is an upper bound (vs. a tight bound).
    pub is_upper_bound: bool,
    /// Whether the expression is amortized.
    pub is_amortized: bool,
    /// Whether the expression describes the worst case (vs. average/best).
    pub is_worst_case: bool,
    /// Free-form notes.
    pub notes: String,
    /// When this bound was last checked against reality, if ever, as an
    /// RFC 3339 timestamp string (kept as text so the crate does not need
    /// an opinion on which datetime library a caller uses).
    pub last_verified: Option<String>,
}

impl Source {
    /// A source with the given kind and confidence, everything else
    /// defaulted to "worst-case upper bound, not amortized."
    pub fn new(kind: SourceKind, confidence: f64) -> Self {
        Source {
            kind,
            citation: None,
            confidence: confidence.clamp(0.0, 1.0),
            is_upper_bound: true,
            is_amortized: false,
            is_worst_case: true,
            notes: String::new(),
            last_verified: None,
        }
    }

    /// Review-required flag: a low-trust source kind or a confidence
    /// below the review threshold.
    pub fn review_required(&self, review_threshold: f64) -> bool {
        matches!(self.kind, SourceKind::Heuristic | SourceKind::Unknown) || self.confidence < review_threshold
    }
}

/// An expression paired with where it came from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AttributedComplexity {
    /// The bound itself.
    pub expression: ComplexityExpression,
    /// Provenance metadata.
    pub source: Source,
}

impl AttributedComplexity {
    /// Construct from an expression and a source.
    pub fn new(expression: ComplexityExpression, source: Source) -> Self {
        AttributedComplexity { expression, source }
    }
}
