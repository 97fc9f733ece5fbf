//! Error taxonomy shared across the complexity-analysis core.
//!
//! Most of the taxonomy never reaches a caller as an `Err`: numerical and
//! strategy failures are recovered locally (try-next-strategy,
//! reduced-confidence return) and surface instead as fields on a result
//! type. Only I/O failures in the calibration store and malformed input at
//! the API boundary propagate as errors.

use thiserror::Error;

/// Error taxonomy for the complexity-analysis core.
#[derive(Error, Debug)]
pub enum ComplexityError {
    /// Malformed recurrence (empty terms, non-positive coefficient, scale
    /// outside `(0,1)`), or an unknown variable during evaluation.
    #[error("invalid input: {reason}")]
    InputInvalid {
        /// Human-readable description of what was invalid.
        reason: String,
    },

    /// Newton divergence, Brent bracket not found, companion-matrix
    /// decomposition non-convergence, or overflow during evaluation.
    ///
    /// Callers of the public solver entry points never see this variant
    /// directly: it is caught internally and the engine falls through to
    /// the next strategy, or returns a reduced-confidence result. It is
    /// `pub` so that internal stage functions have a typed `Result` to
    /// return before that recovery happens.
    #[error("numerical failure in {stage}: {detail}")]
    NumericalFailure {
        /// Name of the stage that failed (e.g. "newton-raphson").
        stage: &'static str,
        /// Details of the failure.
        detail: String,
    },

    /// No solving strategy applies to the given recurrence. Not a failure
    /// in the usual sense -- callers receive a `NotApplicable` result with
    /// suggestions rather than this variant, but it is available for
    /// internal short-circuiting.
    #[error("no applicable theorem: {reason}")]
    TheoremInapplicable {
        /// Why no strategy applied.
        reason: String,
        /// Suggested alternative approaches.
        suggestions: Vec<String>,
    },

    /// Induction ratios drifted or violated the requested bound direction.
    #[error("verification failed: {}", .diagnostics.join("; "))]
    VerificationFailure {
        /// Specific diagnostics collected during verification.
        diagnostics: Vec<String>,
    },

    /// Coefficient of variation was too high, or timings were non-monotone.
    #[error("benchmark instability: {note}")]
    BenchmarkInstability {
        /// Description of the instability observed.
        note: String,
    },

    /// I/O error in the calibration store. Propagates to the caller;
    /// existing files are never corrupted (temp-write + atomic rename).
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] std::io::Error),

    /// The operation failed to (de)serialize calibration data.
    #[error("persistence failure (serialization): {0}")]
    SerializationFailure(#[from] serde_json::Error),

    /// Cooperative cancellation. The caller receives the best partial
    /// result with a `cancelled` flag rather than this variant in most
    /// flows; it is surfaced directly only where no partial result exists.
    #[error("operation cancelled")]
    Cancelled,
}

impl ComplexityError {
    /// Shorthand for the common "invalid input" case.
    pub fn invalid(reason: impl Into<String>) -> Self {
        ComplexityError::InputInvalid {
            reason: reason.into(),
        }
    }

    /// Shorthand for a numerical failure originating in `stage`.
    pub fn numerical(stage: &'static str, detail: impl Into<String>) -> Self {
        ComplexityError::NumericalFailure {
            stage,
            detail: detail.into(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ComplexityError>;
