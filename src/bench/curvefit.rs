//! Curve fitting (spec.md §4.9): fit a family of canonical growth
//! curves against a benchmark's timings via linear regression on a
//! transformed axis, and report which family fits best alongside how
//! well a specific claimed bound holds up.

use crate::bench::runner::BenchmarkResult;
use crate::core::classify::{classify, ComplexityForm};
use crate::core::expr::ComplexityExpression;

/// The canonical growth families considered during curve fitting.
/// Linear regression of `time` against `transform(n)` should pass
/// close to the origin when the family is the right one.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CurveClass {
    Constant,
    Logarithmic,
    Linear,
    Linearithmic,
    Quadratic,
    Cubic,
    Exponential,
}

impl CurveClass {
    /// All families tried during an unconstrained fit, in ascending
    /// order of growth -- ties in fit quality favor the slower one,
    /// since over-fitting to noise tends to favor the faster-growing
    /// transform.
    pub fn all() -> &'static [CurveClass] {
        &[
            CurveClass::Constant,
            CurveClass::Logarithmic,
            CurveClass::Linear,
            CurveClass::Linearithmic,
            CurveClass::Quadratic,
            CurveClass::Cubic,
            CurveClass::Exponential,
        ]
    }

    /// The x-axis transform `g(n)` such that `time ~= c * g(n)` is
    /// expected to hold under this family.
    fn transform(self, n: f64) -> f64 {
        match self {
            CurveClass::Constant => 1.0,
            CurveClass::Logarithmic => n.ln().max(1e-9),
            CurveClass::Linear => n,
            CurveClass::Linearithmic => n * n.ln().max(1e-9),
            CurveClass::Quadratic => n * n,
            CurveClass::Cubic => n * n * n,
            CurveClass::Exponential => 2f64.powf(n.min(60.0)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CurveClass::Constant => "O(1)",
            CurveClass::Logarithmic => "O(log n)",
            CurveClass::Linear => "O(n)",
            CurveClass::Linearithmic => "O(n log n)",
            CurveClass::Quadratic => "O(n^2)",
            CurveClass::Cubic => "O(n^3)",
            CurveClass::Exponential => "O(2^n)",
        }
    }
}

/// The fit of one [`CurveClass`] against a benchmark: the regression
/// coefficient and the coefficient of determination.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CurveFit {
    pub class: CurveClass,
    pub coefficient: f64,
    pub r_squared: f64,
}

/// Result of checking a specific claimed bound against a benchmark,
/// alongside the best unconstrained fit for context.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ComplexityVerificationResult {
    pub claimed_fit: CurveFit,
    pub best_fit: CurveFit,
    /// `true` when the claimed family is also the best-fitting one
    /// and that fit is itself good (`best_fit.r_squared >= 0.9`) --
    /// a claim matching a family that fits nothing isn't confirmed.
    pub claim_confirmed: bool,
    /// `max(0, R^2) * (1 - mean CV) * min(1, samples / 5)`: how much
    /// to trust `claim_confirmed`, discounted for noisy timings and
    /// for having fit too few distinct sizes.
    pub confidence: f64,
    /// Number of distinct input sizes the fit was computed over.
    pub samples: usize,
    /// The claimed family's fitted constant factor, in nanoseconds.
    pub constant_factor_ns: f64,
    pub notes: String,
}

/// Linear regression through the origin: `y = c * x`, minimizing
/// squared error. Returns `(coefficient, r_squared)`.
fn regress_through_origin(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
    let sum_xx: f64 = xs.iter().map(|x| x * x).sum();
    if sum_xx.abs() < 1e-300 {
        return (0.0, 0.0);
    }
    let coefficient = sum_xy / sum_xx;

    let mean_y = ys.iter().sum::<f64>() / ys.len() as f64;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = xs.iter().zip(ys).map(|(x, y)| (y - coefficient * x).powi(2)).sum();
    let r_squared = if ss_tot.abs() < 1e-300 { 1.0 } else { (1.0 - ss_res / ss_tot).max(0.0) };
    (coefficient, r_squared)
}

fn fit_class(class: CurveClass, result: &BenchmarkResult) -> CurveFit {
    let xs: Vec<f64> = result.sizes.iter().map(|s| class.transform(s.size as f64)).collect();
    let ys: Vec<f64> = result.sizes.iter().map(|s| s.mean_nanos).collect();
    let (coefficient, r_squared) = regress_through_origin(&xs, &ys);
    CurveFit {
        class,
        coefficient,
        r_squared,
    }
}

/// Try every canonical family and return the best-fitting one.
pub fn best_fit(result: &BenchmarkResult) -> CurveFit {
    CurveClass::all()
        .iter()
        .map(|&class| fit_class(class, result))
        .max_by(|a, b| a.r_squared.partial_cmp(&b.r_squared).unwrap())
        .expect("CurveClass::all() is never empty")
}

/// Map a symbolic bound onto the nearest [`CurveClass`] for
/// verification, collapsing anything with a polynomial degree beyond
/// cubic to `Cubic` (curve fitting at that point mostly distinguishes
/// "is it polynomial at all", not the exact degree).
fn nearest_class(expr: &ComplexityExpression) -> CurveClass {
    let classification = classify(expr, None);
    match classification.form {
        ComplexityForm::Constant => CurveClass::Constant,
        ComplexityForm::Logarithmic => CurveClass::Logarithmic,
        ComplexityForm::Polynomial => {
            let degree = classification.primary_parameter;
            if degree <= 0.5 {
                CurveClass::Constant
            } else if degree <= 1.5 {
                CurveClass::Linear
            } else if degree <= 2.5 {
                CurveClass::Quadratic
            } else {
                CurveClass::Cubic
            }
        }
        ComplexityForm::PolyLog => CurveClass::Linearithmic,
        ComplexityForm::Exponential | ComplexityForm::Factorial | ComplexityForm::Unknown => CurveClass::Exponential,
    }
}

/// Check a claimed bound against a benchmark's timings: fit the
/// claim's own family, fit every family unconstrained, and confirm the
/// claim only when its family equals the best unconstrained fit *and*
/// that fit actually explains the data (`r_squared >= 0.9`) -- a
/// claim can't be confirmed by a best fit that fits nothing.
pub fn verify_complexity_claim(claimed: &ComplexityExpression, result: &BenchmarkResult) -> ComplexityVerificationResult {
    const MATCH_THRESHOLD: f64 = 0.9;

    let claimed_class = nearest_class(claimed);
    let claimed_fit = fit_class(claimed_class, result);
    let best = best_fit(result);
    let claim_confirmed = claimed_fit.class == best.class && best.r_squared >= MATCH_THRESHOLD;

    let samples = result.sizes.len();
    let mean_cv = if samples == 0 {
        1.0
    } else {
        result.sizes.iter().map(|s| s.coefficient_of_variation).sum::<f64>() / samples as f64
    };
    let confidence = best.r_squared.max(0.0) * (1.0 - mean_cv).clamp(0.0, 1.0) * (samples as f64 / 5.0).min(1.0);

    let notes = if claim_confirmed {
        format!("claimed {} matches best fit {} (r^2={:.3})", claimed_fit.class.label(), best.class.label(), best.r_squared)
    } else if claimed_fit.class == best.class {
        format!(
            "claimed {} matches the best-fitting family but r^2={:.3} is below the {:.2} confirmation threshold",
            claimed_fit.class.label(),
            best.r_squared,
            MATCH_THRESHOLD
        )
    } else {
        format!(
            "claimed {} but timings best fit {} (r^2={:.3})",
            claimed_fit.class.label(),
            best.class.label(),
            best.r_squared
        )
    };

    ComplexityVerificationResult {
        constant_factor_ns: claimed_fit.coefficient,
        claimed_fit,
        best_fit: best,
        claim_confirmed,
        confidence,
        samples,
        notes,
    }
}

/// Estimate how long `claimed` predicts at `size`, given a constant
/// factor `coefficient` measured independently (typically from a
/// stored calibration): `coefficient * g(size)` for `claimed`'s
/// nearest canonical family's scaling function `g`.
pub fn estimate_time_ns(claimed: &ComplexityExpression, coefficient: f64, size: f64) -> f64 {
    let class = nearest_class(claimed);
    coefficient * class.transform(size)
}
