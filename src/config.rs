//! Numerical tolerances and other configuration constants.
//!
//! spec.md §9 calls these out explicitly as "configuration constants with
//! sensible defaults" rather than hard-coded magic numbers or mutable
//! global singletons (the redesign note for the source's static
//! simplifier/classifier/comparator/verifier instances). `EngineConfig` is
//! threaded through the theorem analyzer and refinement engine by value,
//! the way `Brent::set_tolerance` / `Newton::set_gamma` configure a
//! solver instance rather than reaching for global state.

/// Threaded configuration for the theorem analyzer and refinement engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum gap between `d` and `log_b(a)` below which Master case 1/3
    /// is considered to apply outright (guards numerical boundary noise).
    pub epsilon_min: f64,
    /// Window around `d == log_b(a)` treated as Master case 2.
    pub epsilon_tol: f64,
    /// Newton-Raphson convergence tolerance for the critical-exponent
    /// solver (`|F(p)| < tol` and `|delta p| < tol`).
    pub newton_tol: f64,
    /// Maximum Newton-Raphson iterations before falling back to Brent.
    pub newton_max_iter: usize,
    /// Maximum Brent bracket-search iterations.
    pub brent_max_iter: usize,
    /// Lower bound of the acceptable induction-ratio band for tight
    /// verification (upper-bound verification only checks `>= 1`).
    pub induction_ratio_lo: f64,
    /// Upper bound of the acceptable induction-ratio band.
    pub induction_ratio_hi: f64,
    /// R² threshold above which curve-fitting calls a class a match.
    pub r_squared_threshold: f64,
    /// Confidence below which a result is flagged as requiring review.
    pub review_threshold: f64,
    /// Base-2 exponents used for the Master case 3 regularity sampling
    /// grid and for the induction verifier's base-case checks.
    pub regularity_sample_exponents: Vec<u32>,
    /// Largest sample exponent used for the induction verifier's
    /// log-spaced inductive-step grid.
    pub induction_max_exponent: u32,
    /// Maximum tolerated slope of `ratio` against `ln(n)` across the
    /// induction grid before the asymptotic-trend check penalizes
    /// confidence -- catches a ratio that drifts monotonically while
    /// staying inside the induction band at every sampled point.
    pub induction_trend_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            epsilon_min: 1e-6,
            epsilon_tol: 0.05,
            newton_tol: 1e-10,
            newton_max_iter: 100,
            brent_max_iter: 200,
            induction_ratio_lo: 0.5,
            induction_ratio_hi: 2.0,
            r_squared_threshold: 0.9,
            review_threshold: 0.5,
            regularity_sample_exponents: vec![8, 12, 16],
            induction_max_exponent: 20,
            induction_trend_tolerance: 0.05,
        }
    }
}

impl EngineConfig {
    /// Builder-style setter, matching the teacher's
    /// `set_tolerance(self, ...) -> Self` convention.
    pub fn with_epsilon_min(mut self, epsilon_min: f64) -> Self {
        self.epsilon_min = epsilon_min;
        self
    }

    /// Builder-style setter for the Master-case-2 boundary window.
    pub fn with_epsilon_tol(mut self, epsilon_tol: f64) -> Self {
        self.epsilon_tol = epsilon_tol;
        self
    }

    /// Builder-style setter for the Newton-Raphson tolerance/iteration cap.
    pub fn with_newton(mut self, tol: f64, max_iter: usize) -> Self {
        self.newton_tol = tol;
        self.newton_max_iter = max_iter;
        self
    }

    /// Builder-style setter for the induction ratio band.
    pub fn with_induction_band(mut self, lo: f64, hi: f64) -> Self {
        self.induction_ratio_lo = lo;
        self.induction_ratio_hi = hi;
        self
    }

    /// Builder-style setter for the asymptotic-trend slope tolerance.
    pub fn with_induction_trend_tolerance(mut self, tolerance: f64) -> Self {
        self.induction_trend_tolerance = tolerance;
        self
    }

    /// Regularity sampling grid as concrete `n` values, shrunk so that
    /// tiny domains still yield 3 distinct positive sample points
    /// (open question resolved in SPEC_FULL.md).
    pub fn regularity_samples(&self) -> Vec<f64> {
        self.regularity_sample_exponents
            .iter()
            .map(|&k| 2f64.powi(k as i32))
            .collect()
    }
}
