//! Runtime calibration (spec.md §4.8-§4.10): a micro-benchmark runner
//! that times a workload across a size grid, and a curve-fitting
//! verifier that checks a claimed asymptotic class against the timings
//! it produced. Nothing here runs user code's *source* -- callers
//! supply a closure; this module only handles the statistics around
//! calling it.

pub mod curvefit;
pub mod runner;

pub use curvefit::{estimate_time_ns, verify_complexity_claim, ComplexityVerificationResult, CurveClass};
pub use runner::{AllocationProbe, BenchmarkPreset, BenchmarkResult, CancellationToken, SizeSample};

/// How many warmup/measurement iterations a preset runs, mirroring the
/// tradeoff a profiler's "quick" vs. "thorough" mode makes between wall
/// time and statistical confidence.
impl BenchmarkPreset {
    /// Number of untimed warmup iterations before measurement begins.
    pub fn warmup_iterations(self) -> usize {
        match self {
            BenchmarkPreset::Quick => 2,
            BenchmarkPreset::Standard => 5,
            BenchmarkPreset::Thorough => 10,
        }
    }

    /// Number of timed measurement iterations per size.
    pub fn measurement_iterations(self) -> usize {
        match self {
            BenchmarkPreset::Quick => 10,
            BenchmarkPreset::Standard => 30,
            BenchmarkPreset::Thorough => 100,
        }
    }

    /// Problem sizes sampled, geometric to cover several orders of
    /// magnitude without the grid itself dominating total runtime.
    pub fn size_grid(self) -> Vec<usize> {
        let max_exp = match self {
            BenchmarkPreset::Quick => 12,
            BenchmarkPreset::Standard => 16,
            BenchmarkPreset::Thorough => 20,
        };
        (4..=max_exp).step_by(2).map(|e| 1usize << e).collect()
    }
}
