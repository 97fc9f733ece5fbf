//! Curve-fitting verifier properties (spec.md §8).

use complexity_core::bench::curvefit::{best_fit, verify_complexity_claim, CurveClass};
use complexity_core::bench::runner::{BenchmarkResult, SizeSample};
use complexity_core::core::expr::ComplexityExpression;
use complexity_core::core::variable::Variable;

fn sample(size: usize, mean_nanos: f64) -> SizeSample {
    SizeSample {
        size,
        mean_nanos,
        stddev_nanos: 0.0,
        min_ns: mean_nanos,
        max_ns: mean_nanos,
        coefficient_of_variation: 0.0,
        samples_kept: 30,
        samples_discarded: 0,
        iterations: 1,
        mean_bytes_allocated: None,
    }
}

/// A small deterministic pseudo-random sequence in `[-1, 1]`, standing
/// in for up-to-5% measurement noise without pulling in a full `rand`
/// distribution for a single test.
fn noise(i: usize) -> f64 {
    let x = ((i as f64) * 12.9898).sin() * 43758.5453;
    2.0 * (x - x.floor()) - 1.0
}

#[test]
fn linear_timings_are_detected_as_linear_with_high_r_squared() {
    let sizes: Vec<SizeSample> = (1..=12)
        .map(|k| {
            let n = (k * 2000) as f64;
            let noisy = 5.0 * n * (1.0 + 0.05 * noise(k));
            sample(k * 2000, noisy)
        })
        .collect();
    let result = BenchmarkResult { sizes, cancelled: false };
    let fit = best_fit(&result);
    assert_eq!(fit.class, CurveClass::Linear);
    assert!(fit.r_squared >= 0.99);
}

#[test]
fn n_log_n_timings_beat_linear_and_quadratic_fits() {
    let sizes: Vec<SizeSample> = (1..=12)
        .map(|k| {
            let n = (k * 2000) as f64;
            sample(k * 2000, 2.0 * n * n.ln())
        })
        .collect();
    let result = BenchmarkResult { sizes, cancelled: false };
    let linearithmic = complexity_core::bench::curvefit::CurveClass::Linearithmic;
    let fit = best_fit(&result);
    assert_eq!(fit.class, linearithmic);
}

#[test]
fn confidence_does_not_decrease_as_more_samples_are_added() {
    let mut running_r_squared = 0.0;
    for sample_count in [3usize, 6, 9, 12] {
        let sizes: Vec<SizeSample> = (1..=sample_count)
            .map(|k| {
                let n = (k * 2000) as f64;
                sample(k * 2000, 5.0 * n)
            })
            .collect();
        let result = BenchmarkResult { sizes, cancelled: false };
        let fit = best_fit(&result);
        assert!(fit.r_squared >= running_r_squared - 1e-6);
        running_r_squared = fit.r_squared;
    }
}

#[test]
fn a_linear_claim_is_confirmed_by_linear_timings() {
    let sizes: Vec<SizeSample> = (1..=10).map(|k| sample(k * 1000, 3.0 * (k * 1000) as f64)).collect();
    let result = BenchmarkResult { sizes, cancelled: false };
    let claimed = ComplexityExpression::Linear {
        coefficient: 1.0,
        var: Variable::n(),
    };
    let verification = verify_complexity_claim(&claimed, &result);
    assert!(verification.claim_confirmed);
    assert!(verification.confidence > 0.9);
}

#[test]
fn a_claim_is_not_confirmed_when_the_best_fit_r_squared_is_below_point_nine() {
    let sizes: Vec<SizeSample> = (1..=10)
        .map(|k| {
            let n = (k * 1000) as f64;
            let noisy = 3.0 * n + if k % 2 == 0 { 8_000_000.0 } else { -8_000_000.0 };
            sample(k * 1000, noisy)
        })
        .collect();
    let result = BenchmarkResult { sizes, cancelled: false };
    let claimed = ComplexityExpression::Linear {
        coefficient: 1.0,
        var: Variable::n(),
    };
    let verification = verify_complexity_claim(&claimed, &result);
    assert!(verification.best_fit.r_squared < 0.9);
    assert!(!verification.claim_confirmed);
}

#[test]
fn verification_confidence_is_non_decreasing_in_sample_count() {
    let claimed = ComplexityExpression::Linear {
        coefficient: 1.0,
        var: Variable::n(),
    };
    let mut previous_confidence = 0.0;
    for sample_count in [2usize, 4, 6, 8] {
        let sizes: Vec<SizeSample> = (1..=sample_count).map(|k| sample(k * 1000, 3.0 * (k * 1000) as f64)).collect();
        let result = BenchmarkResult { sizes, cancelled: false };
        let verification = verify_complexity_claim(&claimed, &result);
        assert!(verification.confidence >= previous_confidence - 1e-9);
        previous_confidence = verification.confidence;
    }
}
