//! The micro-benchmark runner (spec.md §4.8): times a caller-supplied
//! workload closure across a size grid, discards IQR outliers, and
//! reports summary statistics per size.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ComplexityError, Result};

/// Coarse-grained presets trading wall time for statistical confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BenchmarkPreset {
    Quick,
    Standard,
    Thorough,
}

/// Cooperative cancellation flag, checked between measurement samples.
/// Cloning shares the same underlying flag (mirrors `Arc<AtomicBool>`
/// cancellation tokens used across async runtimes).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Optional callback invoked once per measurement sample with the
/// approximate number of bytes allocated during that sample (a caller
/// might wire this to a custom global allocator); reported alongside
/// timing so a bound can be cross-checked against space as well as time.
pub trait AllocationProbe {
    fn bytes_allocated(&mut self) -> Option<u64>;
}

/// A no-op probe for callers with no allocation instrumentation.
pub struct NoAllocationProbe;

impl AllocationProbe for NoAllocationProbe {
    fn bytes_allocated(&mut self) -> Option<u64> {
        None
    }
}

/// Summary statistics for one problem size.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SizeSample {
    pub size: usize,
    pub mean_nanos: f64,
    pub stddev_nanos: f64,
    pub min_ns: f64,
    pub max_ns: f64,
    pub coefficient_of_variation: f64,
    pub samples_kept: usize,
    pub samples_discarded: usize,
    /// Calibrated batch size: how many back-to-back workload calls
    /// were timed together to produce one of this size's samples.
    pub iterations: u64,
    pub mean_bytes_allocated: Option<f64>,
}

/// The complete result of one benchmark run across a size grid.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkResult {
    pub sizes: Vec<SizeSample>,
    pub cancelled: bool,
}

/// Minimum wall-clock duration one timed measurement should span, in
/// nanoseconds, before the timer's own resolution dominates the
/// reading (spec.md §4.8 step 2, "ops-per-iteration calibration").
const MIN_ITER_TIME_NANOS: f64 = 1_000_000.0;

/// Hard cap on how many workload calls get batched into one timed
/// measurement, so a workload far faster than `MIN_ITER_TIME_NANOS`
/// can't balloon a single measurement's wall time without bound.
const MAX_BATCH_ITERATIONS: u64 = 100_000;

/// Time one untimed call to estimate how many back-to-back calls are
/// needed to reach `MIN_ITER_TIME_NANOS`, capped at
/// `MAX_BATCH_ITERATIONS`.
fn calibrate_batch_size<F: FnMut(usize)>(workload: &mut F, size: usize) -> u64 {
    let start = Instant::now();
    workload(size);
    let single_call_nanos = start.elapsed().as_nanos() as f64;
    if single_call_nanos <= 0.0 {
        return MAX_BATCH_ITERATIONS;
    }
    let needed = (MIN_ITER_TIME_NANOS / single_call_nanos).ceil() as u64;
    needed.clamp(1, MAX_BATCH_ITERATIONS)
}

/// Time `workload` across `grid`, running `warmup` untimed iterations,
/// calibrating a batch size per §4.8 step 2, then `measurement` timed
/// batches per size, removing samples outside
/// `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]` before summarizing (the same rule a
/// boxplot uses to flag outliers).
pub fn run_benchmark<F>(
    mut workload: F,
    grid: &[usize],
    warmup: usize,
    measurement: usize,
    cancellation: &CancellationToken,
    mut probe: impl AllocationProbe,
) -> Result<BenchmarkResult>
where
    F: FnMut(usize),
{
    let mut sizes = Vec::with_capacity(grid.len());
    for &size in grid {
        if cancellation.is_cancelled() {
            return Ok(BenchmarkResult { sizes, cancelled: true });
        }
        for _ in 0..warmup {
            workload(size);
        }

        let batch = calibrate_batch_size(&mut workload, size);

        let mut raw_nanos = Vec::with_capacity(measurement);
        let mut raw_bytes = Vec::with_capacity(measurement);
        for _ in 0..measurement {
            if cancellation.is_cancelled() {
                return Ok(BenchmarkResult { sizes, cancelled: true });
            }
            let start = Instant::now();
            for _ in 0..batch {
                workload(size);
            }
            let elapsed = start.elapsed();
            raw_nanos.push(elapsed.as_nanos() as f64 / batch as f64);
            if let Some(bytes) = probe.bytes_allocated() {
                raw_bytes.push(bytes as f64 / batch as f64);
            }
        }

        let (kept, discarded) = remove_iqr_outliers(&raw_nanos);
        if kept.is_empty() {
            return Err(ComplexityError::BenchmarkInstability {
                note: format!("every sample at size {size} was classified as an outlier"),
            });
        }
        let mean = mean(&kept);
        let stddev = stddev(&kept, mean);
        let cv = if mean.abs() > 1e-12 { stddev / mean } else { 0.0 };
        let min_ns = kept.iter().copied().fold(f64::INFINITY, f64::min);
        let max_ns = kept.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_bytes_allocated = if raw_bytes.is_empty() { None } else { Some(mean(&raw_bytes)) };

        sizes.push(SizeSample {
            size,
            mean_nanos: mean,
            stddev_nanos: stddev,
            min_ns,
            max_ns,
            coefficient_of_variation: cv,
            samples_kept: kept.len(),
            samples_discarded: discarded,
            iterations: batch,
            mean_bytes_allocated,
        });
    }
    Ok(BenchmarkResult { sizes, cancelled: false })
}

fn remove_iqr_outliers(samples: &[f64]) -> (Vec<f64>, usize) {
    if samples.len() < 4 {
        return (samples.to_vec(), 0);
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lo = q1 - 1.5 * iqr;
    let hi = q3 + 1.5 * iqr;
    let kept: Vec<f64> = samples.iter().copied().filter(|&x| x >= lo && x <= hi).collect();
    let discarded = samples.len() - kept.len();
    (kept, discarded)
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = p * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = idx - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn stddev(xs: &[f64], mean: f64) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let variance = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlier_removal_drops_single_spike() {
        let samples = vec![10.0, 11.0, 9.0, 10.0, 10.0, 500.0, 10.0, 9.0];
        let (kept, discarded) = remove_iqr_outliers(&samples);
        assert_eq!(discarded, 1);
        assert!(kept.iter().all(|&x| x < 100.0));
    }

    #[test]
    fn run_benchmark_produces_one_sample_per_size() {
        let grid = vec![8usize, 16, 32];
        let token = CancellationToken::new();
        let result = run_benchmark(|n| {
            let mut acc = 0u64;
            for i in 0..n {
                acc = acc.wrapping_add(i as u64);
            }
            std::hint::black_box(acc);
        }, &grid, 1, 5, &token, NoAllocationProbe)
        .unwrap();
        assert_eq!(result.sizes.len(), 3);
        assert!(!result.cancelled);
        for sample in &result.sizes {
            assert!(sample.iterations >= 1);
            assert!(sample.min_ns <= sample.mean_nanos);
            assert!(sample.max_ns >= sample.mean_nanos);
        }
    }

    #[test]
    fn fast_workload_is_batched_above_one_iteration() {
        let grid = vec![4usize];
        let token = CancellationToken::new();
        let result = run_benchmark(|_| {}, &grid, 1, 3, &token, NoAllocationProbe).unwrap();
        assert!(result.sizes[0].iterations > 1);
    }

    #[test]
    fn cancellation_stops_the_run_early() {
        let grid = vec![8usize, 16, 32];
        let token = CancellationToken::new();
        token.cancel();
        let result = run_benchmark(|_| {}, &grid, 1, 5, &token, NoAllocationProbe).unwrap();
        assert!(result.cancelled);
        assert!(result.sizes.is_empty());
    }
}
