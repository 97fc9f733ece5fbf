//! Hardware profiling (spec.md §4.10): a fingerprint of the machine a
//! calibration run was taken on, so a later lookup can tell a
//! calibration taken on a laptop apart from one taken on a build
//! server rather than silently reusing mismatched constants.

use chrono::Utc;

/// A machine fingerprint, captured at calibration time.
///
/// Fields beyond `machine`/`cpu_count` are informational or used only
/// to derive [`HardwareProfile::profile_id`]; equality and
/// [`HardwareProfile::compatible_with`] key off `machine` and
/// `cpu_count` (clock speed and available memory vary within a single
/// machine under thermal throttling or background load, so treating
/// them as part of an exact-match key would be too brittle).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HardwareProfile {
    /// Stable identifier derived from `machine` + `cpu_count` + the
    /// date portion of `captured_at`, sanitized for use as a filename
    /// (§6 "calibration-<sanitized-profile-id>.<ext>").
    pub profile_id: String,
    /// Architecture-and-OS descriptor, e.g. `"x86_64-linux"`.
    pub machine: String,
    /// Best-effort human-readable CPU description.
    pub cpu_desc: String,
    /// Logical core count.
    pub cpu_count: usize,
    /// Total physical memory, in bytes. `0` when undetectable.
    pub memory_bytes: u64,
    /// Operating system descriptor, e.g. `"linux"`.
    pub os_desc: String,
    /// Best-effort runtime/toolchain version string.
    pub runtime_ver: String,
    /// Whether the process is running as a 64-bit build.
    pub is_64bit: bool,
    /// A coarse single-machine throughput score from a fixed
    /// reference workload, used to sanity-check calibrations across
    /// machines of otherwise-similar shape.
    pub reference_score: f64,
    /// RFC 3339 timestamp of when this profile was captured.
    pub captured_at: String,
}

impl HardwareProfile {
    /// Build a profile from the running process' own environment. Best
    /// effort: fields the platform does not expose fall back to a
    /// documented default rather than failing.
    pub fn detect() -> Self {
        let machine = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);
        let cpu_count = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let captured_at = Utc::now().to_rfc3339();
        let profile_id = derive_profile_id(&machine, cpu_count, &captured_at);

        HardwareProfile {
            profile_id,
            cpu_desc: format!("{} ({cpu_count} logical cores)", std::env::consts::ARCH),
            machine,
            cpu_count,
            memory_bytes: detect_memory_bytes(),
            os_desc: std::env::consts::OS.to_string(),
            runtime_ver: option_env!("CARGO_PKG_RUST_VERSION").unwrap_or("unknown").to_string(),
            is_64bit: cfg!(target_pointer_width = "64"),
            reference_score: measure_reference_score(),
            captured_at,
        }
    }

    /// Whether `self` is close enough to `other` to reuse a
    /// calibration taken on it: same machine descriptor, and core
    /// counts within a factor of two (a calibration taken on a 4-core
    /// laptop is a reasonable stand-in for an 8-core desktop, but not
    /// for a 64-core server).
    pub fn compatible_with(&self, other: &HardwareProfile) -> bool {
        if self.machine != other.machine {
            return false;
        }
        let (lo, hi) = (self.cpu_count.min(other.cpu_count), self.cpu_count.max(other.cpu_count));
        hi <= lo * 2
    }
}

/// Derive the stable, filename-safe profile id: `machine` + core count
/// + the `captured_at` timestamp's date portion (`YYYY-MM-DD`), so two
/// calibrations taken on the same machine on the same day collapse to
/// one profile id, matching §6's `calibration-<sanitized-profile-id>`
/// naming.
pub fn derive_profile_id(machine: &str, cpu_count: usize, captured_at: &str) -> String {
    let date = captured_at.get(0..10).unwrap_or(captured_at);
    sanitize_profile_id(&format!("{machine}-{cpu_count}c-{date}"))
}

fn sanitize_profile_id(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[cfg(target_os = "linux")]
fn detect_memory_bytes() -> u64 {
    let Ok(contents) = std::fs::read_to_string("/proc/meminfo") else {
        return 0;
    };
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            if let Some(kb) = rest.trim().strip_suffix("kB").and_then(|s| s.trim().parse::<u64>().ok()) {
                return kb * 1024;
            }
        }
    }
    0
}

#[cfg(not(target_os = "linux"))]
fn detect_memory_bytes() -> u64 {
    0
}

/// Time a small fixed-size arithmetic workload and report it as
/// operations per second, a coarse proxy for raw single-core
/// throughput comparable across machines of similar architecture.
fn measure_reference_score() -> f64 {
    const ITERATIONS: u64 = 2_000_000;
    let start = std::time::Instant::now();
    let mut acc = 0u64;
    for i in 0..ITERATIONS {
        acc = acc.wrapping_add(i).wrapping_mul(2654435761);
    }
    std::hint::black_box(acc);
    let elapsed = start.elapsed().as_secs_f64();
    if elapsed <= 0.0 {
        return 0.0;
    }
    ITERATIONS as f64 / elapsed
}
