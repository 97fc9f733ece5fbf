//! Calibration persistence (spec.md §4.10): store and retrieve the
//! per-method constant-factor calibration derived from a benchmark
//! run, keyed by hardware profile, durably on disk.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use crate::bench::curvefit::{estimate_time_ns, CurveClass};
use crate::calibration::profile::HardwareProfile;
use crate::core::expr::ComplexityExpression;
use crate::error::{ComplexityError, Result};

/// One method's calibration outcome within a run: either a measured
/// curve fit, or a recorded reason it could not be measured.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum MethodCalibration {
    Measured(CalibrationResult),
    Failed { reason: String },
}

/// One method's measured constant factor and fit quality.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CalibrationResult {
    pub curve: CurveClass,
    pub coefficient: f64,
    pub r_squared: f64,
    pub samples: usize,
}

/// One full calibration run on one hardware profile: every method
/// measured (or attempted), with the window of time it took.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CalibrationData {
    /// Schema version of this record, bumped on incompatible format
    /// changes so an old on-disk record can be recognized and skipped
    /// rather than misparsed.
    pub version: u32,
    pub hardware_profile: HardwareProfile,
    /// Method key (`"type_name::method_name"`) to its calibration
    /// outcome.
    pub method_results: BTreeMap<String, MethodCalibration>,
    /// RFC 3339 timestamp.
    pub started_at: String,
    /// RFC 3339 timestamp.
    pub completed_at: String,
}

/// The current `CalibrationData` schema version.
pub const CALIBRATION_FORMAT_VERSION: u32 = 1;

impl CalibrationData {
    /// How many methods in this run were successfully measured.
    pub fn success_count(&self) -> usize {
        self.method_results.values().filter(|m| matches!(m, MethodCalibration::Measured(_))).count()
    }

    /// `(method_key, reason)` for every method that failed to
    /// calibrate in this run.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.method_results
            .iter()
            .filter_map(|(key, outcome)| match outcome {
                MethodCalibration::Failed { reason } => Some((key.as_str(), reason.as_str())),
                MethodCalibration::Measured(_) => None,
            })
            .collect()
    }
}

/// Storage backend for calibration data, kept as a trait so an
/// in-memory fake can stand in during tests without touching disk.
pub trait CalibrationStore {
    /// Persist `data`, replacing any prior record for the same
    /// hardware profile and becoming the new "latest".
    fn save(&mut self, data: CalibrationData) -> Result<()>;
    /// The most recently saved record, regardless of profile.
    fn load_latest(&self) -> Option<CalibrationData>;
    /// The record saved for a specific profile id, if any.
    fn load_by_profile_id(&self, profile_id: &str) -> Option<CalibrationData>;
    /// Every profile id with a record on file.
    fn list_profiles(&self) -> Vec<String>;
    /// Whether the latest record's `completed_at` falls within
    /// `window` of now.
    fn is_recent(&self, window: Duration) -> bool;
    /// A human-readable summary of the latest record: hardware,
    /// duration, success count, per-method table, failures.
    fn report(&self) -> String;
}

fn render_report(data: &CalibrationData) -> String {
    let duration = match (DateTime::parse_from_rfc3339(&data.started_at), DateTime::parse_from_rfc3339(&data.completed_at)) {
        (Ok(start), Ok(end)) => format!("{}ms", (end - start).num_milliseconds()),
        _ => "unknown".to_string(),
    };
    let mut out = String::new();
    out.push_str(&format!(
        "hardware: {} ({} cores, {})\n",
        data.hardware_profile.machine, data.hardware_profile.cpu_count, data.hardware_profile.profile_id
    ));
    out.push_str(&format!("duration: {duration}\n"));
    out.push_str(&format!("methods measured: {}/{}\n", data.success_count(), data.method_results.len()));
    out.push_str("per-method results:\n");
    for (key, outcome) in &data.method_results {
        match outcome {
            MethodCalibration::Measured(result) => {
                out.push_str(&format!(
                    "  {key}: {} coefficient={:.4} r_squared={:.4} samples={}\n",
                    result.curve.label(),
                    result.coefficient,
                    result.r_squared,
                    result.samples
                ));
            }
            MethodCalibration::Failed { reason } => out.push_str(&format!("  {key}: FAILED ({reason})\n")),
        }
    }
    let failures = data.failures();
    if !failures.is_empty() {
        out.push_str("failures:\n");
        for (key, reason) in failures {
            out.push_str(&format!("  {key}: {reason}\n"));
        }
    }
    out
}

fn is_within_window(completed_at: &str, window: Duration) -> bool {
    let Ok(completed) = DateTime::parse_from_rfc3339(completed_at) else {
        return false;
    };
    let elapsed = Utc::now().signed_duration_since(completed.with_timezone(&Utc));
    elapsed.num_milliseconds().abs() <= window.num_milliseconds()
}

/// Given a previously stored run's result for `method_key`, estimate
/// how long `claimed` predicts at `size` by combining the stored
/// constant factor with the claim's own scaling function.
pub fn estimate_method_time_ns(data: &CalibrationData, method_key: &str, claimed: &ComplexityExpression, size: f64) -> Option<f64> {
    match data.method_results.get(method_key)? {
        MethodCalibration::Measured(result) => Some(estimate_time_ns(claimed, result.coefficient, size)),
        MethodCalibration::Failed { .. } => None,
    }
}

/// A `CalibrationStore` backed by one JSON file per hardware profile
/// (`calibration-<profile-id>.json`) plus a `latest.json` alias that
/// always mirrors the most recently saved record (§6 "Calibration
/// file format"). Each write goes through a temp-file-then-rename
/// sequence so a crash mid-write never corrupts an existing file.
#[derive(Debug)]
pub struct FileCalibrationStore {
    dir: PathBuf,
    entries: BTreeMap<String, CalibrationData>,
    latest_profile_id: Option<String>,
}

impl FileCalibrationStore {
    /// Open (creating if absent) the directory at `dir` and load every
    /// `calibration-*.json` record found in it.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        let mut entries = BTreeMap::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_profile_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with("calibration-") && name.ends_with(".json"));
            if !is_profile_file {
                continue;
            }
            let contents = std::fs::read_to_string(&path)?;
            let data: CalibrationData = serde_json::from_str(&contents)?;
            entries.insert(data.hardware_profile.profile_id.clone(), data);
        }
        let latest_profile_id = Self::read_latest_profile_id(&dir)?;
        Ok(FileCalibrationStore {
            dir,
            entries,
            latest_profile_id,
        })
    }

    fn read_latest_profile_id(dir: &Path) -> Result<Option<String>> {
        let latest_path = dir.join("latest.json");
        if !latest_path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&latest_path)?;
        let data: CalibrationData = serde_json::from_str(&contents)?;
        Ok(Some(data.hardware_profile.profile_id))
    }

    /// The platform-conventional location for calibration data
    /// (`$XDG_CACHE_HOME` / `~/Library/Caches` / `%LOCALAPPDATA%` as
    /// resolved by `dirs`), under a crate-specific subdirectory.
    pub fn default_dir() -> Result<PathBuf> {
        let mut dir = dirs::cache_dir().ok_or_else(|| ComplexityError::invalid("no cache directory available on this platform"))?;
        dir.push("complexity-core");
        dir.push("calibration");
        Ok(dir)
    }

    fn profile_path(&self, profile_id: &str) -> PathBuf {
        self.dir.join(format!("calibration-{profile_id}.json"))
    }

    fn latest_path(&self) -> PathBuf {
        self.dir.join("latest.json")
    }

    fn write_atomic(path: &Path, contents: &str) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut tmp_file = std::fs::File::create(&tmp_path)?;
            tmp_file.write_all(contents.as_bytes())?;
            tmp_file.sync_all()?;
        }
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn save(&mut self, data: CalibrationData) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&data)?;
        let profile_id = data.hardware_profile.profile_id.clone();
        Self::write_atomic(&self.profile_path(&profile_id), &serialized)?;
        Self::write_atomic(&self.latest_path(), &serialized)?;
        self.entries.insert(profile_id.clone(), data);
        self.latest_profile_id = Some(profile_id);
        Ok(())
    }

    fn load_latest(&self) -> Option<CalibrationData> {
        self.latest_profile_id.as_ref().and_then(|id| self.entries.get(id)).cloned()
    }

    fn load_by_profile_id(&self, profile_id: &str) -> Option<CalibrationData> {
        self.entries.get(profile_id).cloned()
    }

    fn list_profiles(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn is_recent(&self, window: Duration) -> bool {
        match self.load_latest() {
            Some(data) => is_within_window(&data.completed_at, window),
            None => false,
        }
    }

    fn report(&self) -> String {
        match self.load_latest() {
            Some(data) => render_report(&data),
            None => "no calibration data on record".to_string(),
        }
    }
}

/// An in-memory store for tests and short-lived sessions, with the
/// same lookup semantics as [`FileCalibrationStore`] but no I/O.
#[derive(Debug, Default)]
pub struct InMemoryCalibrationStore {
    entries: BTreeMap<String, CalibrationData>,
    latest_profile_id: Option<String>,
}

impl CalibrationStore for InMemoryCalibrationStore {
    fn save(&mut self, data: CalibrationData) -> Result<()> {
        let profile_id = data.hardware_profile.profile_id.clone();
        self.entries.insert(profile_id.clone(), data);
        self.latest_profile_id = Some(profile_id);
        Ok(())
    }

    fn load_latest(&self) -> Option<CalibrationData> {
        self.latest_profile_id.as_ref().and_then(|id| self.entries.get(id)).cloned()
    }

    fn load_by_profile_id(&self, profile_id: &str) -> Option<CalibrationData> {
        self.entries.get(profile_id).cloned()
    }

    fn list_profiles(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn is_recent(&self, window: Duration) -> bool {
        match self.load_latest() {
            Some(data) => is_within_window(&data.completed_at, window),
            None => false,
        }
    }

    fn report(&self) -> String {
        match self.load_latest() {
            Some(data) => render_report(&data),
            None => "no calibration data on record".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> HardwareProfile {
        HardwareProfile {
            profile_id: "x86_64-linux-8c-2026-01-01".to_string(),
            machine: "x86_64-linux".to_string(),
            cpu_desc: "x86_64 (8 logical cores)".to_string(),
            cpu_count: 8,
            memory_bytes: 16 * 1024 * 1024 * 1024,
            os_desc: "linux".to_string(),
            runtime_ver: "unknown".to_string(),
            is_64bit: true,
            reference_score: 1_000_000.0,
            captured_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn sample_data(profile: HardwareProfile, completed_at: &str) -> CalibrationData {
        let mut method_results = BTreeMap::new();
        method_results.insert(
            "Vec::sort".to_string(),
            MethodCalibration::Measured(CalibrationResult {
                curve: CurveClass::Linearithmic,
                coefficient: 4.2,
                r_squared: 0.97,
                samples: 8,
            }),
        );
        method_results.insert(
            "Widget::unstable_op".to_string(),
            MethodCalibration::Failed {
                reason: "non-monotone timings".to_string(),
            },
        );
        CalibrationData {
            version: CALIBRATION_FORMAT_VERSION,
            hardware_profile: profile,
            method_results,
            started_at: "2026-01-01T00:00:00Z".to_string(),
            completed_at: completed_at.to_string(),
        }
    }

    #[test]
    fn in_memory_store_round_trips_a_load_latest() {
        let mut store = InMemoryCalibrationStore::default();
        store.save(sample_data(sample_profile(), "2026-01-01T00:00:05Z")).unwrap();
        let loaded = store.load_latest().unwrap();
        assert_eq!(loaded.hardware_profile.profile_id, sample_profile().profile_id);
        assert_eq!(loaded.success_count(), 1);
        assert_eq!(loaded.failures().len(), 1);
    }

    #[test]
    fn in_memory_store_loads_by_profile_id() {
        let mut store = InMemoryCalibrationStore::default();
        let profile = sample_profile();
        store.save(sample_data(profile.clone(), "2026-01-01T00:00:05Z")).unwrap();
        assert!(store.load_by_profile_id(&profile.profile_id).is_some());
        assert!(store.load_by_profile_id("nonexistent").is_none());
    }

    #[test]
    fn list_profiles_returns_every_saved_profile_id() {
        let mut store = InMemoryCalibrationStore::default();
        let mut other = sample_profile();
        other.profile_id = "aarch64-macos-4c-2026-01-02".to_string();
        store.save(sample_data(sample_profile(), "2026-01-01T00:00:05Z")).unwrap();
        store.save(sample_data(other.clone(), "2026-01-02T00:00:05Z")).unwrap();
        let mut profiles = store.list_profiles();
        profiles.sort();
        assert_eq!(profiles, vec!["aarch64-macos-4c-2026-01-02".to_string(), sample_profile().profile_id]);
    }

    #[test]
    fn estimate_method_time_uses_the_stored_coefficient() {
        let mut store = InMemoryCalibrationStore::default();
        store.save(sample_data(sample_profile(), "2026-01-01T00:00:05Z")).unwrap();
        let data = store.load_latest().unwrap();
        let claimed = ComplexityExpression::PolyLog {
            coefficient: 1.0,
            var: crate::core::variable::Variable::n(),
            poly_exp: 1.0,
            log_exp: 1.0,
        };
        let estimate = estimate_method_time_ns(&data, "Vec::sort", &claimed, 1000.0).unwrap();
        assert!(estimate > 0.0);
        assert!(estimate_method_time_ns(&data, "Widget::unstable_op", &claimed, 1000.0).is_none());
        assert!(estimate_method_time_ns(&data, "unknown_method", &claimed, 1000.0).is_none());
    }

    #[test]
    fn file_store_persists_latest_and_by_profile_id_across_reopen() {
        let dir = std::env::temp_dir().join(format!("complexity-core-test-{}", std::process::id()));
        {
            let mut store = FileCalibrationStore::open(&dir).unwrap();
            store.save(sample_data(sample_profile(), "2026-01-01T00:00:05Z")).unwrap();
        }
        let reopened = FileCalibrationStore::open(&dir).unwrap();
        assert!(reopened.load_latest().is_some());
        assert!(reopened.load_by_profile_id(&sample_profile().profile_id).is_some());
        assert!(dir.join("latest.json").exists());
        assert!(dir.join(format!("calibration-{}.json", sample_profile().profile_id)).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn is_recent_respects_the_supplied_window() {
        let mut store = InMemoryCalibrationStore::default();
        let completed_at = Utc::now().to_rfc3339();
        store.save(sample_data(sample_profile(), &completed_at)).unwrap();
        assert!(store.is_recent(Duration::hours(1)));

        let mut old_store = InMemoryCalibrationStore::default();
        old_store.save(sample_data(sample_profile(), "2000-01-01T00:00:00Z")).unwrap();
        assert!(!old_store.is_recent(Duration::hours(1)));
    }

    #[test]
    fn report_mentions_hardware_success_count_and_failures() {
        let mut store = InMemoryCalibrationStore::default();
        store.save(sample_data(sample_profile(), "2026-01-01T00:00:05Z")).unwrap();
        let report = store.report();
        assert!(report.contains("x86_64-linux"));
        assert!(report.contains("1/2"));
        assert!(report.contains("Widget::unstable_op"));
    }
}
