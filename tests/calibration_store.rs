//! Calibration store properties (spec.md §8).

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use complexity_core::bench::curvefit::CurveClass;
use complexity_core::calibration::{
    CalibrationData, CalibrationResult, CalibrationStore, FileCalibrationStore, HardwareProfile, InMemoryCalibrationStore,
    MethodCalibration, CALIBRATION_FORMAT_VERSION,
};

fn profile() -> HardwareProfile {
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

fn data(completed_at: &str) -> CalibrationData {
    let mut method_results = BTreeMap::new();
    method_results.insert(
        "linear_scan".to_string(),
        MethodCalibration::Measured(CalibrationResult {
            curve: CurveClass::Linear,
            coefficient: 1.23,
            r_squared: 0.98,
            samples: 8,
        }),
    );
    CalibrationData {
        version: CALIBRATION_FORMAT_VERSION,
        hardware_profile: profile(),
        method_results,
        started_at: "2026-01-01T00:00:00Z".to_string(),
        completed_at: completed_at.to_string(),
    }
}

#[test]
fn save_then_load_latest_returns_an_equal_record() {
    let dir = std::env::temp_dir().join(format!("complexity-core-calibration-test-{}", std::process::id()));

    let mut store = FileCalibrationStore::open(&dir).unwrap();
    store.save(data("2026-01-01T00:00:05Z")).unwrap();

    let reopened = FileCalibrationStore::open(&dir).unwrap();
    let loaded = reopened.load_latest().expect("a record was just saved");
    assert_eq!(loaded.hardware_profile, data("2026-01-01T00:00:05Z").hardware_profile);
    match loaded.method_results.get("linear_scan") {
        Some(MethodCalibration::Measured(result)) => assert!((result.coefficient - 1.23).abs() < 1e-9),
        other => panic!("expected a measured result, got {other:?}"),
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn load_by_profile_id_finds_a_saved_record() {
    let dir = std::env::temp_dir().join(format!("complexity-core-calibration-test-by-id-{}", std::process::id()));
    let mut store = FileCalibrationStore::open(&dir).unwrap();
    store.save(data("2026-01-01T00:00:05Z")).unwrap();

    assert!(store.load_by_profile_id(&profile().profile_id).is_some());
    assert!(store.load_by_profile_id("some-other-machine").is_none());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn a_second_save_for_the_same_profile_replaces_rather_than_duplicates() {
    let dir = std::env::temp_dir().join(format!("complexity-core-calibration-test-dup-{}", std::process::id()));

    let mut store = FileCalibrationStore::open(&dir).unwrap();
    store.save(data("2026-01-01T00:00:05Z")).unwrap();
    let mut updated = data("2026-01-01T00:01:00Z");
    if let Some(MethodCalibration::Measured(result)) = updated.method_results.get_mut("linear_scan") {
        result.coefficient = 9.99;
    }
    store.save(updated).unwrap();

    assert_eq!(store.list_profiles().len(), 1);
    let loaded = store.load_latest().unwrap();
    match loaded.method_results.get("linear_scan") {
        Some(MethodCalibration::Measured(result)) => assert!((result.coefficient - 9.99).abs() < 1e-9),
        other => panic!("expected a measured result, got {other:?}"),
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn list_profiles_is_empty_for_a_fresh_store() {
    let dir = std::env::temp_dir().join(format!("complexity-core-calibration-test-empty-{}", std::process::id()));
    let store = FileCalibrationStore::open(&dir).unwrap();
    assert!(store.list_profiles().is_empty());
    assert!(store.load_latest().is_none());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn recency_predicate_respects_the_supplied_window() {
    let mut recent_store = InMemoryCalibrationStore::default();
    recent_store.save(data(&Utc::now().to_rfc3339())).unwrap();
    assert!(recent_store.is_recent(Duration::hours(1)));
    assert!(!recent_store.is_recent(Duration::seconds(0)) || recent_store.is_recent(Duration::minutes(1)));

    let mut stale_store = InMemoryCalibrationStore::default();
    stale_store.save(data("2000-01-01T00:00:00Z")).unwrap();
    assert!(!stale_store.is_recent(Duration::hours(1)));
    assert!(stale_store.is_recent(Duration::days(365 * 30)));
}

#[test]
fn report_includes_the_hardware_profile_and_method_results() {
    let mut store = InMemoryCalibrationStore::default();
    store.save(data("2026-01-01T00:00:05Z")).unwrap();
    let report = store.report();
    assert!(report.contains(&profile().profile_id));
    assert!(report.contains("linear_scan"));
}
