//! Golden tests for dashboard statistics.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use ot_caselog_core::models::{AsaGrade, CaseCandidate, CaseRecord, ANESTHESIA_TECHNIQUES};
use ot_caselog_core::stats::{DashboardStats, NOT_AVAILABLE};
use ot_caselog_core::validation::validate;

/// Golden case: recorded (ASA grade, technique) pairs and the expected figures.
struct GoldenCase {
    id: &'static str,
    cases: Vec<(&'static str, &'static str)>,
    expected_asa: &'static str,
    expected_technique: &'static str,
    expected_asa_counts: [u32; 5],
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "empty",
            cases: vec![],
            expected_asa: NOT_AVAILABLE,
            expected_technique: NOT_AVAILABLE,
            expected_asa_counts: [0, 0, 0, 0, 0],
        },
        GoldenCase {
            id: "asa-i-i-iii",
            cases: vec![("I", "GA"), ("I", "GA"), ("III", "Spinal")],
            expected_asa: "ASA I",
            expected_technique: "GA",
            expected_asa_counts: [2, 0, 1, 0, 0],
        },
        GoldenCase {
            id: "grade-tie",
            cases: vec![("V", "GA"), ("III", "Epidural")],
            expected_asa: "ASA III",
            expected_technique: "GA",
            expected_asa_counts: [0, 0, 1, 0, 1],
        },
        GoldenCase {
            id: "custom-technique-wins",
            cases: vec![("II", "TIVA"), ("II", "TIVA"), ("IV", "CSE")],
            expected_asa: "ASA II",
            expected_technique: "TIVA",
            expected_asa_counts: [0, 2, 0, 1, 0],
        },
    ]
}

fn record(asa: &str, technique: &str) -> CaseRecord {
    let candidate = CaseCandidate {
        date: "2024-02-10".into(),
        patient_id: "MRN-1".into(),
        age: Some(50),
        sex: "Male".into(),
        asa_grade: asa.into(),
        specialty: "General Surgery".into(),
        surgery_type: "Hernia Repair".into(),
        patient_position: "Supine".into(),
        anesthesia_technique: technique.into(),
        duration: Some(60),
        hemodynamic_status: "Stable".into(),
        post_op_analgesia: "Adequate".into(),
        ..Default::default()
    };
    CaseRecord::new("user-1".into(), validate(&candidate).unwrap())
}

#[test]
fn test_golden_cases() {
    let now = Utc.with_ymd_and_hms(2024, 2, 20, 9, 0, 0).unwrap();

    for case in get_golden_cases() {
        let records: Vec<CaseRecord> = case.cases.iter().map(|(a, t)| record(a, t)).collect();
        let stats = DashboardStats::compute(&records, &now);

        assert_eq!(stats.total_cases as usize, records.len(), "Case {}: total", case.id);
        assert_eq!(stats.most_common_asa_grade, case.expected_asa, "Case {}: ASA", case.id);
        assert_eq!(
            stats.most_common_technique, case.expected_technique,
            "Case {}: technique", case.id
        );

        let counts: Vec<u32> = stats.asa_grade_distribution.iter().map(|e| e.value).collect();
        assert_eq!(counts, case.expected_asa_counts.to_vec(), "Case {}: ASA counts", case.id);
        assert_eq!(
            stats.technique_distribution.len(),
            ANESTHESIA_TECHNIQUES.len(),
            "Case {}: technique entries", case.id
        );
    }
}

#[test]
fn test_distribution_labels() {
    let stats = DashboardStats::compute(&[], &Utc::now());
    let labels: Vec<&str> = stats
        .asa_grade_distribution
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(labels, vec!["ASA I", "ASA II", "ASA III", "ASA IV", "ASA V"]);
}

#[test]
fn test_stats_json_shape() {
    let stats = DashboardStats::compute(&[record("I", "GA")], &Utc::now());
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["totalCases"], 1);
    assert_eq!(json["mostCommonAsaGrade"], "ASA I");
    assert_eq!(json["asaGradeDistribution"][0]["name"], "ASA I");
    assert_eq!(json["asaGradeDistribution"][0]["value"], 1);
}

proptest! {
    #[test]
    fn prop_asa_distribution_sums_to_total(
        grades in prop::collection::vec(prop::sample::select(AsaGrade::ALL.to_vec()), 0..40),
    ) {
        let records: Vec<CaseRecord> = grades.iter().map(|g| record(g.as_str(), "GA")).collect();
        let stats = DashboardStats::compute(&records, &Utc::now());

        prop_assert_eq!(stats.asa_grade_distribution.len(), 5);
        let sum: u32 = stats.asa_grade_distribution.iter().map(|e| e.value).sum();
        prop_assert_eq!(sum, stats.total_cases);
        prop_assert_eq!(stats.total_cases as usize, grades.len());
    }

    #[test]
    fn prop_reference_techniques_fully_charted(
        techniques in prop::collection::vec(
            prop::sample::select(ANESTHESIA_TECHNIQUES.to_vec()),
            0..40,
        ),
    ) {
        let records: Vec<CaseRecord> = techniques.iter().map(|t| record("II", t)).collect();
        let stats = DashboardStats::compute(&records, &Utc::now());

        let charted: u32 = stats.technique_distribution.iter().map(|e| e.value).sum();
        prop_assert_eq!(charted, stats.total_cases);
    }
}
