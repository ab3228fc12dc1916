//! Case record validation.
//!
//! Turns a [`CaseCandidate`] into [`CaseDetails`] or field-scoped errors.
//! Validation is all-or-nothing and has no side effects; block details are
//! derived from the technique here and nowhere else.

mod block;
mod text;

pub use block::derive_block_details;

use chrono::{DateTime, NaiveDate};
use thiserror::Error;

use crate::models::{
    AsaGrade, BlockDetails, CaseCandidate, CaseDetails, HemodynamicStatus, PatientPosition,
    PostOpAnalgesia, Sex,
};
use text::{optional_text, required_text, tag_set};

pub const MIN_AGE: i64 = 0;
pub const MAX_AGE: i64 = 120;
pub const MIN_DURATION_MINUTES: i64 = 1;

/// The rule a field violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    Required,
    OutOfRange { min: i64, max: i64 },
    BelowMinimum { min: i64 },
    NotInVocabulary { allowed: Vec<&'static str> },
    ControlCharacters,
    InvalidDate,
}

impl std::fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationRule::Required => write!(f, "is required"),
            ValidationRule::OutOfRange { min, max } => {
                write!(f, "must be between {} and {}", min, max)
            }
            ValidationRule::BelowMinimum { min } => write!(f, "must be at least {}", min),
            ValidationRule::NotInVocabulary { allowed } => {
                write!(f, "must be one of: {}", allowed.join(", "))
            }
            ValidationRule::ControlCharacters => write!(f, "contains control characters"),
            ValidationRule::InvalidDate => write!(f, "is not a valid date (expected YYYY-MM-DD)"),
        }
    }
}

/// A single failed constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} {rule}")]
pub struct ValidationError {
    /// Form field name (camelCase, as in exports)
    pub field: &'static str,
    pub rule: ValidationRule,
}

impl ValidationError {
    pub fn new(field: &'static str, rule: ValidationRule) -> Self {
        Self { field, rule }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a candidate, returning the first failing field in form order.
pub fn validate(candidate: &CaseCandidate) -> ValidationResult<CaseDetails> {
    FieldChecks::run(candidate).into_details()
}

/// Every failing field in form order. Empty when the candidate is valid.
pub fn collect_errors(candidate: &CaseCandidate) -> Vec<ValidationError> {
    FieldChecks::run(candidate).errors()
}

/// Per-field check results, in form order.
struct FieldChecks {
    date: ValidationResult<NaiveDate>,
    location: ValidationResult<Option<String>>,
    patient_id: ValidationResult<String>,
    age: ValidationResult<u8>,
    sex: ValidationResult<Sex>,
    asa_grade: ValidationResult<AsaGrade>,
    comorbidities: ValidationResult<Vec<String>>,
    specialty: ValidationResult<String>,
    surgery_type: ValidationResult<String>,
    patient_position: ValidationResult<PatientPosition>,
    anesthesia_technique: ValidationResult<String>,
    adjuvant_details: ValidationResult<Option<String>>,
    block_details: ValidationResult<Option<BlockDetails>>,
    duration: ValidationResult<u32>,
    hemodynamic_status: ValidationResult<HemodynamicStatus>,
    complications: ValidationResult<Vec<String>>,
    post_op_analgesia: ValidationResult<PostOpAnalgesia>,
    notes: ValidationResult<Option<String>>,
    flags: Flags,
}

/// Checkbox fields. These cannot fail.
struct Flags {
    is_emergency: bool,
    has_adjuvants: bool,
    has_airway_difficulty: bool,
    rescue_analgesia_required: bool,
}

impl FieldChecks {
    fn run(c: &CaseCandidate) -> Self {
        Self {
            date: parse_date(&c.date),
            location: optional_text("location", c.location.as_deref(), false),
            patient_id: required_text("patientId", &c.patient_id),
            age: check_age(c.age),
            sex: parse_vocab("sex", &c.sex, Sex::parse, Sex::labels),
            asa_grade: parse_vocab("asaGrade", &c.asa_grade, AsaGrade::parse, AsaGrade::labels),
            comorbidities: tag_set("comorbidities", &c.comorbidities),
            specialty: required_text("specialty", &c.specialty),
            surgery_type: required_text("surgeryType", &c.surgery_type),
            patient_position: parse_vocab(
                "patientPosition",
                &c.patient_position,
                PatientPosition::parse,
                PatientPosition::labels,
            ),
            anesthesia_technique: required_text("anesthesiaTechnique", &c.anesthesia_technique),
            adjuvant_details: optional_text("adjuvantDetails", c.adjuvant_details.as_deref(), true),
            block_details: derive_block_details(&c.anesthesia_technique, &c.block),
            duration: check_duration(c.duration),
            hemodynamic_status: parse_vocab(
                "hemodynamicStatus",
                &c.hemodynamic_status,
                HemodynamicStatus::parse,
                HemodynamicStatus::labels,
            ),
            complications: tag_set("complications", &c.complications),
            post_op_analgesia: parse_vocab(
                "postOpAnalgesia",
                &c.post_op_analgesia,
                PostOpAnalgesia::parse,
                PostOpAnalgesia::labels,
            ),
            notes: optional_text("notes", c.notes.as_deref(), true),
            flags: Flags {
                is_emergency: c.is_emergency,
                has_adjuvants: c.has_adjuvants,
                has_airway_difficulty: c.has_airway_difficulty,
                rescue_analgesia_required: c.rescue_analgesia_required,
            },
        }
    }

    fn errors(&self) -> Vec<ValidationError> {
        [
            self.date.as_ref().err(),
            self.location.as_ref().err(),
            self.patient_id.as_ref().err(),
            self.age.as_ref().err(),
            self.sex.as_ref().err(),
            self.asa_grade.as_ref().err(),
            self.comorbidities.as_ref().err(),
            self.specialty.as_ref().err(),
            self.surgery_type.as_ref().err(),
            self.patient_position.as_ref().err(),
            self.anesthesia_technique.as_ref().err(),
            self.adjuvant_details.as_ref().err(),
            self.block_details.as_ref().err(),
            self.duration.as_ref().err(),
            self.hemodynamic_status.as_ref().err(),
            self.complications.as_ref().err(),
            self.post_op_analgesia.as_ref().err(),
            self.notes.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }

    /// Field order in this literal matches `errors`, so `?` yields the first error.
    fn into_details(self) -> ValidationResult<CaseDetails> {
        let flags = self.flags;
        Ok(CaseDetails {
            date: self.date?,
            location: self.location?,
            patient_id: self.patient_id?,
            age: self.age?,
            sex: self.sex?,
            asa_grade: self.asa_grade?,
            comorbidities: self.comorbidities?,
            specialty: self.specialty?,
            surgery_type: self.surgery_type?,
            patient_position: self.patient_position?,
            anesthesia_technique: self.anesthesia_technique?,
            adjuvant_details: self.adjuvant_details?,
            block_details: self.block_details?,
            duration: self.duration?,
            hemodynamic_status: self.hemodynamic_status?,
            complications: self.complications?,
            post_op_analgesia: self.post_op_analgesia?,
            notes: self.notes?,
            is_emergency: flags.is_emergency,
            has_adjuvants: flags.has_adjuvants,
            has_airway_difficulty: flags.has_airway_difficulty,
            rescue_analgesia_required: flags.rescue_analgesia_required,
        })
    }
}

fn parse_date(raw: &str) -> ValidationResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new("date", ValidationRule::Required));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| ValidationError::new("date", ValidationRule::InvalidDate))
}

fn check_age(age: Option<i64>) -> ValidationResult<u8> {
    let age = age.ok_or_else(|| ValidationError::new("age", ValidationRule::Required))?;
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(ValidationError::new(
            "age",
            ValidationRule::OutOfRange {
                min: MIN_AGE,
                max: MAX_AGE,
            },
        ));
    }
    u8::try_from(age).map_err(|_| {
        ValidationError::new(
            "age",
            ValidationRule::OutOfRange {
                min: MIN_AGE,
                max: MAX_AGE,
            },
        )
    })
}

fn check_duration(duration: Option<i64>) -> ValidationResult<u32> {
    let duration =
        duration.ok_or_else(|| ValidationError::new("duration", ValidationRule::Required))?;
    if duration < MIN_DURATION_MINUTES {
        return Err(ValidationError::new(
            "duration",
            ValidationRule::BelowMinimum {
                min: MIN_DURATION_MINUTES,
            },
        ));
    }
    u32::try_from(duration).map_err(|_| {
        ValidationError::new(
            "duration",
            ValidationRule::OutOfRange {
                min: MIN_DURATION_MINUTES,
                max: i64::from(u32::MAX),
            },
        )
    })
}

fn parse_vocab<T>(
    field: &'static str,
    raw: &str,
    parse: fn(&str) -> Option<T>,
    labels: fn() -> Vec<&'static str>,
) -> ValidationResult<T> {
    if raw.trim().is_empty() {
        return Err(ValidationError::new(field, ValidationRule::Required));
    }
    parse(raw).ok_or_else(|| {
        ValidationError::new(field, ValidationRule::NotInVocabulary { allowed: labels() })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockInput, BlockSide};
    use proptest::prelude::*;

    fn valid_candidate() -> CaseCandidate {
        CaseCandidate {
            date: "2024-05-02".into(),
            patient_id: "MRN-42".into(),
            age: Some(63),
            sex: "Male".into(),
            asa_grade: "III".into(),
            comorbidities: vec!["HTN".into(), "CAD".into()],
            specialty: "Orthopedic Surgery".into(),
            surgery_type: "Total Knee Replacement".into(),
            patient_position: "Supine".into(),
            anesthesia_technique: "GA".into(),
            duration: Some(120),
            hemodynamic_status: "Stable".into(),
            post_op_analgesia: "Adequate".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_candidate() {
        let details = validate(&valid_candidate()).unwrap();
        assert_eq!(details.age, 63);
        assert_eq!(details.asa_grade, AsaGrade::III);
        assert_eq!(details.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert!(details.block_details.is_none());
        assert!(collect_errors(&valid_candidate()).is_empty());
    }

    #[test]
    fn test_required_fields() {
        for field in ["patientId", "specialty", "surgeryType", "anesthesiaTechnique"] {
            let mut candidate = valid_candidate();
            match field {
                "patientId" => candidate.patient_id = "  ".into(),
                "specialty" => candidate.specialty.clear(),
                "surgeryType" => candidate.surgery_type.clear(),
                _ => candidate.anesthesia_technique.clear(),
            }
            let err = validate(&candidate).unwrap_err();
            assert_eq!(err.field, field);
            assert_eq!(err.rule, ValidationRule::Required);
        }
    }

    #[test]
    fn test_age_bounds() {
        let mut candidate = valid_candidate();
        candidate.age = Some(0);
        assert!(validate(&candidate).is_ok());
        candidate.age = Some(120);
        assert!(validate(&candidate).is_ok());

        candidate.age = Some(121);
        let err = validate(&candidate).unwrap_err();
        assert_eq!(err.field, "age");
        assert_eq!(err.rule, ValidationRule::OutOfRange { min: 0, max: 120 });

        candidate.age = Some(-1);
        assert_eq!(validate(&candidate).unwrap_err().field, "age");

        candidate.age = None;
        assert_eq!(validate(&candidate).unwrap_err().rule, ValidationRule::Required);
    }

    #[test]
    fn test_duration_minimum() {
        let mut candidate = valid_candidate();
        candidate.duration = Some(1);
        assert!(validate(&candidate).is_ok());

        candidate.duration = Some(0);
        let err = validate(&candidate).unwrap_err();
        assert_eq!(err.field, "duration");
        assert_eq!(err.rule, ValidationRule::BelowMinimum { min: 1 });
    }

    #[test]
    fn test_enum_rejection_names_allowed_values() {
        let mut candidate = valid_candidate();
        candidate.asa_grade = "VI".into();
        let err = validate(&candidate).unwrap_err();
        assert_eq!(err.field, "asaGrade");
        assert_eq!(err.to_string(), "asaGrade must be one of: I, II, III, IV, V");
    }

    #[test]
    fn test_invalid_date() {
        let mut candidate = valid_candidate();
        candidate.date = "02/05/2024".into();
        assert_eq!(validate(&candidate).unwrap_err().rule, ValidationRule::InvalidDate);

        candidate.date = "2024-05-02T08:30:00Z".into();
        assert!(validate(&candidate).is_ok());
    }

    #[test]
    fn test_first_error_in_form_order() {
        let mut candidate = valid_candidate();
        candidate.duration = Some(0);
        candidate.patient_id.clear();
        candidate.sex = "Unknown".into();

        assert_eq!(validate(&candidate).unwrap_err().field, "patientId");

        let fields: Vec<&str> = collect_errors(&candidate).iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["patientId", "sex", "duration"]);
    }

    #[test]
    fn test_regional_technique_gets_block() {
        let mut candidate = valid_candidate();
        candidate.anesthesia_technique = "Spinal".into();
        candidate.block = BlockInput {
            block_type: Some("Subarachnoid".into()),
            side: Some("Left".into()),
            ..Default::default()
        };

        let details = validate(&candidate).unwrap();
        let block = details.block_details.unwrap();
        assert_eq!(block.block_type, "Subarachnoid");
        assert_eq!(block.side, BlockSide::Left);
    }

    #[test]
    fn test_switching_to_ga_strips_block() {
        let mut candidate = valid_candidate();
        candidate.anesthesia_technique = "Spinal".into();
        candidate.block.block_type = Some("Subarachnoid".into());
        assert!(validate(&candidate).unwrap().block_details.is_some());

        candidate.anesthesia_technique = "GA".into();
        assert!(validate(&candidate).unwrap().block_details.is_none());
    }

    #[test]
    fn test_custom_technique_accepted() {
        let mut candidate = valid_candidate();
        candidate.anesthesia_technique = "TIVA".into();
        let details = validate(&candidate).unwrap();
        assert_eq!(details.anesthesia_technique, "TIVA");
        assert!(details.block_details.is_none());
    }

    #[test]
    fn test_tags_deduplicated() {
        let mut candidate = valid_candidate();
        candidate.complications = vec!["PONV".into(), "PONV".into(), "Hypotension".into()];
        let details = validate(&candidate).unwrap();
        assert_eq!(details.complications, vec!["PONV", "Hypotension"]);
    }

    proptest! {
        #[test]
        fn prop_all_vocabulary_values_accepted(
            sex in prop::sample::select(Sex::ALL.to_vec()),
            asa in prop::sample::select(AsaGrade::ALL.to_vec()),
            position in prop::sample::select(PatientPosition::ALL.to_vec()),
            hemo in prop::sample::select(HemodynamicStatus::ALL.to_vec()),
            analgesia in prop::sample::select(PostOpAnalgesia::ALL.to_vec()),
            age in MIN_AGE..=MAX_AGE,
            duration in 1i64..2000,
        ) {
            let mut candidate = valid_candidate();
            candidate.sex = sex.as_str().into();
            candidate.asa_grade = asa.as_str().into();
            candidate.patient_position = position.as_str().into();
            candidate.hemodynamic_status = hemo.as_str().into();
            candidate.post_op_analgesia = analgesia.as_str().into();
            candidate.age = Some(age);
            candidate.duration = Some(duration);

            let details = validate(&candidate).unwrap();
            prop_assert_eq!(details.sex, sex);
            prop_assert_eq!(details.asa_grade, asa);
            prop_assert_eq!(i64::from(details.age), age);
        }

        #[test]
        fn prop_out_of_range_age_rejected(age in prop_oneof![i64::MIN..0i64, 121i64..i64::MAX]) {
            let mut candidate = valid_candidate();
            candidate.age = Some(age);
            let err = validate(&candidate).unwrap_err();
            prop_assert_eq!(err.field, "age");
        }

        #[test]
        fn prop_block_presence_follows_technique(
            technique in prop::sample::select(crate::models::ANESTHESIA_TECHNIQUES.to_vec()),
            block_type in "[A-Za-z ]{0,20}",
        ) {
            let mut candidate = valid_candidate();
            candidate.anesthesia_technique = technique.to_string();
            candidate.block.block_type = Some(block_type);

            let details = validate(&candidate).unwrap();
            prop_assert_eq!(
                details.block_details.is_some(),
                crate::models::is_regional_technique(technique)
            );
        }
    }
}
