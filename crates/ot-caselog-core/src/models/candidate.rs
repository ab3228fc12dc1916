//! Unvalidated case input as bound by the case form.

use serde::{Deserialize, Serialize};

use super::case::CaseDetails;

/// Block fields as entered. All optional; only consulted for regional techniques.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockInput {
    pub block_type: Option<String>,
    pub level: Option<String>,
    pub side: Option<String>,
    pub is_ultrasound_guided: Option<bool>,
    pub local_anesthetic: Option<String>,
}

impl BlockInput {
    /// Check if no block field was filled in.
    pub fn is_empty(&self) -> bool {
        self.block_type.is_none()
            && self.level.is_none()
            && self.side.is_none()
            && self.is_ultrasound_guided.is_none()
            && self.local_anesthetic.is_none()
    }
}

/// A candidate case as entered in the form.
///
/// Enumerated fields are kept as text and numeric fields as wide signed
/// integers so that every bad value reaches validation and gets a
/// field-scoped error instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseCandidate {
    /// Surgery date, `YYYY-MM-DD` (an RFC 3339 timestamp is also accepted)
    pub date: String,
    pub location: Option<String>,
    pub is_emergency: bool,
    pub patient_id: String,
    pub age: Option<i64>,
    pub sex: String,
    pub asa_grade: String,
    pub comorbidities: Vec<String>,
    pub specialty: String,
    pub surgery_type: String,
    pub patient_position: String,
    pub anesthesia_technique: String,
    pub has_adjuvants: bool,
    pub adjuvant_details: Option<String>,
    pub block: BlockInput,
    pub duration: Option<i64>,
    pub hemodynamic_status: String,
    pub has_airway_difficulty: bool,
    pub complications: Vec<String>,
    pub post_op_analgesia: String,
    pub rescue_analgesia_required: bool,
    pub notes: Option<String>,
}

impl From<&CaseDetails> for CaseCandidate {
    fn from(details: &CaseDetails) -> Self {
        let block = details
            .block_details
            .as_ref()
            .map(|b| BlockInput {
                block_type: Some(b.block_type.clone()),
                level: Some(b.level.clone()),
                side: Some(b.side.as_str().to_string()),
                is_ultrasound_guided: Some(b.is_ultrasound_guided),
                local_anesthetic: Some(b.local_anesthetic.clone()),
            })
            .unwrap_or_default();

        Self {
            date: details.date.format("%Y-%m-%d").to_string(),
            location: details.location.clone(),
            is_emergency: details.is_emergency,
            patient_id: details.patient_id.clone(),
            age: Some(i64::from(details.age)),
            sex: details.sex.as_str().to_string(),
            asa_grade: details.asa_grade.as_str().to_string(),
            comorbidities: details.comorbidities.clone(),
            specialty: details.specialty.clone(),
            surgery_type: details.surgery_type.clone(),
            patient_position: details.patient_position.as_str().to_string(),
            anesthesia_technique: details.anesthesia_technique.clone(),
            has_adjuvants: details.has_adjuvants,
            adjuvant_details: details.adjuvant_details.clone(),
            block,
            duration: Some(i64::from(details.duration)),
            hemodynamic_status: details.hemodynamic_status.as_str().to_string(),
            has_airway_difficulty: details.has_airway_difficulty,
            complications: details.complications.clone(),
            post_op_analgesia: details.post_op_analgesia.as_str().to_string(),
            rescue_analgesia_required: details.rescue_analgesia_required,
            notes: details.notes.clone(),
        }
    }
}
