//! Case log models: validated case details and stored records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::vocabulary::{
    AsaGrade, BlockSide, HemodynamicStatus, PatientPosition, PostOpAnalgesia, Sex,
};

/// Regional block sub-record. Only present for regional techniques.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockDetails {
    /// Block type (e.g. "Subarachnoid", "Interscalene")
    #[serde(rename = "type")]
    pub block_type: String,
    /// Vertebral level or anatomical site
    pub level: String,
    pub side: BlockSide,
    pub is_ultrasound_guided: bool,
    /// Local anesthetic agent and dose
    pub local_anesthetic: String,
}

/// A validated case, without store-assigned identity.
///
/// Only [`crate::validation::validate`] produces these from user input, so the
/// block/technique relationship always holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaseDetails {
    /// Surgery date
    pub date: NaiveDate,
    /// Theatre / hospital
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub is_emergency: bool,
    /// Patient ID / MRN (not unique across cases)
    pub patient_id: String,
    /// Age in years (0-120)
    pub age: u8,
    pub sex: Sex,
    pub asa_grade: AsaGrade,
    pub comorbidities: Vec<String>,
    pub specialty: String,
    pub surgery_type: String,
    pub patient_position: PatientPosition,
    pub anesthesia_technique: String,
    pub has_adjuvants: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjuvant_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_details: Option<BlockDetails>,
    /// Anesthesia duration in minutes
    pub duration: u32,
    pub hemodynamic_status: HemodynamicStatus,
    pub has_airway_difficulty: bool,
    pub complications: Vec<String>,
    pub post_op_analgesia: PostOpAnalgesia,
    pub rescue_analgesia_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CaseDetails {
    /// Check if this case carries regional block details.
    pub fn is_regional(&self) -> bool {
        self.block_details.is_some()
    }
}

/// A stored case log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    /// Store-assigned case ID (UUID)
    pub id: String,
    /// Owning user
    pub user_id: String,
    #[serde(flatten)]
    pub details: CaseDetails,
    /// Creation timestamp (store-assigned, immutable)
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CaseRecord {
    /// Assign identity to freshly validated details.
    pub fn new(user_id: String, details: CaseDetails) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            details,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every editable field; identity and creation time are kept.
    pub fn replace_details(&mut self, details: CaseDetails) {
        self.details = details;
        self.touch();
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_new_record_identity() {
        let record = CaseRecord::new("user-1".into(), ga_case());
        assert_eq!(record.id.len(), 36); // UUID format
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_replace_details_keeps_identity() {
        let mut record = CaseRecord::new("user-1".into(), ga_case());
        let id = record.id.clone();
        let created_at = record.created_at;

        record.replace_details(spinal_case());

        assert_eq!(record.id, id);
        assert_eq!(record.created_at, created_at);
        assert!(record.details.is_regional());
        assert!(record.updated_at >= created_at);
    }

    #[test]
    fn test_json_shape() {
        let record = CaseRecord::new("user-1".into(), ga_case());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["patientId"], "MRN-1001");
        assert_eq!(json["asaGrade"], "II");
        assert_eq!(json["date"], "2024-03-14");
        assert!(json.get("createdAt").is_some());
        // Absent block is omitted entirely, never null
        assert!(json.get("blockDetails").is_none());
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_block_details_json() {
        let details = spinal_case();
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["blockDetails"]["type"], "Subarachnoid");
        assert_eq!(json["blockDetails"]["isUltrasoundGuided"], false);

        let back: CaseDetails = serde_json::from_value(json).unwrap();
        assert_eq!(back, details);
    }
}
