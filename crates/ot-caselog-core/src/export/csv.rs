//! CSV export of case records.

use crate::models::CaseRecord;

/// Column headers, in output order.
pub const CSV_HEADERS: &[&str] = &[
    "id",
    "date",
    "location",
    "isEmergency",
    "patientId",
    "age",
    "sex",
    "asaGrade",
    "comorbidities",
    "specialty",
    "surgeryType",
    "patientPosition",
    "anesthesiaTechnique",
    "duration",
    "hemodynamicStatus",
    "hasAirwayDifficulty",
    "complications",
    "postOpAnalgesia",
    "rescueAnalgesiaRequired",
    "notes",
    "hasAdjuvants",
    "adjuvantDetails",
    "blockType",
    "blockLevel",
    "blockSide",
    "blockUltrasoundGuided",
    "blockLocalAnesthetic",
];

/// Separator for tag-set columns.
pub const TAG_SEPARATOR: &str = "; ";

/// Render records as CSV. An empty slice yields the header line only.
pub fn cases_to_csv(records: &[CaseRecord]) -> String {
    let mut csv = String::new();

    // Header
    csv.push_str(&CSV_HEADERS.join(","));
    csv.push('\n');

    for record in records {
        let fields = case_fields(record);
        let line: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
        csv.push_str(&line.join(","));
        csv.push('\n');
    }

    csv
}

/// One value per header, unescaped.
fn case_fields(record: &CaseRecord) -> Vec<String> {
    let d = &record.details;
    let block = d.block_details.as_ref();

    vec![
        record.id.clone(),
        d.date.format("%Y-%m-%d").to_string(),
        d.location.clone().unwrap_or_default(),
        d.is_emergency.to_string(),
        d.patient_id.clone(),
        d.age.to_string(),
        d.sex.to_string(),
        d.asa_grade.to_string(),
        d.comorbidities.join(TAG_SEPARATOR),
        d.specialty.clone(),
        d.surgery_type.clone(),
        d.patient_position.to_string(),
        d.anesthesia_technique.clone(),
        d.duration.to_string(),
        d.hemodynamic_status.to_string(),
        d.has_airway_difficulty.to_string(),
        d.complications.join(TAG_SEPARATOR),
        d.post_op_analgesia.to_string(),
        d.rescue_analgesia_required.to_string(),
        d.notes.clone().unwrap_or_default(),
        d.has_adjuvants.to_string(),
        d.adjuvant_details.clone().unwrap_or_default(),
        block.map(|b| b.block_type.clone()).unwrap_or_default(),
        block.map(|b| b.level.clone()).unwrap_or_default(),
        block.map(|b| b.side.to_string()).unwrap_or_default(),
        block
            .map(|b| b.is_ultrasound_guided.to_string())
            .unwrap_or_default(),
        block.map(|b| b.local_anesthetic.clone()).unwrap_or_default(),
    ]
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
