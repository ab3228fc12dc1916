//! Case log database operations.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{CaseStore, Database, DbError, DbResult};
use crate::models::{
    AsaGrade, BlockDetails, CaseDetails, CaseRecord, HemodynamicStatus, PatientPosition,
    PostOpAnalgesia, Sex,
};

const SELECT_CASE: &str = r#"
    SELECT case_id, user_id, surgery_date, location, is_emergency, patient_id,
           age, sex, asa_grade, comorbidities, specialty, surgery_type,
           patient_position, anesthesia_technique, has_adjuvants, adjuvant_details,
           block_details, duration, hemodynamic_status, has_airway_difficulty,
           complications, post_op_analgesia, rescue_analgesia_required, notes,
           created_at, updated_at
    FROM case_logs
"#;

impl CaseStore for Database {
    fn create_case(&self, user_id: &str, details: CaseDetails) -> DbResult<CaseRecord> {
        let record = CaseRecord::new(user_id.to_string(), details);
        let d = &record.details;
        let comorbidities_json = serde_json::to_string(&d.comorbidities)?;
        let complications_json = serde_json::to_string(&d.complications)?;
        let block_json = d.block_details.as_ref().map(serde_json::to_string).transpose()?;

        self.conn.execute(
            r#"
            INSERT INTO case_logs (
                case_id, user_id, surgery_date, location, is_emergency, patient_id,
                age, sex, asa_grade, comorbidities, specialty, surgery_type,
                patient_position, anesthesia_technique, has_adjuvants, adjuvant_details,
                block_details, duration, hemodynamic_status, has_airway_difficulty,
                complications, post_op_analgesia, rescue_analgesia_required, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                      ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)
            "#,
            params![
                record.id,
                record.user_id,
                date_to_string(&d.date),
                d.location,
                d.is_emergency,
                d.patient_id,
                d.age,
                d.sex.as_str(),
                d.asa_grade.as_str(),
                comorbidities_json,
                d.specialty,
                d.surgery_type,
                d.patient_position.as_str(),
                d.anesthesia_technique,
                d.has_adjuvants,
                d.adjuvant_details,
                block_json,
                d.duration,
                d.hemodynamic_status.as_str(),
                d.has_airway_difficulty,
                complications_json,
                d.post_op_analgesia.as_str(),
                d.rescue_analgesia_required,
                d.notes,
                timestamp_to_string(&record.created_at),
                timestamp_to_string(&record.updated_at),
            ],
        )?;

        tracing::info!(
            case_id = %record.id,
            technique = %d.anesthesia_technique,
            regional = d.is_regional(),
            "Case created"
        );
        Ok(record)
    }

    fn get_case(&self, user_id: &str, case_id: &str) -> DbResult<Option<CaseRecord>> {
        self.conn
            .query_row(
                &format!("{} WHERE user_id = ?1 AND case_id = ?2", SELECT_CASE),
                params![user_id, case_id],
                CaseRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    fn list_cases(&self, user_id: &str) -> DbResult<Vec<CaseRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
            SELECT_CASE
        ))?;

        let rows = stmt.query_map([user_id], CaseRow::from_row)?;

        let mut cases = Vec::new();
        for row in rows {
            cases.push(row?.try_into()?);
        }
        Ok(cases)
    }

    fn update_case(
        &self,
        user_id: &str,
        case_id: &str,
        details: CaseDetails,
    ) -> DbResult<CaseRecord> {
        let mut record = self
            .get_case(user_id, case_id)?
            .ok_or_else(|| DbError::NotFound(format!("case {}", case_id)))?;
        record.replace_details(details);

        let d = &record.details;
        let comorbidities_json = serde_json::to_string(&d.comorbidities)?;
        let complications_json = serde_json::to_string(&d.complications)?;
        let block_json = d.block_details.as_ref().map(serde_json::to_string).transpose()?;

        // Every editable column is written, so absent optionals become NULL
        let rows_affected = self.conn.execute(
            r#"
            UPDATE case_logs SET
                surgery_date = ?3,
                location = ?4,
                is_emergency = ?5,
                patient_id = ?6,
                age = ?7,
                sex = ?8,
                asa_grade = ?9,
                comorbidities = ?10,
                specialty = ?11,
                surgery_type = ?12,
                patient_position = ?13,
                anesthesia_technique = ?14,
                has_adjuvants = ?15,
                adjuvant_details = ?16,
                block_details = ?17,
                duration = ?18,
                hemodynamic_status = ?19,
                has_airway_difficulty = ?20,
                complications = ?21,
                post_op_analgesia = ?22,
                rescue_analgesia_required = ?23,
                notes = ?24,
                updated_at = ?25
            WHERE case_id = ?1 AND user_id = ?2
            "#,
            params![
                record.id,
                record.user_id,
                date_to_string(&d.date),
                d.location,
                d.is_emergency,
                d.patient_id,
                d.age,
                d.sex.as_str(),
                d.asa_grade.as_str(),
                comorbidities_json,
                d.specialty,
                d.surgery_type,
                d.patient_position.as_str(),
                d.anesthesia_technique,
                d.has_adjuvants,
                d.adjuvant_details,
                block_json,
                d.duration,
                d.hemodynamic_status.as_str(),
                d.has_airway_difficulty,
                complications_json,
                d.post_op_analgesia.as_str(),
                d.rescue_analgesia_required,
                d.notes,
                timestamp_to_string(&record.updated_at),
            ],
        )?;

        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("case {}", case_id)));
        }

        tracing::info!(case_id = %record.id, regional = d.is_regional(), "Case updated");
        Ok(record)
    }
}

/// Intermediate row struct for database mapping.
struct CaseRow {
    case_id: String,
    user_id: String,
    surgery_date: String,
    location: Option<String>,
    is_emergency: bool,
    patient_id: String,
    age: u8,
    sex: String,
    asa_grade: String,
    comorbidities: String,
    specialty: String,
    surgery_type: String,
    patient_position: String,
    anesthesia_technique: String,
    has_adjuvants: bool,
    adjuvant_details: Option<String>,
    block_details: Option<String>,
    duration: u32,
    hemodynamic_status: String,
    has_airway_difficulty: bool,
    complications: String,
    post_op_analgesia: String,
    rescue_analgesia_required: bool,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl CaseRow {
    /// Column order follows `SELECT_CASE`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            case_id: row.get(0)?,
            user_id: row.get(1)?,
            surgery_date: row.get(2)?,
            location: row.get(3)?,
            is_emergency: row.get(4)?,
            patient_id: row.get(5)?,
            age: row.get(6)?,
            sex: row.get(7)?,
            asa_grade: row.get(8)?,
            comorbidities: row.get(9)?,
            specialty: row.get(10)?,
            surgery_type: row.get(11)?,
            patient_position: row.get(12)?,
            anesthesia_technique: row.get(13)?,
            has_adjuvants: row.get(14)?,
            adjuvant_details: row.get(15)?,
            block_details: row.get(16)?,
            duration: row.get(17)?,
            hemodynamic_status: row.get(18)?,
            has_airway_difficulty: row.get(19)?,
            complications: row.get(20)?,
            post_op_analgesia: row.get(21)?,
            rescue_analgesia_required: row.get(22)?,
            notes: row.get(23)?,
            created_at: row.get(24)?,
            updated_at: row.get(25)?,
        })
    }
}

impl TryFrom<CaseRow> for CaseRecord {
    type Error = DbError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        let comorbidities: Vec<String> = serde_json::from_str(&row.comorbidities)?;
        let complications: Vec<String> = serde_json::from_str(&row.complications)?;
        let block_details: Option<BlockDetails> = row
            .block_details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        let details = CaseDetails {
            date: string_to_date(&row.surgery_date)?,
            location: row.location,
            is_emergency: row.is_emergency,
            patient_id: row.patient_id,
            age: row.age,
            sex: column_vocab("sex", &row.sex, Sex::parse)?,
            asa_grade: column_vocab("asa_grade", &row.asa_grade, AsaGrade::parse)?,
            comorbidities,
            specialty: row.specialty,
            surgery_type: row.surgery_type,
            patient_position: column_vocab(
                "patient_position",
                &row.patient_position,
                PatientPosition::parse,
            )?,
            anesthesia_technique: row.anesthesia_technique,
            has_adjuvants: row.has_adjuvants,
            adjuvant_details: row.adjuvant_details,
            block_details,
            duration: row.duration,
            hemodynamic_status: column_vocab(
                "hemodynamic_status",
                &row.hemodynamic_status,
                HemodynamicStatus::parse,
            )?,
            has_airway_difficulty: row.has_airway_difficulty,
            complications,
            post_op_analgesia: column_vocab(
                "post_op_analgesia",
                &row.post_op_analgesia,
                PostOpAnalgesia::parse,
            )?,
            rescue_analgesia_required: row.rescue_analgesia_required,
            notes: row.notes,
        };

        Ok(CaseRecord {
            id: row.case_id,
            user_id: row.user_id,
            details,
            created_at: string_to_timestamp(&row.created_at)?,
            updated_at: string_to_timestamp(&row.updated_at)?,
        })
    }
}

fn date_to_string(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn string_to_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| DbError::Constraint(format!("Invalid surgery date: {}", s)))
}

/// Fixed-width UTC form so that text ordering matches time ordering.
fn timestamp_to_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn string_to_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DbError::Constraint(format!("Invalid timestamp: {}", s)))
}

fn column_vocab<T>(column: &str, s: &str, parse: fn(&str) -> Option<T>) -> Result<T, DbError> {
    parse(s).ok_or_else(|| DbError::Constraint(format!("Unknown {} value: {}", column, s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{ga_case, spinal_case};
    use crate::models::BlockSide;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_get_case() {
        let db = setup_db();
        let created = db.create_case("user-1", ga_case()).unwrap();

        let retrieved = db.get_case("user-1", &created.id).unwrap().unwrap();
        assert_eq!(retrieved, created);
        assert_eq!(retrieved.details.comorbidities, vec!["HTN"]);
        assert!(retrieved.details.block_details.is_none());
    }

    #[test]
    fn test_block_details_round_trip() {
        let db = setup_db();
        let created = db.create_case("user-1", spinal_case()).unwrap();

        let retrieved = db.get_case("user-1", &created.id).unwrap().unwrap();
        let block = retrieved.details.block_details.unwrap();
        assert_eq!(block.block_type, "Subarachnoid");
        assert_eq!(block.side, BlockSide::Bilateral);
    }

    #[test]
    fn test_absent_block_stored_as_null() {
        let db = setup_db();
        let created = db.create_case("user-1", ga_case()).unwrap();

        let is_null: bool = db
            .conn()
            .query_row(
                "SELECT block_details IS NULL FROM case_logs WHERE case_id = ?",
                [&created.id],
                |row| row.get(0),
            )
            .unwrap();
        assert!(is_null);
    }

    #[test]
    fn test_cases_scoped_by_user() {
        let db = setup_db();
        let created = db.create_case("user-1", ga_case()).unwrap();

        assert!(db.get_case("user-2", &created.id).unwrap().is_none());
        assert!(db.list_cases("user-2").unwrap().is_empty());
    }

    #[test]
    fn test_list_newest_first() {
        let db = setup_db();
        let first = db.create_case("user-1", ga_case()).unwrap();
        let second = db.create_case("user-1", spinal_case()).unwrap();

        let cases = db.list_cases("user-1").unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id, second.id);
        assert_eq!(cases[1].id, first.id);
    }

    #[test]
    fn test_update_replaces_block() {
        let db = setup_db();
        let created = db.create_case("user-1", spinal_case()).unwrap();

        let mut edited = spinal_case();
        edited.anesthesia_technique = "GA".into();
        edited.block_details = None;
        edited.notes = None;

        let updated = db.update_case("user-1", &created.id, edited).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);

        let retrieved = db.get_case("user-1", &created.id).unwrap().unwrap();
        assert_eq!(retrieved.details.anesthesia_technique, "GA");
        assert!(retrieved.details.block_details.is_none());
        assert_eq!(retrieved.created_at, created.created_at);
    }

    #[test]
    fn test_update_clears_optional_text() {
        let db = setup_db();
        let mut details = ga_case();
        details.notes = Some("Difficult IV access".into());
        let created = db.create_case("user-1", details).unwrap();

        let updated = db.update_case("user-1", &created.id, ga_case()).unwrap();
        assert!(updated.details.notes.is_none());

        let retrieved = db.get_case("user-1", &created.id).unwrap().unwrap();
        assert!(retrieved.details.notes.is_none());
    }

    #[test]
    fn test_update_missing_case() {
        let db = setup_db();
        let result = db.update_case("user-1", "no-such-case", ga_case());
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_vocabulary_value() {
        let db = setup_db();
        let created = db.create_case("user-1", ga_case()).unwrap();
        db.conn()
            .execute(
                "UPDATE case_logs SET sex = 'Unknown' WHERE case_id = ?",
                [&created.id],
            )
            .unwrap();

        let result = db.get_case("user-1", &created.id);
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }
}
