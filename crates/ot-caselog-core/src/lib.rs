//! OT Case Log Core Library
//!
//! Local-first anesthesia case logging for operating-theatre clinicians.
//!
//! # Architecture
//!
//! ```text
//!   Case form ──► FormController ──► validate ──► CaseDetails ──► CaseStore (SQLite)
//!       │               │                                              │
//!       │        advisory requests                                     ▼
//!       │         (tickets; stale                        ┌─────────────┴─────────────┐
//!       │          results dropped)                      │             │             │
//!       ▼               ▼                                ▼             ▼             ▼
//!   UserPreferences   Advisor                        Dashboard     Case table     Export
//!                  (ot-caselog-llm)                    stats         filter     CSV / PDF / JSON
//! ```
//!
//! # Core Principle
//!
//! **Block details are derived, never stored independently.** Regional
//! techniques always carry a block record; every other technique never does,
//! whatever the form held.
//!
//! # Modules
//!
//! - [`models`]: Domain types (CaseRecord, CaseCandidate, vocabularies)
//! - [`validation`]: Candidate → CaseDetails, with field-scoped errors
//! - [`stats`]: Dashboard statistics and record selections
//! - [`filter`]: Case table filtering
//! - [`form`]: Form controller and the advisory seam
//! - [`db`]: SQLite persistence
//! - [`export`]: CSV, PDF and JSON export

pub mod config;
pub mod db;
pub mod export;
pub mod filter;
pub mod form;
pub mod models;
pub mod stats;
pub mod validation;

// Re-export commonly used types
pub use db::{CaseStore, Database};
pub use filter::CaseFilter;
pub use form::{Advisor, AdvisoryError, FormController, FormMode};
pub use models::{
    AsaGrade, BlockDetails, BlockInput, CaseCandidate, CaseDetails, CaseRecord, UserPreferences,
};
pub use stats::DashboardStats;
pub use validation::{validate, ValidationError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

use export::{CaseLogExport, ExportFormat};
use form::SubmitError;
use models::{
    BlockSide, HemodynamicStatus, PatientPosition, PostOpAnalgesia, Sex, ANESTHESIA_TECHNIQUES,
    COMORBIDITY_OPTIONS, COMPLICATION_OPTIONS, REGIONAL_TECHNIQUES, SURGICAL_SPECIALTIES,
};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CaseLogError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("{0}")]
    SaveFailed(String),

    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for CaseLogError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => CaseLogError::NotFound(what),
            other => CaseLogError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CaseLogError {
    fn from(e: serde_json::Error) -> Self {
        CaseLogError::SerializationError(e.to_string())
    }
}

impl From<export::ExportError> for CaseLogError {
    fn from(e: export::ExportError) -> Self {
        CaseLogError::ExportError(e.to_string())
    }
}

impl From<SubmitError> for CaseLogError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::NotAuthenticated => CaseLogError::NotAuthenticated(e.to_string()),
            SubmitError::Invalid(errors) => CaseLogError::ValidationFailed(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            SubmitError::SaveFailed(_) => CaseLogError::SaveFailed(e.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for CaseLogError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CaseLogError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the tracing subscriber. `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls are ignored.
#[uniffi::export]
pub fn init_logging() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<OtCaseLogCore>, CaseLogError> {
    let db = Database::open(&path)?;
    tracing::info!(path = %path, "Case log database opened");
    Ok(Arc::new(OtCaseLogCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<OtCaseLogCore>, CaseLogError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(OtCaseLogCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Reference vocabularies for pickers.
#[uniffi::export]
pub fn reference_vocabulary() -> FfiVocabulary {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    FfiVocabulary {
        sexes: owned(&Sex::labels()[..]),
        asa_grades: owned(&AsaGrade::labels()[..]),
        patient_positions: owned(&PatientPosition::labels()[..]),
        block_sides: owned(&BlockSide::labels()[..]),
        hemodynamic_statuses: owned(&HemodynamicStatus::labels()[..]),
        post_op_analgesia: owned(&PostOpAnalgesia::labels()[..]),
        anesthesia_techniques: owned(ANESTHESIA_TECHNIQUES),
        regional_techniques: owned(REGIONAL_TECHNIQUES),
        surgical_specialties: owned(SURGICAL_SPECIALTIES),
        comorbidity_options: owned(COMORBIDITY_OPTIONS),
        complication_options: owned(COMPLICATION_OPTIONS),
    }
}

/// Static surgery suggestions for a specialty.
#[uniffi::export]
pub fn reference_suggestions(specialty: String) -> Vec<String> {
    form::base_suggestions(&specialty)
}

/// Static suggestions merged with advised ones, near-duplicates removed.
#[uniffi::export]
pub fn merge_surgery_suggestions(specialty: String, advised: Vec<String>) -> Vec<String> {
    form::merge_suggestions(&form::base_suggestions(&specialty), &advised)
}

/// Validate a candidate without saving. Empty when valid.
#[uniffi::export]
pub fn validate_case(candidate: FfiCaseCandidate) -> Vec<FfiFieldError> {
    validation::collect_errors(&candidate.into())
        .into_iter()
        .map(FfiFieldError::from)
        .collect()
}

/// File name for an export made today.
#[uniffi::export]
pub fn export_file_name(format: FfiExportFormat) -> String {
    export::export_file_name(chrono::Local::now().date_naive(), format.into())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct OtCaseLogCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl OtCaseLogCore {
    // =========================================================================
    // Form Operations
    // =========================================================================

    /// Candidate for a new case, with the user's preferred technique.
    pub fn new_case_defaults(&self, user_id: String) -> Result<FfiCaseCandidate, CaseLogError> {
        let db = self.db.lock()?;
        let prefs = db.get_preferences(&user_id)?;
        let form = FormController::new_case(&prefs);
        Ok(form.candidate().clone().into())
    }

    /// Candidate seeded from an existing case, for editing.
    pub fn edit_case_candidate(
        &self,
        user_id: String,
        case_id: String,
    ) -> Result<FfiCaseCandidate, CaseLogError> {
        let db = self.db.lock()?;
        let record = db
            .get_case(&user_id, &case_id)?
            .ok_or_else(|| CaseLogError::NotFound(format!("case {}", case_id)))?;
        let form = FormController::edit_case(&record);
        Ok(form.candidate().clone().into())
    }

    /// Surgery types the user previously logged under a specialty.
    pub fn case_history(
        &self,
        user_id: String,
        specialty: String,
    ) -> Result<Vec<String>, CaseLogError> {
        let db = self.db.lock()?;
        let records = db.list_cases(&user_id)?;
        Ok(stats::case_history_for(&records, &specialty))
    }

    // =========================================================================
    // Case Operations
    // =========================================================================

    /// Validate and save a new case.
    pub fn create_case(
        &self,
        user_id: String,
        candidate: FfiCaseCandidate,
    ) -> Result<FfiCaseRecord, CaseLogError> {
        self.submit(user_id, FormMode::Create, candidate)
    }

    /// Validate and replace an existing case.
    pub fn update_case(
        &self,
        user_id: String,
        case_id: String,
        candidate: FfiCaseCandidate,
    ) -> Result<FfiCaseRecord, CaseLogError> {
        self.submit(user_id, FormMode::Edit { case_id }, candidate)
    }

    /// Get a case by ID.
    pub fn get_case(
        &self,
        user_id: String,
        case_id: String,
    ) -> Result<Option<FfiCaseRecord>, CaseLogError> {
        let db = self.db.lock()?;
        let record = db.get_case(&user_id, &case_id)?;
        Ok(record.map(|r| r.into()))
    }

    /// All cases, newest first.
    pub fn list_cases(&self, user_id: String) -> Result<Vec<FfiCaseRecord>, CaseLogError> {
        let db = self.db.lock()?;
        let records = db.list_cases(&user_id)?;
        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    /// Cases matching a filter, newest first.
    pub fn filter_cases(
        &self,
        user_id: String,
        filter: FfiCaseFilter,
    ) -> Result<Vec<FfiCaseRecord>, CaseLogError> {
        let filter = CaseFilter::try_from(filter)?;
        let db = self.db.lock()?;
        let records = db.list_cases(&user_id)?;
        Ok(filter
            .apply(&records)
            .into_iter()
            .map(|r| r.clone().into())
            .collect())
    }

    /// Distinct surgery types, for the filter drop-down.
    pub fn unique_surgery_types(&self, user_id: String) -> Result<Vec<String>, CaseLogError> {
        let db = self.db.lock()?;
        let records = db.list_cases(&user_id)?;
        Ok(filter::unique_surgery_types(&records))
    }

    // =========================================================================
    // Dashboard Operations
    // =========================================================================

    /// Dashboard statistics against the local clock.
    pub fn dashboard_stats(&self, user_id: String) -> Result<FfiDashboardStats, CaseLogError> {
        let db = self.db.lock()?;
        let records = db.list_cases(&user_id)?;
        Ok(DashboardStats::compute_now(&records).into())
    }

    /// Most recently created cases.
    pub fn recent_cases(&self, user_id: String) -> Result<Vec<FfiCaseRecord>, CaseLogError> {
        let db = self.db.lock()?;
        let records = db.list_cases(&user_id)?;
        Ok(stats::recent_cases(&records, config::RECENT_CASES_LIMIT)
            .into_iter()
            .map(|r| r.clone().into())
            .collect())
    }

    /// Cases operated in a calendar month, as JSON (monthly summary input).
    pub fn month_cases_json(
        &self,
        user_id: String,
        year: i32,
        month: u32,
    ) -> Result<String, CaseLogError> {
        if !(1..=12).contains(&month) {
            return Err(CaseLogError::InvalidInput(format!("month {}", month)));
        }
        let db = self.db.lock()?;
        let records = db.list_cases(&user_id)?;
        let selected = stats::cases_in_month(&records, year, month);
        Ok(serde_json::to_string(&selected)?)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export all cases in the requested format.
    pub fn export_cases(
        &self,
        user_id: String,
        format: FfiExportFormat,
    ) -> Result<Vec<u8>, CaseLogError> {
        let db = self.db.lock()?;
        let records = db.list_cases(&user_id)?;
        let export = CaseLogExport::new(&records);
        Ok(export.render(format.into())?)
    }

    /// Export all cases as CSV text.
    pub fn export_csv(&self, user_id: String) -> Result<String, CaseLogError> {
        let db = self.db.lock()?;
        let records = db.list_cases(&user_id)?;
        Ok(CaseLogExport::new(&records).to_csv())
    }
}

impl OtCaseLogCore {
    fn submit(
        &self,
        user_id: String,
        mode: FormMode,
        candidate: FfiCaseCandidate,
    ) -> Result<FfiCaseRecord, CaseLogError> {
        let db = self.db.lock()?;
        let mut prefs = db.get_preferences(&user_id)?;
        let mut form = FormController::from_candidate(mode, candidate.into());
        let record = form.submit(&*db, &user_id, &mut prefs)?;

        // The case is saved; a lost preference is not worth failing for
        if let Err(e) = db.save_preferences(&user_id, &prefs) {
            tracing::warn!(error = %e, "Could not store technique preference");
        }
        Ok(record.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe field error.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldError {
    pub field: String,
    pub message: String,
}

impl From<ValidationError> for FfiFieldError {
    fn from(e: ValidationError) -> Self {
        Self {
            field: e.field.to_string(),
            message: e.rule.to_string(),
        }
    }
}

/// FFI-safe block input.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiBlockInput {
    pub block_type: Option<String>,
    pub level: Option<String>,
    pub side: Option<String>,
    pub is_ultrasound_guided: Option<bool>,
    pub local_anesthetic: Option<String>,
}

/// FFI-safe case candidate (form contents).
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCaseCandidate {
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
    pub block: FfiBlockInput,
    pub duration: Option<i64>,
    pub hemodynamic_status: String,
    pub has_airway_difficulty: bool,
    pub complications: Vec<String>,
    pub post_op_analgesia: String,
    pub rescue_analgesia_required: bool,
    pub notes: Option<String>,
}

impl From<FfiCaseCandidate> for CaseCandidate {
    fn from(c: FfiCaseCandidate) -> Self {
        CaseCandidate {
            date: c.date,
            location: c.location,
            is_emergency: c.is_emergency,
            patient_id: c.patient_id,
            age: c.age,
            sex: c.sex,
            asa_grade: c.asa_grade,
            comorbidities: c.comorbidities,
            specialty: c.specialty,
            surgery_type: c.surgery_type,
            patient_position: c.patient_position,
            anesthesia_technique: c.anesthesia_technique,
            has_adjuvants: c.has_adjuvants,
            adjuvant_details: c.adjuvant_details,
            block: BlockInput {
                block_type: c.block.block_type,
                level: c.block.level,
                side: c.block.side,
                is_ultrasound_guided: c.block.is_ultrasound_guided,
                local_anesthetic: c.block.local_anesthetic,
            },
            duration: c.duration,
            hemodynamic_status: c.hemodynamic_status,
            has_airway_difficulty: c.has_airway_difficulty,
            complications: c.complications,
            post_op_analgesia: c.post_op_analgesia,
            rescue_analgesia_required: c.rescue_analgesia_required,
            notes: c.notes,
        }
    }
}

impl From<CaseCandidate> for FfiCaseCandidate {
    fn from(c: CaseCandidate) -> Self {
        Self {
            date: c.date,
            location: c.location,
            is_emergency: c.is_emergency,
            patient_id: c.patient_id,
            age: c.age,
            sex: c.sex,
            asa_grade: c.asa_grade,
            comorbidities: c.comorbidities,
            specialty: c.specialty,
            surgery_type: c.surgery_type,
            patient_position: c.patient_position,
            anesthesia_technique: c.anesthesia_technique,
            has_adjuvants: c.has_adjuvants,
            adjuvant_details: c.adjuvant_details,
            block: FfiBlockInput {
                block_type: c.block.block_type,
                level: c.block.level,
                side: c.block.side,
                is_ultrasound_guided: c.block.is_ultrasound_guided,
                local_anesthetic: c.block.local_anesthetic,
            },
            duration: c.duration,
            hemodynamic_status: c.hemodynamic_status,
            has_airway_difficulty: c.has_airway_difficulty,
            complications: c.complications,
            post_op_analgesia: c.post_op_analgesia,
            rescue_analgesia_required: c.rescue_analgesia_required,
            notes: c.notes,
        }
    }
}

/// FFI-safe block details.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBlockDetails {
    pub block_type: String,
    pub level: String,
    pub side: String,
    pub is_ultrasound_guided: bool,
    pub local_anesthetic: String,
}

impl From<BlockDetails> for FfiBlockDetails {
    fn from(b: BlockDetails) -> Self {
        Self {
            block_type: b.block_type,
            level: b.level,
            side: b.side.as_str().to_string(),
            is_ultrasound_guided: b.is_ultrasound_guided,
            local_anesthetic: b.local_anesthetic,
        }
    }
}

/// FFI-safe stored case.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCaseRecord {
    pub id: String,
    pub user_id: String,
    /// YYYY-MM-DD
    pub date: String,
    pub location: Option<String>,
    pub is_emergency: bool,
    pub patient_id: String,
    pub age: u8,
    pub sex: String,
    pub asa_grade: String,
    pub comorbidities: Vec<String>,
    pub specialty: String,
    pub surgery_type: String,
    pub patient_position: String,
    pub anesthesia_technique: String,
    pub has_adjuvants: bool,
    pub adjuvant_details: Option<String>,
    pub block_details: Option<FfiBlockDetails>,
    pub duration: u32,
    pub hemodynamic_status: String,
    pub has_airway_difficulty: bool,
    pub complications: Vec<String>,
    pub post_op_analgesia: String,
    pub rescue_analgesia_required: bool,
    pub notes: Option<String>,
    /// RFC 3339
    pub created_at: String,
    pub updated_at: String,
}

impl From<CaseRecord> for FfiCaseRecord {
    fn from(record: CaseRecord) -> Self {
        let d = record.details;
        Self {
            id: record.id,
            user_id: record.user_id,
            date: d.date.format("%Y-%m-%d").to_string(),
            location: d.location,
            is_emergency: d.is_emergency,
            patient_id: d.patient_id,
            age: d.age,
            sex: d.sex.as_str().to_string(),
            asa_grade: d.asa_grade.as_str().to_string(),
            comorbidities: d.comorbidities,
            specialty: d.specialty,
            surgery_type: d.surgery_type,
            patient_position: d.patient_position.as_str().to_string(),
            anesthesia_technique: d.anesthesia_technique,
            has_adjuvants: d.has_adjuvants,
            adjuvant_details: d.adjuvant_details,
            block_details: d.block_details.map(|b| b.into()),
            duration: d.duration,
            hemodynamic_status: d.hemodynamic_status.as_str().to_string(),
            has_airway_difficulty: d.has_airway_difficulty,
            complications: d.complications,
            post_op_analgesia: d.post_op_analgesia.as_str().to_string(),
            rescue_analgesia_required: d.rescue_analgesia_required,
            notes: d.notes,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// FFI-safe case filter. Dates are YYYY-MM-DD.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiCaseFilter {
    pub surgery: Option<String>,
    pub asa_grade: Option<String>,
    pub technique: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl TryFrom<FfiCaseFilter> for CaseFilter {
    type Error = CaseLogError;

    fn try_from(f: FfiCaseFilter) -> Result<Self, Self::Error> {
        let non_blank = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        let parse_date = |field: &str, s: Option<String>| {
            non_blank(s)
                .map(|v| {
                    NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                        .map_err(|_| CaseLogError::InvalidInput(format!("{}: {}", field, v)))
                })
                .transpose()
        };

        let asa_grade = non_blank(f.asa_grade)
            .map(|v| {
                AsaGrade::parse(&v)
                    .ok_or_else(|| CaseLogError::InvalidInput(format!("asaGrade: {}", v)))
            })
            .transpose()?;

        Ok(CaseFilter {
            surgery: non_blank(f.surgery),
            asa_grade,
            technique: non_blank(f.technique),
            date_from: parse_date("dateFrom", f.date_from)?,
            date_to: parse_date("dateTo", f.date_to)?,
        })
    }
}

/// FFI-safe chart entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDistributionEntry {
    pub name: String,
    pub value: u32,
}

/// FFI-safe dashboard statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDashboardStats {
    pub total_cases: u32,
    pub monthly_case_count: u32,
    pub most_common_asa_grade: String,
    pub most_common_technique: String,
    pub asa_grade_distribution: Vec<FfiDistributionEntry>,
    pub technique_distribution: Vec<FfiDistributionEntry>,
}

impl From<DashboardStats> for FfiDashboardStats {
    fn from(dashboard: DashboardStats) -> Self {
        let entries = |v: Vec<stats::DistributionEntry>| {
            v.into_iter()
                .map(|e| FfiDistributionEntry {
                    name: e.name,
                    value: e.value,
                })
                .collect()
        };
        Self {
            total_cases: dashboard.total_cases,
            monthly_case_count: dashboard.monthly_case_count,
            most_common_asa_grade: dashboard.most_common_asa_grade,
            most_common_technique: dashboard.most_common_technique,
            asa_grade_distribution: entries(dashboard.asa_grade_distribution),
            technique_distribution: entries(dashboard.technique_distribution),
        }
    }
}

/// FFI-safe export format.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiExportFormat {
    Csv,
    Pdf,
    Json,
}

impl From<FfiExportFormat> for ExportFormat {
    fn from(format: FfiExportFormat) -> Self {
        match format {
            FfiExportFormat::Csv => ExportFormat::Csv,
            FfiExportFormat::Pdf => ExportFormat::Pdf,
            FfiExportFormat::Json => ExportFormat::Json,
        }
    }
}

/// Reference vocabularies for pickers.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVocabulary {
    pub sexes: Vec<String>,
    pub asa_grades: Vec<String>,
    pub patient_positions: Vec<String>,
    pub block_sides: Vec<String>,
    pub hemodynamic_statuses: Vec<String>,
    pub post_op_analgesia: Vec<String>,
    pub anesthesia_techniques: Vec<String>,
    pub regional_techniques: Vec<String>,
    pub surgical_specialties: Vec<String>,
    pub comorbidity_options: Vec<String>,
    pub complication_options: Vec<String>,
}
