//! Case form state: defaults, advisory requests and submission.

use chrono::{Local, NaiveDate};
use thiserror::Error;

use super::advisor::{AdvisoryError, Advisor};
use super::suggestions::{base_suggestions, merge_suggestions};
use crate::db::{CaseStore, DbError};
use crate::models::{
    is_regional_technique, AsaGrade, BlockSide, CaseCandidate, CaseRecord, HemodynamicStatus,
    PatientPosition, PostOpAnalgesia, Sex, UserPreferences,
};
use crate::stats::case_history_for;
use crate::validation::{collect_errors, validate, ValidationError};

/// Submission errors.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("You must be signed in to save a case log")]
    NotAuthenticated,

    #[error("{} field(s) failed validation", .0.len())]
    Invalid(Vec<ValidationError>),

    #[error("Failed to save case log")]
    SaveFailed(#[source] DbError),
}

/// Whether the form creates a new case or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { case_id: String },
}

/// Identifies one suggestion request. Only the latest is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionTicket(u64);

/// Identifies one alert request. Only the latest is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTicket(u64);

/// A suggestion request for the host to run against an [`Advisor`].
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub ticket: SuggestionTicket,
    pub specialty: String,
    pub case_history: Vec<String>,
}

/// An alert request for the host to run against an [`Advisor`].
#[derive(Debug, Clone)]
pub struct AlertRequest {
    pub ticket: AlertTicket,
    pub asa_grade: AsaGrade,
    pub technique: String,
}

/// State behind the case form.
///
/// Advisory calls are not made here. Changing specialty, ASA grade or
/// technique hands back a request; the host runs it wherever it likes and
/// feeds the result to [`apply_suggestions`](Self::apply_suggestions) or
/// [`apply_alert`](Self::apply_alert). Results for superseded requests are
/// dropped.
#[derive(Debug, Clone)]
pub struct FormController {
    mode: FormMode,
    candidate: CaseCandidate,
    field_errors: Vec<ValidationError>,
    suggestions: Vec<String>,
    alert: Option<String>,
    suggestion_generation: u64,
    alert_generation: u64,
}

impl FormController {
    /// Blank form dated today (local time).
    pub fn new_case(prefs: &UserPreferences) -> Self {
        Self::new_case_on(prefs, Local::now().date_naive())
    }

    /// Blank form with an explicit surgery date.
    pub fn new_case_on(prefs: &UserPreferences, today: NaiveDate) -> Self {
        let technique = prefs.initial_technique().to_string();
        let mut candidate = CaseCandidate {
            date: today.format("%Y-%m-%d").to_string(),
            sex: Sex::Male.as_str().into(),
            asa_grade: AsaGrade::I.as_str().into(),
            patient_position: PatientPosition::Supine.as_str().into(),
            anesthesia_technique: technique,
            hemodynamic_status: HemodynamicStatus::Stable.as_str().into(),
            post_op_analgesia: PostOpAnalgesia::Adequate.as_str().into(),
            ..Default::default()
        };
        prefill_block_side(&mut candidate);

        Self::with_candidate(FormMode::Create, candidate, Vec::new())
    }

    /// Form seeded from an existing record, block fields included.
    pub fn edit_case(record: &CaseRecord) -> Self {
        let candidate = CaseCandidate::from(&record.details);
        let suggestions = base_suggestions(&record.details.specialty);
        Self::with_candidate(
            FormMode::Edit {
                case_id: record.id.clone(),
            },
            candidate,
            suggestions,
        )
    }

    /// Form holding a candidate bound elsewhere (e.g. by a host UI).
    pub fn from_candidate(mode: FormMode, candidate: CaseCandidate) -> Self {
        let suggestions = base_suggestions(&candidate.specialty);
        Self::with_candidate(mode, candidate, suggestions)
    }

    fn with_candidate(mode: FormMode, candidate: CaseCandidate, suggestions: Vec<String>) -> Self {
        Self {
            mode,
            candidate,
            field_errors: Vec::new(),
            suggestions,
            alert: None,
            suggestion_generation: 0,
            alert_generation: 0,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn candidate(&self) -> &CaseCandidate {
        &self.candidate
    }

    /// Direct access for fields without advisory side effects.
    ///
    /// Specialty, ASA grade and technique should go through their setters so
    /// that advisory requests are issued.
    pub fn candidate_mut(&mut self) -> &mut CaseCandidate {
        &mut self.candidate
    }

    pub fn field_errors(&self) -> &[ValidationError] {
        &self.field_errors
    }

    /// Error for one field, if any.
    pub fn field_error(&self, field: &str) -> Option<&ValidationError> {
        self.field_errors.iter().find(|e| e.field == field)
    }

    /// Current surgery suggestions.
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Current clinical alert.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Change specialty. The static list is shown at once; the returned
    /// request fetches advised additions.
    pub fn set_specialty(&mut self, specialty: &str, history: &[CaseRecord]) -> SuggestionRequest {
        self.candidate.specialty = specialty.to_string();
        self.suggestions = base_suggestions(specialty);
        self.request_suggestions(history)
    }

    /// Change ASA grade (as its label, e.g. "III").
    pub fn set_asa_grade(&mut self, asa_grade: &str) -> Option<AlertRequest> {
        self.candidate.asa_grade = asa_grade.to_string();
        self.request_alert()
    }

    /// Change technique, prefilling block defaults when it becomes regional.
    pub fn set_technique(&mut self, technique: &str) -> Option<AlertRequest> {
        self.candidate.anesthesia_technique = technique.to_string();
        prefill_block_side(&mut self.candidate);
        self.request_alert()
    }

    /// Issue a suggestion request for the current specialty.
    pub fn request_suggestions(&mut self, history: &[CaseRecord]) -> SuggestionRequest {
        self.suggestion_generation += 1;
        SuggestionRequest {
            ticket: SuggestionTicket(self.suggestion_generation),
            specialty: self.candidate.specialty.trim().to_string(),
            case_history: case_history_for(history, &self.candidate.specialty),
        }
    }

    /// Issue an alert request for the current grade and technique.
    ///
    /// Returns `None` (and clears the alert) while either field is unusable.
    pub fn request_alert(&mut self) -> Option<AlertRequest> {
        self.alert_generation += 1;
        self.alert = None;

        let asa_grade = AsaGrade::parse(&self.candidate.asa_grade)?;
        let technique = self.candidate.anesthesia_technique.trim();
        if technique.is_empty() {
            return None;
        }
        Some(AlertRequest {
            ticket: AlertTicket(self.alert_generation),
            asa_grade,
            technique: technique.to_string(),
        })
    }

    /// Apply a suggestion response. Returns false if the ticket was stale.
    ///
    /// A failed request leaves the static list in place.
    pub fn apply_suggestions(
        &mut self,
        ticket: SuggestionTicket,
        result: Result<Vec<String>, AdvisoryError>,
    ) -> bool {
        if ticket.0 != self.suggestion_generation {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.suggestion_generation,
                "Discarding stale suggestions"
            );
            return false;
        }

        let base = base_suggestions(&self.candidate.specialty);
        self.suggestions = match result {
            Ok(advised) => merge_suggestions(&base, &advised),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    specialty = %self.candidate.specialty,
                    "Surgery suggestions unavailable"
                );
                base
            }
        };
        true
    }

    /// Apply an alert response. Returns false if the ticket was stale.
    ///
    /// A failed request shows no alert.
    pub fn apply_alert(
        &mut self,
        ticket: AlertTicket,
        result: Result<Option<String>, AdvisoryError>,
    ) -> bool {
        if ticket.0 != self.alert_generation {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.alert_generation,
                "Discarding stale alert"
            );
            return false;
        }

        self.alert = match result {
            Ok(alert) => alert.filter(|a| !a.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Clinical alert unavailable");
                None
            }
        };
        true
    }

    /// Run a suggestion request synchronously and apply its result.
    pub fn run_suggestions<A: Advisor + ?Sized>(
        &mut self,
        advisor: &A,
        request: SuggestionRequest,
    ) -> bool {
        let result = advisor.suggest_surgeries(&request.specialty, &request.case_history);
        self.apply_suggestions(request.ticket, result)
    }

    /// Run an alert request synchronously and apply its result.
    pub fn run_alert<A: Advisor + ?Sized>(&mut self, advisor: &A, request: AlertRequest) -> bool {
        let result = advisor.clinical_alert(request.asa_grade, &request.technique);
        self.apply_alert(request.ticket, result)
    }

    /// Re-check every field, keeping the errors for inline display.
    pub fn check(&mut self) -> bool {
        self.field_errors = collect_errors(&self.candidate);
        self.field_errors.is_empty()
    }

    /// Validate and persist the form.
    ///
    /// Nothing is written when validation fails. On success the preferred
    /// technique is updated and a created case switches the form to edit mode.
    pub fn submit<S: CaseStore + ?Sized>(
        &mut self,
        store: &S,
        user_id: &str,
        prefs: &mut UserPreferences,
    ) -> Result<CaseRecord, SubmitError> {
        if user_id.trim().is_empty() {
            return Err(SubmitError::NotAuthenticated);
        }

        let details = match validate(&self.candidate) {
            Ok(details) => details,
            Err(_) => {
                self.field_errors = collect_errors(&self.candidate);
                return Err(SubmitError::Invalid(self.field_errors.clone()));
            }
        };
        self.field_errors.clear();

        let technique = details.anesthesia_technique.clone();
        let saved = match &self.mode {
            FormMode::Create => store.create_case(user_id, details),
            FormMode::Edit { case_id } => store.update_case(user_id, case_id, details),
        };
        let record = saved.map_err(|e| {
            tracing::error!(error = %e, mode = ?self.mode, "Case save failed");
            SubmitError::SaveFailed(e)
        })?;

        prefs.record_technique(&technique);
        self.mode = FormMode::Edit {
            case_id: record.id.clone(),
        };
        Ok(record)
    }
}

/// Default the block side for regional techniques when none was chosen.
fn prefill_block_side(candidate: &mut CaseCandidate) {
    if is_regional_technique(&candidate.anesthesia_technique) && candidate.block.side.is_none() {
        candidate.block.side = Some(BlockSide::Left.as_str().to_string());
    }
}
