//! Advisory seam: surgery suggestions and clinical alerts.

use thiserror::Error;

use crate::models::AsaGrade;

/// Advisory failures. Never fatal to the form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdvisoryError {
    #[error("Advisory service unavailable: {0}")]
    Unavailable(String),

    #[error("Advisory request timed out")]
    Timeout,

    #[error("Malformed advisory response: {0}")]
    Malformed(String),
}

/// Source of best-effort advice for the case form.
pub trait Advisor {
    /// Suggest surgery names for a specialty, given surgery types the user
    /// previously logged under it. Empty inputs still yield generic suggestions.
    fn suggest_surgeries(
        &self,
        specialty: &str,
        case_history: &[String],
    ) -> Result<Vec<String>, AdvisoryError>;

    /// A short advisory for the ASA grade and technique, or `None` when the
    /// combination warrants no comment.
    fn clinical_alert(
        &self,
        asa_grade: AsaGrade,
        technique: &str,
    ) -> Result<Option<String>, AdvisoryError>;
}

/// Advisor for offline use: no suggestions beyond the static list, no alerts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdvisor;

impl Advisor for NoAdvisor {
    fn suggest_surgeries(&self, _: &str, _: &[String]) -> Result<Vec<String>, AdvisoryError> {
        Ok(Vec::new())
    }

    fn clinical_alert(&self, _: AsaGrade, _: &str) -> Result<Option<String>, AdvisoryError> {
        Ok(None)
    }
}

/// Mock advisor with canned responses (for testing).
#[derive(Debug, Clone)]
pub struct MockAdvisor {
    pub suggestions: Result<Vec<String>, AdvisoryError>,
    pub alert: Result<Option<String>, AdvisoryError>,
}

impl MockAdvisor {
    /// Advisor that answers successfully.
    pub fn new(suggestions: Vec<String>, alert: Option<String>) -> Self {
        Self {
            suggestions: Ok(suggestions),
            alert: Ok(alert),
        }
    }

    /// Advisor whose every call fails.
    pub fn failing() -> Self {
        Self {
            suggestions: Err(AdvisoryError::Unavailable("connection refused".into())),
            alert: Err(AdvisoryError::Timeout),
        }
    }
}

impl Advisor for MockAdvisor {
    fn suggest_surgeries(&self, _: &str, _: &[String]) -> Result<Vec<String>, AdvisoryError> {
        self.suggestions.clone()
    }

    fn clinical_alert(&self, _: AsaGrade, _: &str) -> Result<Option<String>, AdvisoryError> {
        self.alert.clone()
    }
}
