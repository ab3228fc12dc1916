//! [`Advisor`] backed by a hosted language model.

use chrono::Month;

use ot_caselog_core::config::MAX_SUGGESTIONS;
use ot_caselog_core::form::{Advisor, AdvisoryError};
use ot_caselog_core::models::AsaGrade;

use crate::client::{LlmClient, LlmError, LlmResult};
use crate::parsing::{parse_alert, parse_suggestions, parse_summary};
use crate::prompts::{
    build_full_prompt, make_alert_prompt, make_suggestion_prompt, make_summary_prompt,
    AdvisoryTask,
};

/// Sends advisory prompts to an [`LlmClient`] and parses the replies.
pub struct LlmAdvisor<C: LlmClient> {
    client: C,
    model: String,
    include_examples: bool,
}

impl<C: LlmClient> LlmAdvisor<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            include_examples: true,
        }
    }

    /// Drop the few-shot turns from prompts (smaller requests).
    pub fn without_examples(mut self) -> Self {
        self.include_examples = false;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Up to [`MAX_SUGGESTIONS`] distinct surgery names.
    pub fn suggest(&self, specialty: &str, case_history: &[String]) -> LlmResult<Vec<String>> {
        let reply = self.ask(
            AdvisoryTask::SurgerySuggestions,
            &make_suggestion_prompt(specialty, case_history),
        )?;
        let suggestions = parse_suggestions(&reply, MAX_SUGGESTIONS)?;
        tracing::debug!(specialty, count = suggestions.len(), "Surgery suggestions received");
        Ok(suggestions)
    }

    pub fn alert(&self, asa_grade: AsaGrade, technique: &str) -> LlmResult<Option<String>> {
        let reply = self.ask(
            AdvisoryTask::ClinicalAlert,
            &make_alert_prompt(asa_grade, technique),
        )?;
        Ok(parse_alert(&reply)?)
    }

    /// Descriptive summary of one month of cases.
    ///
    /// `cases_json` is the serialised case list for the month; `month` is 1-12.
    pub fn summarize_month(&self, cases_json: &str, month: u32, year: i32) -> LlmResult<String> {
        let month_name = u8::try_from(month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .ok_or_else(|| LlmError::InvalidRequest(format!("Month out of range: {month}")))?;

        let reply = self.ask(
            AdvisoryTask::MonthlySummary,
            &make_summary_prompt(cases_json, month_name, year),
        )?;
        let summary = parse_summary(&reply)?;
        tracing::info!(month, year, summary_len = summary.len(), "Monthly summary generated");
        Ok(summary)
    }

    fn ask(&self, task: AdvisoryTask, request: &str) -> LlmResult<String> {
        let prompt = build_full_prompt(task, request, self.include_examples);
        self.client
            .generate(&self.model, &prompt, task.system_prompt())
            .inspect_err(|e| tracing::debug!(?task, error = %e, "Advisory request failed"))
    }
}

#[cfg(feature = "http")]
impl LlmAdvisor<crate::client::OllamaClient> {
    /// Advisor talking to the Ollama server described by `config`.
    pub fn from_config(config: &crate::config::AdvisoryConfig) -> LlmResult<Self> {
        let client = crate::client::OllamaClient::from_config(config)?;
        Ok(Self::new(client, config.model.clone()))
    }
}

impl From<LlmError> for AdvisoryError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(_) => AdvisoryError::Timeout,
            LlmError::Connection(_) | LlmError::HttpStatus { .. } | LlmError::InvalidRequest(_) => {
                AdvisoryError::Unavailable(err.to_string())
            }
            LlmError::Response(_) | LlmError::Parse(_) => AdvisoryError::Malformed(err.to_string()),
        }
    }
}

impl<C: LlmClient> Advisor for LlmAdvisor<C> {
    fn suggest_surgeries(
        &self,
        specialty: &str,
        case_history: &[String],
    ) -> Result<Vec<String>, AdvisoryError> {
        Ok(self.suggest(specialty, case_history)?)
    }

    fn clinical_alert(
        &self,
        asa_grade: AsaGrade,
        technique: &str,
    ) -> Result<Option<String>, AdvisoryError> {
        Ok(self.alert(asa_grade, technique)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockLlmClient;
    use crate::prompts::{ALERT_SYSTEM_PROMPT, SUGGESTION_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT};

    #[test]
    fn test_suggest_sends_history_and_parses() {
        let advisor = LlmAdvisor::new(
            MockLlmClient::new(r#"{"suggestions":["TURP","PCNL","TURP"]}"#),
            "llama3.2",
        );
        let history = vec!["TURP".to_string()];
        let suggestions = advisor.suggest("Urology", &history).unwrap();
        assert_eq!(suggestions, vec!["TURP", "PCNL"]);

        let calls = advisor.client().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, SUGGESTION_SYSTEM_PROMPT);
        assert!(calls[0].1.contains("- TURP (1)"));
    }

    #[test]
    fn test_suggestions_capped() {
        let advisor = LlmAdvisor::new(
            MockLlmClient::new(r#"["A","B","C","D","E","F"]"#),
            "m",
        );
        assert_eq!(advisor.suggest("", &[]).unwrap().len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn test_alert() {
        let advisor = LlmAdvisor::new(
            MockLlmClient::new(r#"{"alert":"Consider invasive monitoring."}"#),
            "m",
        )
        .without_examples();
        let alert = advisor.alert(AsaGrade::IV, "Spinal").unwrap();
        assert_eq!(alert.as_deref(), Some("Consider invasive monitoring."));

        let calls = advisor.client().calls();
        assert_eq!(calls[0].0, ALERT_SYSTEM_PROMPT);
        assert!(!calls[0].1.contains("MAC/Sedation"));
    }

    #[test]
    fn test_summarize_month() {
        let advisor = LlmAdvisor::new(
            MockLlmClient::new(r#"{"summary":"Two cases, both under GA."}"#),
            "m",
        );
        let summary = advisor.summarize_month("[]", 3, 2024).unwrap();
        assert_eq!(summary, "Two cases, both under GA.");

        let calls = advisor.client().calls();
        assert_eq!(calls[0].0, SUMMARY_SYSTEM_PROMPT);
        assert!(calls[0].1.contains("Month: March"));
    }

    #[test]
    fn test_summarize_rejects_bad_month() {
        let advisor = LlmAdvisor::new(MockLlmClient::new("{}"), "m");
        assert!(matches!(
            advisor.summarize_month("[]", 13, 2024),
            Err(LlmError::InvalidRequest(_))
        ));
        assert!(advisor.client().calls().is_empty());
    }

    #[test]
    fn test_error_mapping() {
        let unreachable = LlmAdvisor::new(MockLlmClient::unreachable(), "m");
        assert!(matches!(
            unreachable.suggest_surgeries("ENT", &[]),
            Err(AdvisoryError::Unavailable(_))
        ));

        let slow = LlmAdvisor::new(MockLlmClient::timing_out(), "m");
        assert_eq!(
            slow.clinical_alert(AsaGrade::I, "GA"),
            Err(AdvisoryError::Timeout)
        );

        let garbled = LlmAdvisor::new(MockLlmClient::new("I cannot help with that."), "m");
        assert!(matches!(
            garbled.clinical_alert(AsaGrade::I, "GA"),
            Err(AdvisoryError::Malformed(_))
        ));
    }
}
