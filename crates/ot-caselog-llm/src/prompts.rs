//! Prompt templates for the case-log advisories.
//!
//! Every task asks for a single JSON object so the transport can request
//! JSON mode and the parsers can locate the payload in the reply.

use ot_caselog_core::models::AsaGrade;

/// The three advisory tasks the hosted model performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryTask {
    SurgerySuggestions,
    ClinicalAlert,
    MonthlySummary,
}

impl AdvisoryTask {
    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::SurgerySuggestions => SUGGESTION_SYSTEM_PROMPT,
            Self::ClinicalAlert => ALERT_SYSTEM_PROMPT,
            Self::MonthlySummary => SUMMARY_SYSTEM_PROMPT,
        }
    }

    /// Few-shot pairs of (user turn, assistant turn).
    pub fn examples(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::SurgerySuggestions => SUGGESTION_EXAMPLES,
            Self::ClinicalAlert => ALERT_EXAMPLES,
            Self::MonthlySummary => &[],
        }
    }
}

/// System prompt for surgery-type suggestions.
pub const SUGGESTION_SYSTEM_PROMPT: &str = r#"You are an assistant that suggests surgery types for an anesthesia case log.

Given a surgical specialty and the surgery types the user logged before, suggest up to 5 surgery types that are common in that specialty, favouring the ones that appear most often in the history.

Rules:
- Never suggest the same surgery twice.
- If the history is empty, suggest common surgeries for the specialty.
- If no specialty is given, suggest common surgeries in general.
- Use short conventional names (e.g. "Cholecystectomy", "TURP").

Output JSON only: {"suggestions": ["...", "..."]}"#;

/// System prompt for ASA grade / technique alerts.
pub const ALERT_SYSTEM_PROMPT: &str = r#"You are a clinical decision support assistant for anesthesiologists.

Review the patient's ASA physical status grade and the chosen anesthesia technique. If the combination is unusual, write one brief, soft, non-judgmental sentence the anesthesiologist may want to consider. If the combination is unremarkable, give no alert.

Do not make diagnoses or prescribe treatment.

Output JSON only: {"alert": "..."} or {"alert": null}"#;

/// System prompt for monthly practice summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are an experienced anesthesiologist summarising a month of case logs.

Write a short descriptive summary covering case volume, the most common ASA grades and the anesthesia techniques used. Describe practice patterns only, without diagnostic or therapeutic recommendations.

Output JSON only: {"summary": "..."}"#;

pub const SUGGESTION_EXAMPLES: &[(&str, &str)] = &[(
    "Specialty: Urology\nPreviously logged surgeries:\n- TURP (3)\n- PCNL (1)",
    r#"{"suggestions":["TURP","PCNL","Cystoscopy","Ureteroscopy","Nephrectomy"]}"#,
)];

pub const ALERT_EXAMPLES: &[(&str, &str)] = &[
    (
        "ASA grade: ASA V\nAnesthesia technique: MAC/Sedation",
        r#"{"alert":"MAC/Sedation in an ASA V patient is uncommon; you may want to confirm airway and haemodynamic backup plans."}"#,
    ),
    (
        "ASA grade: ASA II\nAnesthesia technique: GA",
        r#"{"alert":null}"#,
    ),
];

/// User turn for the suggestion task. History entries are listed once each,
/// in first-seen order, with their counts.
pub fn make_suggestion_prompt(specialty: &str, case_history: &[String]) -> String {
    let specialty = specialty.trim();
    let mut prompt = if specialty.is_empty() {
        "Specialty: (not provided)\n".to_string()
    } else {
        format!("Specialty: {specialty}\n")
    };

    let tally = tally_history(case_history);
    if tally.is_empty() {
        prompt.push_str("Previously logged surgeries: none");
    } else {
        prompt.push_str("Previously logged surgeries:");
        for (surgery, count) in tally {
            prompt.push_str(&format!("\n- {surgery} ({count})"));
        }
    }
    prompt
}

/// User turn for the alert task.
pub fn make_alert_prompt(asa_grade: AsaGrade, technique: &str) -> String {
    format!(
        "ASA grade: {}\nAnesthesia technique: {}",
        asa_grade.label(),
        technique.trim()
    )
}

/// User turn for the monthly summary. `month_name` is e.g. "March".
pub fn make_summary_prompt(cases_json: &str, month_name: &str, year: i32) -> String {
    format!("Month: {month_name}\nYear: {year}\nCase logs (JSON):\n{cases_json}")
}

/// Build the chat-templated prompt body: optional few-shot turns, then the
/// request, ending on an open assistant turn. The system prompt travels
/// separately.
pub fn build_full_prompt(task: AdvisoryTask, request: &str, include_examples: bool) -> String {
    let mut prompt = String::new();

    if include_examples {
        for (input, output) in task.examples() {
            push_turn(&mut prompt, "user", input);
            push_turn(&mut prompt, "assistant", output);
        }
    }

    push_turn(&mut prompt, "user", request);
    prompt.push_str("<|assistant|>\n");

    prompt
}

fn push_turn(prompt: &mut String, role: &str, content: &str) {
    prompt.push_str("<|");
    prompt.push_str(role);
    prompt.push_str("|>\n");
    prompt.push_str(content);
    prompt.push_str("\n<|end|>\n");
}

fn tally_history(case_history: &[String]) -> Vec<(&str, usize)> {
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for entry in case_history {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match tally.iter_mut().find(|(s, _)| s.eq_ignore_ascii_case(entry)) {
            Some((_, count)) => *count += 1,
            None => tally.push((entry, 1)),
        }
    }
    tally
}
