//! Record selections used by the dashboard, the form and the monthly summary.

use chrono::Datelike;

use crate::models::CaseRecord;

/// The most recently created cases, newest first.
pub fn recent_cases(records: &[CaseRecord], limit: usize) -> Vec<&CaseRecord> {
    let mut sorted: Vec<&CaseRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}

/// Cases whose surgery date falls in the given calendar month.
pub fn cases_in_month(records: &[CaseRecord], year: i32, month: u32) -> Vec<&CaseRecord> {
    records
        .iter()
        .filter(|r| r.details.date.year() == year && r.details.date.month() == month)
        .collect()
}

/// Surgery types previously logged under a specialty, in record order.
///
/// Feeds the suggestion prompt so the model can lean on the user's history.
pub fn case_history_for(records: &[CaseRecord], specialty: &str) -> Vec<String> {
    let specialty = specialty.trim();
    records
        .iter()
        .filter(|r| r.details.specialty == specialty)
        .map(|r| r.details.surgery_type.clone())
        .collect()
}
