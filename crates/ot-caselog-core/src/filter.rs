//! Case table filtering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{AsaGrade, CaseRecord};

/// Filter criteria for the case table. Unset criteria match every record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseFilter {
    /// Case-insensitive substring of the surgery type
    pub surgery: Option<String>,
    pub asa_grade: Option<AsaGrade>,
    /// Exact technique name
    pub technique: Option<String>,
    /// Inclusive lower bound on the surgery date
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the surgery date
    pub date_to: Option<NaiveDate>,
}

impl CaseFilter {
    /// Check if a record satisfies every set criterion.
    pub fn matches(&self, record: &CaseRecord) -> bool {
        let details = &record.details;

        if let Some(needle) = self.surgery.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if !details
                .surgery_type
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(grade) = self.asa_grade {
            if details.asa_grade != grade {
                return false;
            }
        }
        if let Some(technique) = self.technique.as_deref().filter(|s| !s.trim().is_empty()) {
            if details.anesthesia_technique != technique.trim() {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if details.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if details.date > to {
                return false;
            }
        }
        true
    }

    /// Records matching this filter, in input order.
    pub fn apply<'a>(&self, records: &'a [CaseRecord]) -> Vec<&'a CaseRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    /// Check if no criterion is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Distinct surgery types, sorted, for the filter drop-down.
pub fn unique_surgery_types(records: &[CaseRecord]) -> Vec<String> {
    let mut types: Vec<String> = records
        .iter()
        .map(|r| r.details.surgery_type.clone())
        .collect();
    types.sort();
    types.dedup();
    types
}
