//! Per-user form preferences.

use serde::{Deserialize, Serialize};

use super::vocabulary::DEFAULT_TECHNIQUE;

/// Preferences carried between form sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    /// Technique of the last successfully saved case
    pub last_used_technique: Option<String>,
}

impl UserPreferences {
    /// Technique to preselect for a new case.
    pub fn initial_technique(&self) -> &str {
        self.last_used_technique
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TECHNIQUE)
    }

    /// Remember the technique of a saved case.
    pub fn record_technique(&mut self, technique: &str) {
        self.last_used_technique = Some(technique.trim().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_technique_defaults_to_ga() {
        assert_eq!(UserPreferences::default().initial_technique(), "GA");

        let blank = UserPreferences {
            last_used_technique: Some("  ".into()),
        };
        assert_eq!(blank.initial_technique(), "GA");
    }

    #[test]
    fn test_record_technique() {
        let mut prefs = UserPreferences::default();
        prefs.record_technique(" Epidural ");
        assert_eq!(prefs.initial_technique(), "Epidural");
    }
}
