/// Application-level constants
pub const APP_NAME: &str = "OT Case Log";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of exported file names
pub const EXPORT_FILE_PREFIX: &str = "ot-case-log-export";

/// Cases shown in the dashboard's recent list
pub const RECENT_CASES_LIMIT: usize = 5;

/// Upper bound on surgery suggestions returned by the advisory
pub const MAX_SUGGESTIONS: usize = 5;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "ot_caselog_core=debug,ot_caselog_llm=debug,warn"
    } else {
        "ot_caselog_core=info,ot_caselog_llm=info,warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_names_both_crates() {
        let filter = default_log_filter();
        assert!(filter.contains("ot_caselog_core"));
        assert!(filter.contains("ot_caselog_llm"));
    }
}
