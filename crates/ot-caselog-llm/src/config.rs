//! Connection settings for the hosted model.

use anyhow::{Context, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "OT_CASELOG_LLM_URL";
pub const ENV_MODEL: &str = "OT_CASELOG_LLM_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "OT_CASELOG_LLM_TIMEOUT_SECS";

/// Where and how to reach the advisory model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for AdvisoryConfig {
    /// A local Ollama instance on its standard port.
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AdvisoryConfig {
    /// Defaults overridden by `OT_CASELOG_LLM_URL`, `OT_CASELOG_LLM_MODEL`
    /// and `OT_CASELOG_LLM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_blank(ENV_BASE_URL) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = non_blank(ENV_MODEL) {
            config.model = model.trim().to_string();
        }
        if let Some(raw) = non_blank(ENV_TIMEOUT_SECS) {
            let timeout_secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| {
                    format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {raw:?}")
                })?;
            anyhow::ensure!(timeout_secs > 0, "{ENV_TIMEOUT_SECS} must be at least 1");
            config.timeout_secs = timeout_secs;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_is_local_ollama() {
        let config = AdvisoryConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_no_overrides() {
        let config = AdvisoryConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AdvisoryConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = AdvisoryConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://gpu-box:11434/"),
            (ENV_MODEL, "medllama"),
            (ENV_TIMEOUT_SECS, "90"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://gpu-box:11434");
        assert_eq!(config.model, "medllama");
        assert_eq!(config.timeout_secs, 90);
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = AdvisoryConfig::from_lookup(lookup(&[(ENV_MODEL, "  ")])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_bad_timeout() {
        let err = AdvisoryConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));

        assert!(AdvisoryConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "0")])).is_err());
    }
}
