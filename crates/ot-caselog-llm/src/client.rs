//! Transport to the hosted model.

use std::sync::Mutex;

use thiserror::Error;

use crate::parsing::ParseError;

/// Model call errors.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Cannot connect to model server at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Model server returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Unreadable server response: {0}")]
    Response(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

/// A text-generation backend.
pub trait LlmClient {
    /// Complete `prompt` under `system` and return the raw reply text.
    fn generate(&self, model: &str, prompt: &str, system: &str) -> LlmResult<String>;

    fn list_models(&self) -> LlmResult<Vec<String>>;

    /// True when an installed model name starts with `model`
    /// (so "llama3.2" matches "llama3.2:latest").
    fn is_model_available(&self, model: &str) -> LlmResult<bool> {
        Ok(self.list_models()?.iter().any(|m| m.starts_with(model)))
    }
}

#[cfg(feature = "http")]
pub use self::ollama::OllamaClient;

#[cfg(feature = "http")]
mod ollama {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    use super::{LlmClient, LlmError, LlmResult};
    use crate::config::AdvisoryConfig;

    /// Blocking client for an Ollama-compatible server.
    pub struct OllamaClient {
        base_url: String,
        client: reqwest::blocking::Client,
        timeout_secs: u64,
    }

    /// Request body for /api/generate
    #[derive(Serialize)]
    struct GenerateRequest<'a> {
        model: &'a str,
        prompt: &'a str,
        system: &'a str,
        format: &'a str,
        stream: bool,
    }

    /// Response body from /api/generate
    #[derive(Deserialize)]
    struct GenerateResponse {
        response: String,
    }

    /// Response body from /api/tags
    #[derive(Deserialize)]
    struct TagsResponse {
        models: Vec<TaggedModel>,
    }

    #[derive(Deserialize)]
    struct TaggedModel {
        name: String,
    }

    impl OllamaClient {
        pub fn new(base_url: &str, timeout_secs: u64) -> LlmResult<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .map_err(|e| LlmError::InvalidRequest(format!("HTTP client setup failed: {e}")))?;

            Ok(Self {
                base_url: base_url.trim_end_matches('/').to_string(),
                client,
                timeout_secs,
            })
        }

        pub fn from_config(config: &AdvisoryConfig) -> LlmResult<Self> {
            Self::new(&config.base_url, config.timeout_secs)
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        fn send_error(&self, e: reqwest::Error) -> LlmError {
            if e.is_connect() {
                LlmError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                LlmError::Timeout(self.timeout_secs)
            } else {
                LlmError::Response(e.to_string())
            }
        }

        fn check_status(
            response: reqwest::blocking::Response,
        ) -> LlmResult<reqwest::blocking::Response> {
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            let body = response.text().unwrap_or_default();
            Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body,
            })
        }
    }

    impl LlmClient for OllamaClient {
        fn generate(&self, model: &str, prompt: &str, system: &str) -> LlmResult<String> {
            let url = format!("{}/api/generate", self.base_url);
            let body = GenerateRequest {
                model,
                prompt,
                system,
                format: "json",
                stream: false,
            };

            tracing::debug!(
                model,
                url = %url,
                prompt_len = prompt.len(),
                "Sending generate request"
            );

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .map_err(|e| self.send_error(e))?;

            let parsed: GenerateResponse = Self::check_status(response)?
                .json()
                .map_err(|e| LlmError::Response(e.to_string()))?;

            Ok(parsed.response)
        }

        fn list_models(&self) -> LlmResult<Vec<String>> {
            let url = format!("{}/api/tags", self.base_url);

            let response = self
                .client
                .get(&url)
                .send()
                .map_err(|e| self.send_error(e))?;

            let parsed: TagsResponse = Self::check_status(response)?
                .json()
                .map_err(|e| LlmError::Response(e.to_string()))?;

            Ok(parsed.models.into_iter().map(|m| m.name).collect())
        }
    }

}

/// What a [`MockLlmClient`] does when called.
#[derive(Debug, Clone)]
enum MockBehavior {
    Reply(String),
    Refuse,
    TimeOut,
}

/// Mock LLM client for testing. Returns a canned reply or failure and records
/// every (system, prompt) pair it receives.
pub struct MockLlmClient {
    behavior: MockBehavior,
    models: Vec<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockLlmClient {
    pub fn new(reply: &str) -> Self {
        Self::with_behavior(MockBehavior::Reply(reply.to_string()))
    }

    /// Client whose server cannot be reached.
    pub fn unreachable() -> Self {
        Self::with_behavior(MockBehavior::Refuse)
    }

    pub fn timing_out() -> Self {
        Self::with_behavior(MockBehavior::TimeOut)
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Prompts received so far, as (system, prompt).
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            models: vec!["llama3.2:latest".to_string()],
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, prompt: &str, system: &str) -> LlmResult<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((system.to_string(), prompt.to_string()));
        }
        match &self.behavior {
            MockBehavior::Reply(reply) => Ok(reply.clone()),
            MockBehavior::Refuse => Err(LlmError::Connection("mock".into())),
            MockBehavior::TimeOut => Err(LlmError::Timeout(0)),
        }
    }

    fn list_models(&self) -> LlmResult<Vec<String>> {
        match self.behavior {
            MockBehavior::Refuse => Err(LlmError::Connection("mock".into())),
            _ => Ok(self.models.clone()),
        }
    }
}
