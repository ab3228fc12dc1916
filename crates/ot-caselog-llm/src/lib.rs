//! Hosted-model advisories for the OT case log.
//!
//! Three best-effort conveniences sit on top of the core crate:
//!
//! - surgery-type suggestions for a specialty, informed by the user's history
//! - a soft clinical alert for unusual ASA grade / technique combinations
//! - a descriptive summary of one month of cases
//!
//! [`LlmAdvisor`] implements the core [`Advisor`](ot_caselog_core::form::Advisor)
//! trait, so the case form can use it directly. Transport is an
//! Ollama-compatible `/api/generate` endpoint ([`OllamaClient`], behind the
//! default `http` feature); [`MockLlmClient`] stands in for it in tests.

pub mod advisor;
pub mod client;
pub mod config;
pub mod parsing;
pub mod prompts;

pub use advisor::*;
pub use client::*;
pub use config::AdvisoryConfig;
pub use parsing::*;
pub use prompts::*;
