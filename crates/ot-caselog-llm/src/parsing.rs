//! Parsing of model replies into advisory values.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Reply parsing errors.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Deserialize)]
struct AlertReply {
    #[serde(default)]
    alert: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryReply {
    summary: String,
}

/// Locate the JSON payload in a reply that may carry prose around it.
///
/// Starts at whichever of `{` or `[` comes first and runs to the last
/// matching closer.
pub fn extract_json(reply: &str) -> ParseResult<&str> {
    let start = reply
        .find(['{', '['])
        .ok_or_else(|| ParseError::InvalidFormat("No JSON found in response".into()))?;

    let closer = if reply[start..].starts_with('{') { '}' } else { ']' };
    let end = reply
        .rfind(closer)
        .filter(|end| *end > start)
        .ok_or_else(|| {
            ParseError::InvalidFormat(format!("No closing '{closer}' found in response"))
        })?;

    Ok(&reply[start..=end])
}

/// Parse surgery suggestions.
///
/// Accepts a bare array or `{"suggestions": [...]}`. Non-string and blank
/// entries are skipped, duplicates (ignoring case) dropped, and the result is
/// capped at `max`.
pub fn parse_suggestions(reply: &str, max: usize) -> ParseResult<Vec<String>> {
    let value: Value = serde_json::from_str(extract_json(reply)?)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("suggestions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ParseError::InvalidFormat(
                    "Expected a \"suggestions\" array".into(),
                ))
            }
        },
        _ => return Err(ParseError::InvalidFormat("Expected an array".into())),
    };

    let mut suggestions: Vec<String> = Vec::new();
    for item in items {
        if suggestions.len() >= max {
            break;
        }
        let Value::String(name) = item else { continue };
        let name = name.trim();
        if name.is_empty() || suggestions.iter().any(|s| s.eq_ignore_ascii_case(name)) {
            continue;
        }
        suggestions.push(name.to_string());
    }

    Ok(suggestions)
}

/// Parse a clinical alert. A null, missing or blank alert means none.
pub fn parse_alert(reply: &str) -> ParseResult<Option<String>> {
    let reply: AlertReply = serde_json::from_str(extract_json(reply)?)?;
    Ok(reply
        .alert
        .map(|alert| alert.trim().to_string())
        .filter(|alert| !alert.is_empty()))
}

/// Parse a monthly summary.
///
/// Falls back to the trimmed reply text when the model answered in plain
/// prose instead of JSON.
pub fn parse_summary(reply: &str) -> ParseResult<String> {
    let summary = match extract_json(reply) {
        Ok(json) => serde_json::from_str::<SummaryReply>(json)?.summary,
        Err(_) => reply.to_string(),
    };

    let summary = summary.trim();
    if summary.is_empty() {
        return Err(ParseError::InvalidFormat("Empty summary".into()));
    }
    Ok(summary.to_string())
}
