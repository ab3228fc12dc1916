//! Free-text and tag-set checks.

use super::{ValidationError, ValidationRule};

/// Reject control characters. Multi-line fields may contain line breaks and tabs.
fn has_forbidden_control(s: &str, multiline: bool) -> bool {
    s.chars()
        .any(|c| c.is_control() && !(multiline && matches!(c, '\n' | '\r' | '\t')))
}

/// A required single-line text field. Returns the trimmed value.
pub(crate) fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, ValidationRule::Required));
    }
    if has_forbidden_control(trimmed, false) {
        return Err(ValidationError::new(field, ValidationRule::ControlCharacters));
    }
    Ok(trimmed.to_string())
}

/// An optional text field. Blank input collapses to `None`.
pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    multiline: bool,
) -> Result<Option<String>, ValidationError> {
    let Some(trimmed) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if has_forbidden_control(trimmed, multiline) {
        return Err(ValidationError::new(field, ValidationRule::ControlCharacters));
    }
    Ok(Some(trimmed.to_string()))
}

/// Normalize a tag set: trim, drop blanks, suppress duplicates (first occurrence wins).
pub(crate) fn tag_set(
    field: &'static str,
    tags: &[String],
) -> Result<Vec<String>, ValidationError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        if has_forbidden_control(trimmed, false) {
            return Err(ValidationError::new(field, ValidationRule::ControlCharacters));
        }
        if !out.iter().any(|t| t == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    Ok(out)
}
