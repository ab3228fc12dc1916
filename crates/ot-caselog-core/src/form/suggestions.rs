//! Merging of static and advised surgery suggestions.

use strsim::{jaro_winkler, normalized_levenshtein};

use crate::models::common_surgeries;

/// Similarity at or above which two names count as the same surgery.
const NEAR_DUPLICATE_THRESHOLD: f64 = 0.92;

/// Procedure endings that change the operation, not just the spelling
/// (incision vs stoma vs excision vs repair).
const PROCEDURE_SUFFIXES: &[&str] = &[
    "ectomy", "ostomy", "otomy", "plasty", "scopy", "pexy", "rrhaphy", "tripsy",
];

/// Static suggestions for a specialty.
pub fn base_suggestions(specialty: &str) -> Vec<String> {
    common_surgeries(specialty)
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Static list first, then advised names that are not already present.
///
/// Names are compared case-insensitively, and near-duplicate spellings
/// ("Caesarean Section" / "Cesarean Section") are suppressed.
pub fn merge_suggestions(base: &[String], advised: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(base.len() + advised.len());
    for name in base.iter().chain(advised) {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if !merged.iter().any(|existing| is_near_duplicate(existing, name)) {
            merged.push(name.to_string());
        }
    }
    merged
}

/// Check if two surgery names are the same up to case or a small misspelling.
///
/// Names ending in different procedure suffixes ("Gastrotomy" / "Gastrostomy")
/// are never folded, however close their spelling.
pub fn is_near_duplicate(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    if a == b {
        return true;
    }
    procedure_suffix(&a) == procedure_suffix(&b)
        && similarity(&a, &b) >= NEAR_DUPLICATE_THRESHOLD
}

/// Lowercase with whitespace runs collapsed to single spaces.
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn procedure_suffix(name: &str) -> Option<&'static str> {
    PROCEDURE_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| name.ends_with(suffix))
}

fn similarity(a: &str, b: &str) -> f64 {
    // Jaro-Winkler favours shared prefixes; Levenshtein keeps it honest on length
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}
