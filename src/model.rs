use serde::{Deserialize, Serialize};
use std::fmt;

/// One country's language field, as scraped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub country_name: String,
    pub raw_text: String,
}

impl RawEntry {
    pub fn new(country_name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        RawEntry {
            country_name: country_name.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// Legal or social status of a language within a country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    None,
    Official,
    Minority,
    Regional,
    Other,
}

impl Qualifier {
    pub fn is_official(self) -> bool {
        self == Qualifier::Official
    }
}

/// One language mention extracted from a country's text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedClause {
    pub language_label: String,
    pub qualifier: Qualifier,
    pub share: Option<f64>,
    pub note: Option<String>,
    /// 1-based clause index within the entry
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCode {
    pub iso_code: String,
    pub canonical_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Language,
    Country,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Language => f.write_str("language"),
            TableKind::Country => f.write_str("country"),
        }
    }
}

/// Trust level of a code resolution.
///
/// Variants are declared from weakest to strongest so that `Ord` ranks
/// `Exact` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Unresolved,
    Fuzzy,
    Exact,
}

/// Final output unit, one per (country, language) pair.
///
/// When a resolution fails, the corresponding `*_iso` field holds the
/// original text instead of a code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub country_iso: String,
    pub country_confidence: Confidence,
    pub language_iso: String,
    pub label: String,
    pub qualifier: Qualifier,
    #[serde(rename = "percent")]
    pub share: Option<f64>,
    pub confidence: Confidence,
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ResolvedRecord {
    pub fn is_resolved(&self) -> bool {
        self.confidence != Confidence::Unresolved
    }

    pub fn official(&self) -> bool {
        self.qualifier.is_official()
    }

    pub(crate) fn push_note(&mut self, note: &str) {
        match &mut self.note {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(note);
            }
            None => self.note = Some(note.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_orders_exact_highest() {
        assert!(Confidence::Exact > Confidence::Fuzzy);
        assert!(Confidence::Fuzzy > Confidence::Unresolved);
    }

    #[test]
    fn push_note_appends() {
        let mut record = ResolvedRecord {
            country_iso: "ML".to_string(),
            country_confidence: Confidence::Exact,
            language_iso: "fr".to_string(),
            label: "French".to_string(),
            qualifier: Qualifier::Official,
            share: Some(25.0),
            confidence: Confidence::Exact,
            position: 1,
            note: None,
        };
        record.push_note("first");
        record.push_note("second");
        assert_eq!(record.note.as_deref(), Some("first; second"));
    }
}
