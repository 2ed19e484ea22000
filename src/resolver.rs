//! Maps free-text language and country names to ISO codes.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::{CanonicalCode, Confidence, TableKind};
use crate::schema::{FuzzyThresholds, LookupRules};

lazy_static! {
    // "falkland islands (islas malvinas)"
    static ref ALTERNATE_NAME: Regex = Regex::new(r"^(.*) \((.*)\)$").unwrap();
}

/// Read-only name -> code table for one reference dataset.
///
/// Keys are built with the table's own lookup rules, and the resolver
/// rewrites queries with the same rules, so both sides always agree.
#[derive(Debug, Clone)]
pub struct CanonicalTable {
    kind: TableKind,
    codes: Vec<CanonicalCode>,
    index: HashMap<String, usize>,
    // Insertion-ordered copy of the index, for deterministic fuzzy scans
    keys: Vec<(String, usize)>,
    rules: LookupRules,
    aliases: HashMap<String, String>,
    fixed_codes: HashMap<String, String>,
}

impl CanonicalTable {
    /// Build a table; an empty dataset is a configuration error.
    ///
    /// When two entries share a normalized name, the first one wins and the
    /// collision is logged.
    pub fn new(kind: TableKind, codes: Vec<CanonicalCode>, rules: LookupRules) -> Result<Self> {
        let mut index = HashMap::new();
        let mut keys = Vec::new();

        for (i, code) in codes.iter().enumerate() {
            let key = lookup_key(&code.canonical_name, &rules);
            if key.is_empty() {
                log::warn!(
                    "{} {:?} has no usable name {:?}; skipping",
                    kind,
                    code.iso_code,
                    code.canonical_name
                );
                continue;
            }
            if let Some(&existing) = index.get(&key) {
                let kept: &CanonicalCode = &codes[existing];
                log::warn!(
                    "duplicate {} name {:?}: keeping {} and ignoring {}",
                    kind,
                    code.canonical_name,
                    kept.iso_code,
                    code.iso_code
                );
                continue;
            }
            index.insert(key.clone(), i);
            keys.push((key, i));
        }

        if index.is_empty() {
            return Err(Error::EmptyTable(kind));
        }

        let aliases = rules
            .aliases
            .iter()
            .map(|(from, to)| (lookup_key(from, &rules), lookup_key(to, &rules)))
            .collect();
        let fixed_codes = rules
            .fixed_codes
            .iter()
            .map(|(name, code)| (lookup_key(name, &rules), code.clone()))
            .collect();

        Ok(CanonicalTable { kind, codes, index, keys, rules, aliases, fixed_codes })
    }

    /// Convenience constructor from `(iso_code, name)` pairs.
    pub fn from_pairs<I, C, N>(kind: TableKind, pairs: I, rules: LookupRules) -> Result<Self>
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let codes = pairs
            .into_iter()
            .map(|(code, name)| CanonicalCode {
                iso_code: code.into(),
                canonical_name: name.into(),
            })
            .collect();
        Self::new(kind, codes, rules)
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &[CanonicalCode] {
        &self.codes
    }

    fn key(&self, name: &str) -> String {
        lookup_key(name, &self.rules)
    }

    fn get(&self, key: &str) -> Option<&CanonicalCode> {
        self.index.get(key).map(|&i| &self.codes[i])
    }
}

/// ASCII-folded, lowercased, whitespace-normalized name with the table's
/// ignored words dropped and replaced words substituted.
pub fn lookup_key(name: &str, rules: &LookupRules) -> String {
    let folded: String = name.nfkd().filter(|c| c.is_ascii()).collect::<String>().to_lowercase();

    let words: Vec<&str> = folded
        .split_whitespace()
        .filter(|w| !rules.ignored_words.iter().any(|ignored| ignored == w))
        .map(|w| rules.replaced_words.get(w).map(String::as_str).unwrap_or(w))
        .collect();

    words
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .to_string()
}

/// Character-level edit distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Outcome of resolving one name.
///
/// An unresolved name keeps the original text in `code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub code: String,
    pub canonical_name: Option<String>,
    pub confidence: Confidence,
}

impl Resolution {
    fn found(code: &CanonicalCode, confidence: Confidence) -> Self {
        Resolution {
            code: code.iso_code.clone(),
            canonical_name: Some(code.canonical_name.clone()),
            confidence,
        }
    }

    fn unresolved(label: &str) -> Self {
        Resolution {
            code: label.trim().to_string(),
            canonical_name: None,
            confidence: Confidence::Unresolved,
        }
    }
}

/// Stateless lookup over one canonical table.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    table: &'a CanonicalTable,
    fuzzy: &'a FuzzyThresholds,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a CanonicalTable, fuzzy: &'a FuzzyThresholds) -> Self {
        Resolver { table, fuzzy }
    }

    pub fn resolve(&self, label: &str) -> Resolution {
        let key = self.table.key(label);
        if key.is_empty() {
            return Resolution::unresolved(label);
        }

        if let Some(found) = self.exact(&key, true) {
            return found;
        }

        match self.fuzzy_match(&key) {
            Some(code) => {
                log::debug!("{} {:?} fuzzy-matched {:?}", self.table.kind, label, code.canonical_name);
                Resolution::found(code, Confidence::Fuzzy)
            }
            None => Resolution::unresolved(label),
        }
    }

    /// Direct lookup followed by the deterministic rewrites: aliases, fixed
    /// codes, `x or y` alternatives, comma inversion and prefix, and
    /// parenthetical alternate names.
    fn exact(&self, key: &str, allow_alternatives: bool) -> Option<Resolution> {
        let table = self.table;

        if let Some(code) = table.get(key) {
            return Some(Resolution::found(code, Confidence::Exact));
        }

        if let Some(code) = table.aliases.get(key).and_then(|target| table.get(target)) {
            return Some(Resolution::found(code, Confidence::Exact));
        }

        if let Some(code) = table.fixed_codes.get(key) {
            return Some(Resolution {
                code: code.clone(),
                canonical_name: Some(key.to_string()),
                confidence: Confidence::Exact,
            });
        }

        if allow_alternatives && key.contains(" or ") {
            return key
                .split(" or ")
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .find_map(|part| self.exact(part, false));
        }

        if key.contains(',') {
            let parts: Vec<&str> = key.split(',').map(str::trim).collect();
            let inverted = parts.iter().rev().copied().collect::<Vec<_>>().join(" ");
            if let Some(code) = table.get(inverted.trim()) {
                return Some(Resolution::found(code, Confidence::Exact));
            }
            if let Some(code) = parts.first().and_then(|short| table.get(short)) {
                return Some(Resolution::found(code, Confidence::Exact));
            }
        }

        if let Some(cap) = ALTERNATE_NAME.captures(key) {
            for candidate in [cap[2].trim(), cap[1].trim()] {
                if let Some(code) = table.get(candidate) {
                    return Some(Resolution::found(code, Confidence::Exact));
                }
            }
        }

        None
    }

    /// Closest canonical name within the length-dependent threshold, as long
    /// as every candidate at that distance carries the same code.
    fn fuzzy_match(&self, key: &str) -> Option<&'a CanonicalCode> {
        let key_len = key.chars().count();
        let max_distance = self.fuzzy.max_distance(key_len);
        if max_distance == 0 {
            return None;
        }

        let mut best: Option<(usize, Vec<usize>)> = None;
        for (candidate, idx) in &self.table.keys {
            if candidate.chars().count().abs_diff(key_len) > max_distance {
                continue;
            }
            let distance = levenshtein(key, candidate);
            if distance > max_distance {
                continue;
            }
            let closer = best.as_ref().map_or(true, |(d, _)| distance < *d);
            if closer {
                best = Some((distance, vec![*idx]));
            } else if let Some((d, hits)) = best.as_mut() {
                if distance == *d {
                    hits.push(*idx);
                }
            }
        }

        let (_, hits) = best?;
        let codes = &self.table.codes;
        let first = &codes[hits[0]];
        if hits.iter().all(|&i| codes[i].iso_code == first.iso_code) {
            Some(first)
        } else {
            log::debug!(
                "{} {:?} is ambiguous between {} candidates",
                self.table.kind,
                key,
                hits.len()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Heuristics;

    fn languages(pairs: &[(&str, &str)]) -> CanonicalTable {
        let rules = Heuristics::bundled().languages.clone();
        CanonicalTable::from_pairs(TableKind::Language, pairs.iter().copied(), rules).unwrap()
    }

    fn countries(pairs: &[(&str, &str)]) -> CanonicalTable {
        let rules = Heuristics::bundled().countries.clone();
        CanonicalTable::from_pairs(TableKind::Country, pairs.iter().copied(), rules).unwrap()
    }

    fn resolve(table: &CanonicalTable, label: &str) -> Resolution {
        Resolver::new(table, &Heuristics::bundled().fuzzy).resolve(label)
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("french", "french"), 0);
        assert_eq!(levenshtein("ñu", "nu"), 1);
    }

    #[test]
    fn empty_table_is_an_error() {
        let empty: [(&str, &str); 0] = [];
        let result = CanonicalTable::from_pairs(TableKind::Language, empty, LookupRules::default());
        assert!(matches!(result, Err(Error::EmptyTable(TableKind::Language))));
    }

    #[test]
    fn duplicate_names_keep_first() {
        let table = languages(&[("fr", "French"), ("frm", "french")]);
        let r = resolve(&table, "French");
        assert_eq!(r.code, "fr");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn exact_is_case_and_space_insensitive() {
        let table = languages(&[("ht", "Haitian Creole")]);
        let r = resolve(&table, "  haitian   CREOLE ");
        assert_eq!(r.code, "ht");
        assert_eq!(r.confidence, Confidence::Exact);
    }

    #[test]
    fn exact_folds_diacritics() {
        let table = countries(&[("CI", "Côte d’Ivoire"), ("CW", "Curaçao")]);
        assert_eq!(resolve(&table, "Curacao").code, "CW");
    }

    #[test]
    fn fuzzy_within_threshold() {
        let table = languages(&[("ps", "Pashto"), ("kk", "Kazakh")]);
        let r = resolve(&table, "Pashtu");
        assert_eq!(r.code, "ps");
        assert_eq!(r.confidence, Confidence::Fuzzy);
        assert_eq!(r.canonical_name.as_deref(), Some("Pashto"));
    }

    #[test]
    fn fuzzy_threshold_depends_on_length() {
        let table = languages(&[("ku", "Kurdish"), ("lb", "Luxembourgish")]);
        // 7 chars, distance 3 > 2
        assert_eq!(resolve(&table, "Qurdosk").confidence, Confidence::Unresolved);
        // 13 chars, distance 3 <= 3
        assert_eq!(resolve(&table, "Luxemburgesch").confidence, Confidence::Fuzzy);
    }

    #[test]
    fn fuzzy_tie_is_unresolved() {
        let table = languages(&[("aa", "Tamal"), ("bb", "Tamel")]);
        let r = resolve(&table, "Tamil");
        assert_eq!(r.confidence, Confidence::Unresolved);
        assert_eq!(r.code, "Tamil");
    }

    #[test]
    fn mandarin_chinese_threshold_is_pinned() {
        let table = languages(&[("cmn", "Chinese, Mandarin")]);
        assert_eq!(levenshtein("mandarin chinese", "chinese, mandarin"), 16);
        let r = resolve(&table, "Mandarin Chinese");
        assert_eq!(r.confidence, Confidence::Unresolved);
        assert_eq!(r.code, "Mandarin Chinese");

        let table = languages(&[("cmn", "Mandarin Chinese")]);
        let r = resolve(&table, "Chinese, Mandarin");
        assert_eq!(r.confidence, Confidence::Exact);
        assert_eq!(r.code, "cmn");
    }

    #[test]
    fn unresolved_keeps_label() {
        let table = languages(&[("fr", "French")]);
        let r = resolve(&table, "other 13 national languages");
        assert_eq!(r.confidence, Confidence::Unresolved);
        assert_eq!(r.code, "other 13 national languages");
        assert_eq!(r.canonical_name, None);
    }

    #[test]
    fn ignored_words_dropped() {
        let table = languages(&[("en", "English")]);
        assert_eq!(resolve(&table, "English only").confidence, Confidence::Exact);
    }

    #[test]
    fn or_alternatives() {
        let table = languages(&[("fa", "Persian")]);
        let r = resolve(&table, "Farsi or Persian");
        assert_eq!(r.code, "fa");
        assert_eq!(r.confidence, Confidence::Exact);
    }

    #[test]
    fn country_rewrites() {
        let table = countries(&[
            ("KP", "North Korea"),
            ("FM", "Micronesia"),
            ("FK", "Falkland Islands"),
            ("MM", "Myanmar (Burma)"),
            ("TT", "Trinidad & Tobago"),
            ("GM", "Gambia"),
            ("KN", "St. Kitts & Nevis"),
        ]);
        assert_eq!(resolve(&table, "Korea, North").code, "KP");
        assert_eq!(resolve(&table, "Micronesia, Federated States of").code, "FM");
        assert_eq!(resolve(&table, "Falkland Islands (Islas Malvinas)").code, "FK");
        assert_eq!(resolve(&table, "Burma").code, "MM");
        assert_eq!(resolve(&table, "Trinidad and Tobago").code, "TT");
        assert_eq!(resolve(&table, "Gambia, The").code, "GM");
        assert_eq!(resolve(&table, "Saint Kitts and Nevis").code, "KN");

        let kosovo = resolve(&table, "Kosovo");
        assert_eq!(kosovo.code, "XK");
        assert_eq!(kosovo.confidence, Confidence::Exact);
    }

    #[test]
    fn resolution_is_deterministic() {
        let table = languages(&[("fr", "French"), ("ar", "Arabic"), ("aa", "Tamal"), ("bb", "Tamel")]);
        for label in ["French", "Arabik", "Tamil", "Klingon"] {
            let first = resolve(&table, label);
            for _ in 0..5 {
                assert_eq!(resolve(&table, label), first);
            }
        }
    }
}
