//! Splits a normalized language field into clauses and extracts the
//! label, share and qualifier of each.

use lazy_static::lazy_static;
use regex::{Captures, Match, Regex};

use crate::model::{ParsedClause, Qualifier};
use crate::normalize::is_decimal_comma;
use crate::schema::Heuristics;

// Number groups take the whole digit run: `1050%` is one value.
lazy_static! {
    static ref RANGE_PERCENT: Regex = Regex::new(
        r"(?i)(\d+(?:[.,]\d+)?)\s*%?\s*(?:-|to)\s*(\d+(?:[.,]\d+)?)\s?%"
    ).unwrap();
    static ref UPPER_BOUND_PERCENT: Regex = Regex::new(
        r"(?i)(?:\bless than|\bunder|<)\s*(\d+(?:[.,]\d{0,10})?|[.,]\d{1,10})\s?%"
    ).unwrap();
    static ref PERCENT: Regex = Regex::new(
        r"(?i)(?:\b(?:about|approximately|approx\.?|around|roughly|nearly|almost|over|more than)\s+)?(\d+(?:[.,]\d{0,10})?|[.,]\d{1,10})\s?%"
    ).unwrap();
    static ref WORD: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
    static ref AND_JOIN: Regex = Regex::new(r"(?i)\s+and\s+").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Split on top-level `,`/`;`, never inside parentheses.
///
/// An unclosed `(` swallows the rest of the text into the current clause.
pub fn split_clauses(text: &str) -> Vec<&str> {
    let chars: Vec<char> = text.chars().collect();
    let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' | ';' if depth == 0 && !is_decimal_comma(&chars, i) => {
                let clause = text[start..offsets[i]].trim();
                if !clause.is_empty() {
                    clauses.push(clause);
                }
                start = offsets[i] + c.len_utf8();
            }
            _ => {}
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        clauses.push(tail);
    }
    clauses
}

/// Clause text with its top-level parenthetical groups pulled out.
#[derive(Debug, PartialEq)]
struct Parenthesized {
    outside: String,
    groups: Vec<String>,
}

fn split_parentheticals(clause: &str) -> Parenthesized {
    let mut outside = String::with_capacity(clause.len());
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in clause.chars() {
        match (c, depth) {
            ('(', 0) => {
                depth = 1;
                outside.push(' ');
            }
            (')', 0) => outside.push(' '),
            (')', 1) => {
                depth = 0;
                groups.push(current.trim().to_string());
                current.clear();
            }
            ('(', _) => {
                depth += 1;
                current.push(c);
            }
            (')', _) => {
                depth -= 1;
                current.push(c);
            }
            (_, 0) => outside.push(c),
            (_, _) => current.push(c),
        }
    }
    if depth > 0 && !current.trim().is_empty() {
        groups.push(current.trim().to_string());
    }

    Parenthesized { outside, groups }
}

fn parse_number(text: &str) -> Option<f64> {
    text.replace(',', ".").parse::<f64>().ok()
}

/// Share found in a clause, and the byte span it occupied.
#[derive(Debug, PartialEq)]
struct ShareMatch {
    start: usize,
    end: usize,
    share: Option<f64>,
    note: Option<String>,
}

fn last_match<'t>(re: &Regex, text: &'t str) -> Option<(Match<'t>, Captures<'t>)> {
    re.captures_iter(text)
        .last()
        .and_then(|cap| cap.get(0).map(|m| (m, cap)))
}

fn in_range(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

fn extract_share(text: &str) -> Option<ShareMatch> {
    if let Some((m, cap)) = last_match(&RANGE_PERCENT, text) {
        let low = parse_number(&cap[1])?;
        let high = parse_number(&cap[2])?;
        let midpoint = (low + high) / 2.0;
        let range = format!("range {}-{}%", &cap[1], &cap[2]);
        return Some(if in_range(low) && in_range(high) {
            ShareMatch { start: m.start(), end: m.end(), share: Some(midpoint), note: Some(range) }
        } else {
            ShareMatch {
                start: m.start(),
                end: m.end(),
                share: None,
                note: Some(format!("share out of range: {}", range)),
            }
        });
    }

    let (m, cap, note) = if let Some((m, cap)) = last_match(&UPPER_BOUND_PERCENT, text) {
        (m, cap, Some("upper bound".to_string()))
    } else {
        let (m, cap) = last_match(&PERCENT, text)?;
        (m, cap, None)
    };

    let value = parse_number(&cap[1])?;
    Some(if in_range(value) {
        ShareMatch { start: m.start(), end: m.end(), share: Some(value), note }
    } else {
        ShareMatch {
            start: m.start(),
            end: m.end(),
            share: None,
            note: Some(format!("share out of range: {}%", &cap[1])),
        }
    })
}

fn clean_label(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | '.' | '/'))
        .to_string()
}

fn has_letters(text: &str) -> bool {
    text.chars().any(|c| c.is_alphabetic())
}

fn join_notes(notes: Vec<String>) -> Option<String> {
    if notes.is_empty() {
        None
    } else {
        Some(notes.join("; "))
    }
}

pub struct EntryParser<'h> {
    heuristics: &'h Heuristics,
}

impl<'h> EntryParser<'h> {
    pub fn new(heuristics: &'h Heuristics) -> Self {
        EntryParser { heuristics }
    }

    /// Parse a normalized field into clauses, in source order.
    pub fn parse(&self, normalized: &str) -> Vec<ParsedClause> {
        let mut parsed = Vec::new();
        let mut position = 0;

        for clause in split_clauses(normalized) {
            let Some(first) = self.parse_clause(clause, position + 1) else {
                log::debug!("dropping clause without language text: {:?}", clause);
                continue;
            };
            position += 1;
            parsed.extend(self.split_conjunction(first));
        }

        parsed
    }

    fn parse_clause(&self, clause: &str, position: usize) -> Option<ParsedClause> {
        let Parenthesized { outside, groups } = split_parentheticals(clause);
        let mut notes = Vec::new();

        let (share, label) = match extract_share(&outside) {
            Some(found) => {
                notes.extend(found.note);
                let remainder = format!("{} {}", &outside[..found.start], &outside[found.end..]);
                (found.share, clean_label(&remainder))
            }
            None => (None, clean_label(&outside)),
        };

        if !has_letters(&label) {
            return None;
        }

        let mut qualifier = if groups.is_empty() { Qualifier::None } else { Qualifier::Other };
        let mut matched = false;
        for group in &groups {
            match (matched, self.heuristics.qualifier_in(group)) {
                (false, Some(found)) => {
                    qualifier = found;
                    matched = true;
                }
                (_, Some(_)) => {}
                (_, None) => notes.push(group.clone()),
            }
        }

        if !self.is_language_like(&label) {
            log::debug!("clause {:?} does not name a single language", clause);
            qualifier = Qualifier::Other;
        }

        Some(ParsedClause {
            language_label: label,
            qualifier,
            share,
            note: join_notes(notes),
            position,
        })
    }

    /// A label that names one language rather than a bucket of them.
    fn is_language_like(&self, label: &str) -> bool {
        if !has_letters(label) || label.chars().any(|c| c.is_ascii_digit()) {
            return false;
        }
        match WORD.find(label) {
            Some(first) => !self.heuristics.is_catch_all(first.as_str()),
            None => false,
        }
    }

    /// `X and Y` without a share becomes two clauses.
    fn split_conjunction(&self, clause: ParsedClause) -> Vec<ParsedClause> {
        if clause.share.is_some() || !self.is_language_like(&clause.language_label) {
            return vec![clause];
        }

        let parts: Vec<&str> = AND_JOIN.split(&clause.language_label).collect();
        if parts.len() != 2 || !parts.iter().all(|p| self.is_language_like(p)) {
            return vec![clause];
        }

        parts
            .into_iter()
            .map(|part| ParsedClause {
                language_label: clean_label(part),
                ..clause.clone()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn parse(text: &str) -> Vec<ParsedClause> {
        EntryParser::new(Heuristics::bundled()).parse(&normalize(text))
    }

    // ─────────────────────────────────────────────────────────────
    // Clause splitting
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn split_respects_parentheses() {
        assert_eq!(
            split_clauses("Swahili (official, national), English (official; courts) 10%; Arabic"),
            vec!["Swahili (official, national)", "English (official; courts) 10%", "Arabic"]
        );
    }

    #[test]
    fn split_unclosed_paren_swallows_rest() {
        assert_eq!(split_clauses("French, Arabic (official, Berber"), vec!["French", "Arabic (official, Berber"]);
    }

    #[test]
    fn split_keeps_decimal_commas() {
        assert_eq!(split_clauses("Romansh 0,5%, German 63,3%"), vec!["Romansh 0,5%", "German 63,3%"]);
    }

    #[test]
    fn split_empty() {
        assert!(split_clauses("").is_empty());
    }

    #[test]
    fn parentheticals_nested() {
        let p = split_parentheticals("Quechua (official (since 1975)) 13.9%");
        assert_eq!(p.groups, vec!["official (since 1975)"]);
        assert_eq!(p.outside, "Quechua   13.9%");
    }

    // ─────────────────────────────────────────────────────────────
    // Full clause parsing
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn mali_example() {
        let clauses = parse("French (official) 25%, Bambara 30%, other 13 national languages 45%");
        assert_eq!(clauses.len(), 3);

        assert_eq!(clauses[0].language_label, "French");
        assert_eq!(clauses[0].qualifier, Qualifier::Official);
        assert_eq!(clauses[0].share, Some(25.0));

        assert_eq!(clauses[1].language_label, "Bambara");
        assert_eq!(clauses[1].qualifier, Qualifier::None);
        assert_eq!(clauses[1].share, Some(30.0));

        assert_eq!(clauses[2].language_label, "other 13 national languages");
        assert_eq!(clauses[2].qualifier, Qualifier::Other);
        assert_eq!(clauses[2].share, Some(45.0));

        let positions: Vec<usize> = clauses.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn percentages_are_exact() {
        for (text, expected) in [("7%", 7.0), ("64.7%", 64.7), ("0.1%", 0.1), ("100%", 100.0), ("12 %", 12.0)] {
            let clauses = parse(&format!("Spanish {}", text));
            assert_eq!(clauses[0].share, Some(expected), "for {}", text);
            assert_eq!(clauses[0].language_label, "Spanish");
        }
    }

    #[test]
    fn percentage_after_qualifier() {
        let clauses = parse("English 98.1% (official)");
        assert_eq!(clauses[0].language_label, "English");
        assert_eq!(clauses[0].share, Some(98.1));
        assert_eq!(clauses[0].qualifier, Qualifier::Official);
    }

    #[test]
    fn decimal_comma_share() {
        let clauses = parse("Romansh 0,5%");
        assert_eq!(clauses[0].share, Some(0.5));
    }

    #[test]
    fn range_takes_midpoint() {
        let clauses = parse("Wolof 5-10%");
        assert_eq!(clauses[0].language_label, "Wolof");
        assert_eq!(clauses[0].share, Some(7.5));
        assert_eq!(clauses[0].note.as_deref(), Some("range 5-10%"));
    }

    #[test]
    fn less_than_is_upper_bound() {
        let clauses = parse("Tamil less than 1%");
        assert_eq!(clauses[0].language_label, "Tamil");
        assert_eq!(clauses[0].share, Some(1.0));
        assert_eq!(clauses[0].note.as_deref(), Some("upper bound"));
    }

    #[test]
    fn out_of_range_share_is_dropped() {
        let clauses = parse("Hindi 430%");
        assert_eq!(clauses[0].share, None);
        assert!(clauses[0].note.as_deref().unwrap().contains("out of range"));
    }

    #[test]
    fn long_digit_runs_are_not_truncated() {
        let clauses = parse("Hindi 1050%");
        assert_eq!(clauses[0].language_label, "Hindi");
        assert_eq!(clauses[0].share, None);
        assert_eq!(clauses[0].note.as_deref(), Some("share out of range: 1050%"));

        let clauses = parse("Spanish 2011-12%");
        assert_eq!(clauses[0].language_label, "Spanish");
        assert_eq!(clauses[0].share, None);
        assert_eq!(clauses[0].note.as_deref(), Some("share out of range: range 2011-12%"));

        let clauses = parse("Tamil less than 150%");
        assert_eq!(clauses[0].language_label, "Tamil");
        assert_eq!(clauses[0].share, None);
    }

    #[test]
    fn qualifier_vocabulary() {
        let clauses = parse("Kiswahili (national), Sami (minority), Catalan (regional), Tok Pisin (lingua franca)");
        let qualifiers: Vec<Qualifier> = clauses.iter().map(|c| c.qualifier).collect();
        assert_eq!(
            qualifiers,
            vec![Qualifier::Official, Qualifier::Minority, Qualifier::Regional, Qualifier::Other]
        );
        assert_eq!(clauses[3].note.as_deref(), Some("lingua franca"));
    }

    #[test]
    fn note_inside_parenthetical_keeps_following_clauses() {
        let clauses = parse("Arabic (official; note: also French) 70%, Berber 20%");
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].language_label, "Arabic");
        assert_eq!(clauses[0].qualifier, Qualifier::Official);
        assert_eq!(clauses[0].share, Some(70.0));
        assert_eq!(clauses[1].language_label, "Berber");
        assert_eq!(clauses[1].share, Some(20.0));
    }

    #[test]
    fn qualifier_needs_whole_word() {
        let clauses = parse("Latin (unofficial)");
        assert_eq!(clauses[0].qualifier, Qualifier::Other);
    }

    #[test]
    fn footnote_remnant_dropped() {
        let clauses = parse("Arabic 70%, 12%, (3)");
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].language_label, "Arabic");
    }

    #[test]
    fn conjunction_split_without_shares() {
        let clauses = parse("Hindi and English (official), Bengali 8%");
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0].language_label, "Hindi");
        assert_eq!(clauses[1].language_label, "English");
        for c in &clauses[..2] {
            assert_eq!(c.qualifier, Qualifier::Official);
            assert_eq!(c.share, None);
            assert_eq!(c.position, 1);
        }
        assert_eq!(clauses[2].position, 2);
    }

    #[test]
    fn conjunction_with_share_is_kept_whole() {
        let clauses = parse("French and Arabic 20%");
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].language_label, "French and Arabic");
    }

    #[test]
    fn catch_all_is_other() {
        let clauses = parse("unspecified 2.1%");
        assert_eq!(clauses[0].language_label, "unspecified");
        assert_eq!(clauses[0].qualifier, Qualifier::Other);
        assert_eq!(clauses[0].share, Some(2.1));
    }

    #[test]
    fn malformed_input_never_panics() {
        for text in ["((((", "))) , ,", "%%%", "100% 200%", "-5-%", "(official)", "é, ü (regional"] {
            let _ = parse(text);
        }
        assert!(parse("(official)").is_empty());
    }
}
