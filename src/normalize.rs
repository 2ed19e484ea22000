//! Lexical cleanup of a raw Factbook language field.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Citation markers: [1], [a], [*], [†]
    static ref FOOTNOTE_MARKER: Regex = Regex::new(r"\[\s*(?:\d{1,3}|[A-Za-z]|[*†‡§¶#]+)\s*\]").unwrap();
    // Estimate years: (2011 est.), (2016), (est.)
    static ref ESTIMATE_MARKER: Regex = Regex::new(r"(?i)\(\s*(?:(?:19|20)\d{2}(?:\s*est\.?)?|est\.?)\s*\)").unwrap();
    static ref EMPTY_PARENS: Regex = Regex::new(r"\(\s*\)").unwrap();
    // Start of trailing commentary: "... note: data represent ..."
    static ref NOTE_MARKER: Regex = Regex::new(r"(?i)\bnotes?\s*:").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref OPEN_PAREN_SPACE: Regex = Regex::new(r"\(\s+").unwrap();
    static ref CLOSE_PAREN_SPACE: Regex = Regex::new(r"\s+\)").unwrap();
}

const DASHES: [char; 7] = [
    '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2212}',
];

/// Clean a raw language field.
///
/// Parenthetical text is preserved; only citation artifacts are removed.
/// `normalize(&normalize(x)) == normalize(x)` holds for every input.
pub fn normalize(raw: &str) -> String {
    let text: String = raw
        .nfkc()
        .map(|c| if DASHES.contains(&c) { '-' } else { c })
        .collect();

    let text = strip_artifacts(text);
    let text = strip_note_tail(&text);
    let text = WHITESPACE.replace_all(&text, " ");
    let text = OPEN_PAREN_SPACE.replace_all(&text, "(");
    let text = CLOSE_PAREN_SPACE.replace_all(&text, ")");
    let text = fold_delimiters(&text);
    let text = CLOSE_PAREN_SPACE.replace_all(&text, ")");

    text.trim_start_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .trim_end_matches(|c: char| c == ',' || c == ';' || c == '.' || c.is_whitespace())
        .to_string()
}

/// Remove footnotes, estimate years and the empty parentheses they leave
/// behind, until nothing changes. Nested markers such as `[1[2]]` need more
/// than one pass.
fn strip_artifacts(mut text: String) -> String {
    loop {
        let next = FOOTNOTE_MARKER.replace_all(&text, " ");
        let next = ESTIMATE_MARKER.replace_all(&next, " ");
        let next = EMPTY_PARENS.replace_all(&next, " ").into_owned();
        if next == text {
            return text;
        }
        text = next;
    }
}

/// Cut the text at the first `note:` outside parentheses. A note inside a
/// parenthetical belongs to that clause and is kept.
fn strip_note_tail(text: &str) -> &str {
    for marker in NOTE_MARKER.find_iter(text) {
        let depth = text[..marker.start()].chars().fold(0usize, |depth, c| match c {
            '(' => depth + 1,
            ')' => depth.saturating_sub(1),
            _ => depth,
        });
        if depth == 0 {
            return &text[..marker.start()];
        }
    }
    text
}

/// True when the comma at `i` sits between two digits (`1,5%`).
pub(crate) fn is_decimal_comma(chars: &[char], i: usize) -> bool {
    chars[i] == ','
        && i > 0
        && chars[i - 1].is_ascii_digit()
        && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

/// Collapse each run of delimiters and surrounding whitespace into the first
/// delimiter of the run followed by a single space.
fn fold_delimiters(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if (c == ',' || c == ';') && !is_decimal_comma(&chars, i) {
            let trimmed = out.trim_end().len();
            out.truncate(trimmed);
            out.push(c);
            out.push(' ');
            i += 1;
            while i < chars.len() && (chars[i] == ',' || chars[i] == ';' || chars[i].is_whitespace()) {
                i += 1;
            }
        } else {
            out.push(c);
            i += 1;
        }
    }

    out
}
