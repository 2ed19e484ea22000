//! Serialization of the final dataset.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::model::{Confidence, Qualifier, ResolvedRecord};

/// One language of one country, as written in the grouped JSON output.
#[derive(Debug, Serialize)]
struct LanguageOut<'a> {
    label: &'a str,
    code: Option<&'a str>,
    percent: Option<f64>,
    official: bool,
    qualifier: Qualifier,
    confidence: Confidence,
    position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

impl<'a> From<&'a ResolvedRecord> for LanguageOut<'a> {
    fn from(record: &'a ResolvedRecord) -> Self {
        LanguageOut {
            label: &record.label,
            code: record.is_resolved().then_some(record.language_iso.as_str()),
            percent: record.share,
            official: record.official(),
            qualifier: record.qualifier,
            confidence: record.confidence,
            position: record.position,
            note: record.note.as_deref(),
        }
    }
}

/// Unresolved languages without a share that come after this position are
/// left out of compact output.
pub const COMPACT_MAX_POSITION: usize = 5;

/// Whether `record` is kept by `--compact`.
pub fn keep_in_compact(record: &ResolvedRecord) -> bool {
    record.is_resolved() || record.share.is_some() || record.position <= COMPACT_MAX_POSITION
}

/// `{ "<country>": [ ... ] }` sorted by country, pretty-printed.
pub fn write_grouped<W: Write>(records: &[ResolvedRecord], writer: &mut W) -> io::Result<()> {
    let mut grouped: BTreeMap<&str, Vec<LanguageOut<'_>>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.country_iso.as_str()).or_default().push(record.into());
    }

    serde_json::to_writer_pretty(&mut *writer, &grouped)?;
    writeln!(writer)?;
    writer.flush()
}

/// One flat record per line.
pub fn write_jsonl<W: Write>(records: &[ResolvedRecord], writer: &mut W) -> io::Result<()> {
    for record in records {
        let json = serde_json::to_string(record)?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()
}
