//! Deduplicates resolved candidates and orders the final dataset.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Confidence, ResolvedRecord};

fn describe_share(share: Option<f64>) -> String {
    match share {
        Some(value) => format!("{}%", value),
        None => "none".to_string(),
    }
}

/// Keep one record per (country, language) pair.
///
/// The higher-confidence candidate wins. On equal confidence the first one
/// is kept, and if the later one disagrees on share or qualifier its share is
/// recorded in the kept record's note. The result never holds more records
/// than it was given.
pub fn assemble(candidates: Vec<ResolvedRecord>) -> Vec<ResolvedRecord> {
    let mut kept: Vec<ResolvedRecord> = Vec::with_capacity(candidates.len());
    let mut seen: HashMap<(String, String), usize> = HashMap::new();

    for candidate in candidates {
        let key = (candidate.country_iso.clone(), candidate.language_iso.clone());
        let Some(i) = seen.get(&key).copied() else {
            seen.insert(key, kept.len());
            kept.push(candidate);
            continue;
        };

        let existing = &mut kept[i];
        match candidate.confidence.cmp(&existing.confidence) {
            Ordering::Greater => {
                log::debug!(
                    "{}/{}: {:?} replaces {:?}",
                    candidate.country_iso,
                    candidate.language_iso,
                    candidate.label,
                    existing.label
                );
                *existing = candidate;
            }
            Ordering::Less => {}
            Ordering::Equal => {
                if candidate.share != existing.share || candidate.qualifier != existing.qualifier {
                    existing.push_note(&format!(
                        "discarded alternative share: {}",
                        describe_share(candidate.share)
                    ));
                }
            }
        }
    }

    kept.sort_by(compare_records);
    kept
}

/// Country first; within a country resolved languages by code, then
/// unresolved ones by their original label.
fn compare_records(a: &ResolvedRecord, b: &ResolvedRecord) -> Ordering {
    let unresolved = |r: &ResolvedRecord| r.confidence == Confidence::Unresolved;
    let sort_key = |r: &ResolvedRecord| if unresolved(r) { r.label.clone() } else { r.language_iso.clone() };

    a.country_iso
        .cmp(&b.country_iso)
        .then_with(|| unresolved(a).cmp(&unresolved(b)))
        .then_with(|| sort_key(a).cmp(&sort_key(b)))
}

/// Log unresolved languages whose share is large enough to deserve manual
/// review. Returns how many were flagged.
pub fn flag_for_review(records: &[ResolvedRecord], min_share: f64) -> usize {
    let mut flagged = 0;
    for record in records.iter().filter(|r| !r.is_resolved()) {
        match record.share {
            Some(share) if share > min_share => {
                log::warn!(
                    "{}: no language code for {:?} ({}%)",
                    record.country_iso,
                    record.label,
                    share
                );
                flagged += 1;
            }
            _ => log::debug!("{}: no language code for {:?}", record.country_iso, record.label),
        }
    }
    flagged
}
