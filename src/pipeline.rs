//! Per-entry pipeline: normalize -> parse -> resolve, then assembly.

use std::time::Duration;

use crate::assembler::{assemble, flag_for_review};
use crate::model::{Confidence, RawEntry, ResolvedRecord};
use crate::normalize::normalize;
use crate::parallel::{process_batch_parallel, ParallelConfig};
use crate::parser::EntryParser;
use crate::resolver::{CanonicalTable, Resolver};
use crate::schema::Heuristics;

/// Result of running one entry through the pipeline, before assembly.
#[derive(Debug)]
pub struct ProcessedEntry {
    pub entry_id: usize,
    pub country_iso: String,
    pub country_confidence: Confidence,
    pub clauses: usize,
    pub candidates: Vec<ResolvedRecord>,
}

#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub entries_processed: usize,
    pub empty_entries: usize,
    pub clauses_parsed: usize,
    pub countries_unresolved: usize,
    pub records_written: usize,
    pub exact: usize,
    pub fuzzy: usize,
    pub unresolved: usize,
    pub flagged_for_review: usize,
    pub elapsed: Duration,
}

impl Stats {
    pub(crate) fn update_from_entry(&mut self, result: &ProcessedEntry) {
        self.entries_processed += 1;
        self.clauses_parsed += result.clauses;
        if result.clauses == 0 {
            self.empty_entries += 1;
        }
        if result.country_confidence == Confidence::Unresolved {
            self.countries_unresolved += 1;
        }
    }
}

/// Final dataset plus run statistics.
#[derive(Debug)]
pub struct Report {
    pub records: Vec<ResolvedRecord>,
    pub stats: Stats,
}

/// Immutable processing context shared by every entry.
///
/// Holds only shared references, so one pipeline can be used from many
/// threads at once.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'a> {
    heuristics: &'a Heuristics,
    languages: &'a CanonicalTable,
    countries: &'a CanonicalTable,
}

impl<'a> Pipeline<'a> {
    pub fn new(heuristics: &'a Heuristics, languages: &'a CanonicalTable, countries: &'a CanonicalTable) -> Self {
        Pipeline { heuristics, languages, countries }
    }

    pub fn process_entry(&self, entry: &RawEntry, entry_id: usize) -> ProcessedEntry {
        let country = Resolver::new(self.countries, &self.heuristics.fuzzy).resolve(&entry.country_name);
        if country.confidence == Confidence::Unresolved {
            log::warn!("no country code found for {:?}", entry.country_name);
        }

        let clauses = EntryParser::new(self.heuristics).parse(&normalize(&entry.raw_text));
        let languages = Resolver::new(self.languages, &self.heuristics.fuzzy);

        let candidates = clauses
            .iter()
            .map(|clause| {
                let language = languages.resolve(&clause.language_label);
                ResolvedRecord {
                    country_iso: country.code.clone(),
                    country_confidence: country.confidence,
                    language_iso: language.code,
                    label: clause.language_label.clone(),
                    qualifier: clause.qualifier,
                    share: clause.share,
                    confidence: language.confidence,
                    position: clause.position,
                    note: clause.note.clone(),
                }
            })
            .collect();

        ProcessedEntry {
            entry_id,
            country_iso: country.code,
            country_confidence: country.confidence,
            clauses: clauses.len(),
            candidates,
        }
    }

    /// Run every entry in order on the current thread.
    pub fn process_sequential(&self, entries: &[RawEntry], mut on_progress: impl FnMut(usize)) -> Vec<ProcessedEntry> {
        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let result = self.process_entry(entry, i);
                on_progress(i + 1);
                result
            })
            .collect()
    }

    /// Assemble per-entry results into the final dataset.
    ///
    /// `processed` must be in input order for the first-occurrence
    /// tie-break to be deterministic.
    pub fn finish(&self, processed: Vec<ProcessedEntry>, elapsed: Duration) -> Report {
        let mut stats = Stats::default();
        let mut candidates = Vec::new();
        for result in processed {
            stats.update_from_entry(&result);
            candidates.extend(result.candidates);
        }

        let records = assemble(candidates);
        stats.flagged_for_review = flag_for_review(&records, self.heuristics.review_share);
        stats.records_written = records.len();
        for record in &records {
            match record.confidence {
                Confidence::Exact => stats.exact += 1,
                Confidence::Fuzzy => stats.fuzzy += 1,
                Confidence::Unresolved => stats.unresolved += 1,
            }
        }
        stats.elapsed = elapsed;

        Report { records, stats }
    }

    pub fn process(&self, entries: &[RawEntry]) -> Vec<ResolvedRecord> {
        let processed = self.process_sequential(entries, |_| {});
        self.finish(processed, Duration::ZERO).records
    }

    /// Same result as [`Pipeline::process`], spread over worker threads.
    pub fn process_parallel(&self, entries: &[RawEntry], config: &ParallelConfig) -> Vec<ResolvedRecord> {
        let processed = process_batch_parallel(self, entries, config, |_| {});
        self.finish(processed, Duration::ZERO).records
    }
}

/// Turn raw Factbook entries into the deduplicated, sorted dataset using
/// the bundled heuristics.
pub fn process(
    raw_entries: &[RawEntry],
    canonical_languages: &CanonicalTable,
    canonical_countries: &CanonicalTable,
) -> Vec<ResolvedRecord> {
    Pipeline::new(Heuristics::bundled(), canonical_languages, canonical_countries).process(raw_entries)
}
