//! Parses the Factbook's free-text "Languages" field into per-country
//! language records keyed by ISO codes.
//!
//! Each country's text goes through [`normalize`], [`parser::EntryParser`]
//! and [`resolver::Resolver`]; [`assembler::assemble`] then deduplicates and
//! orders the results. [`process`] runs the whole thing.

pub mod assembler;
pub mod error;
pub mod model;
pub mod normalize;
pub mod output;
pub mod parallel;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod schema;
pub mod sources;

pub use error::{Error, Result};
pub use model::{CanonicalCode, Confidence, ParsedClause, Qualifier, RawEntry, ResolvedRecord, TableKind};
pub use normalize::normalize;
pub use pipeline::{process, Pipeline, Report, Stats};
pub use resolver::{CanonicalTable, Resolution, Resolver};
pub use schema::Heuristics;
