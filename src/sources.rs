//! Loaders for the reference datasets and the Factbook dump.
//!
//! Inputs ending in `.bz2` are decompressed on the fly.

use bzip2::read::BzDecoder;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{CanonicalCode, RawEntry, TableKind};
use crate::resolver::CanonicalTable;
use crate::schema::LookupRules;

pub const LANGUAGES_FIELD: &str = "People and Society: Languages";

pub fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn BufRead + Send> = if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BufReader::with_capacity(256 * 1024, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(256 * 1024, file))
    };
    Ok(reader)
}

fn read_json_object(path: &Path) -> Result<serde_json::Map<String, Value>> {
    let reader = open_input(path)?;
    let value: Value = serde_json::from_reader(reader).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidDataset {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Load a `{ "<iso code>": "<name>" }` dataset, keeping file order.
pub fn load_code_table(path: &Path, kind: TableKind, rules: LookupRules) -> Result<CanonicalTable> {
    let map = read_json_object(path)?;
    let mut codes = Vec::with_capacity(map.len());

    for (iso_code, name) in map {
        match name {
            Value::String(canonical_name) => codes.push(CanonicalCode { iso_code, canonical_name }),
            other => {
                return Err(Error::InvalidDataset {
                    path: path.to_path_buf(),
                    reason: format!("name for {:?} is {}, expected a string", iso_code, json_kind(&other)),
                })
            }
        }
    }

    let table = CanonicalTable::new(kind, codes, rules)?;
    log::info!("loaded {} {} codes from {}", table.len(), kind, path.display());
    Ok(table)
}

/// Load `{ "<country>": { "<field>": "<text>", ... } }`, keeping countries
/// that carry `field`.
pub fn load_raw_entries(path: &Path, field: &str) -> Result<Vec<RawEntry>> {
    let map = read_json_object(path)?;
    let total = map.len();
    let mut entries = Vec::with_capacity(total);

    for (country_name, fields) in map {
        match fields.get(field) {
            Some(Value::String(text)) => entries.push(RawEntry::new(country_name, text.as_str())),
            Some(other) => log::warn!(
                "{}: {:?} is {}, expected a string; skipping",
                country_name,
                field,
                json_kind(other)
            ),
            None => log::debug!("{}: no {:?} field", country_name, field),
        }
    }

    log::info!(
        "loaded {} of {} countries with {:?} from {}",
        entries.len(),
        total,
        field,
        path.display()
    );
    Ok(entries)
}
