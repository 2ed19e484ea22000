use std::path::PathBuf;

use thiserror::Error;

use crate::model::TableKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse heuristics YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0} code table is empty")]
    EmptyTable(TableKind),
    #[error("invalid dataset {path:?}: {reason}")]
    InvalidDataset { path: PathBuf, reason: String },
    #[error("could not find schema/{0}; use --heuristics to specify path")]
    SchemaNotFound(String),
}
