//! Parser and resolver tunables, loaded from `schema/heuristics.yaml`.
//!
//! The bundled copy is compiled into the binary; a file on disk (found
//! under `schema/` or passed explicitly) takes precedence.

use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::Qualifier;

const HEURISTICS_FILE: &str = "heuristics.yaml";
const BUNDLED_HEURISTICS: &str = include_str!("../schema/heuristics.yaml");

static BUNDLED: OnceCell<Heuristics> = OnceCell::new();

#[derive(Debug, Clone, Deserialize)]
pub struct Heuristics {
    pub qualifiers: Vec<QualifierRule>,
    #[serde(default)]
    pub catch_all_words: Vec<String>,
    pub fuzzy: FuzzyThresholds,
    #[serde(default = "default_review_share")]
    pub review_share: f64,
    #[serde(default)]
    pub languages: LookupRules,
    #[serde(default)]
    pub countries: LookupRules,
}

fn default_review_share() -> f64 {
    5.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualifierRule {
    pub keyword: String,
    pub qualifier: Qualifier,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FuzzyThresholds {
    #[serde(default)]
    pub thresholds: Vec<ThresholdBucket>,
    pub default_max_distance: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ThresholdBucket {
    pub max_len: usize,
    pub max_distance: usize,
}

impl FuzzyThresholds {
    /// Largest edit distance tolerated for a label of `len` characters.
    pub fn max_distance(&self, len: usize) -> usize {
        self.thresholds
            .iter()
            .find(|bucket| len <= bucket.max_len)
            .map(|bucket| bucket.max_distance)
            .unwrap_or(self.default_max_distance)
    }
}

/// Name rewriting applied before looking a label up in a code table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupRules {
    #[serde(default)]
    pub ignored_words: Vec<String>,
    #[serde(default)]
    pub replaced_words: HashMap<String, String>,
    /// Factbook spelling -> canonical spelling
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    /// Names with no entry in the reference dataset, mapped straight to a code
    #[serde(default)]
    pub fixed_codes: HashMap<String, String>,
}

impl Heuristics {
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Load from an explicit path, else from `schema/heuristics.yaml` if one
    /// exists nearby, else fall back to the bundled copy.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match find_schema_file(HEURISTICS_FILE) {
            Ok(path) => {
                log::debug!("loading heuristics from {}", path.display());
                Self::load(&path)
            }
            Err(_) => Ok(Self::bundled().clone()),
        }
    }

    pub fn bundled() -> &'static Heuristics {
        BUNDLED.get_or_init(|| {
            Self::from_yaml(BUNDLED_HEURISTICS).expect("bundled schema/heuristics.yaml is valid")
        })
    }

    /// Earliest vocabulary keyword in a parenthetical group, matched as
    /// whole words (multi-word keywords included).
    pub fn qualifier_in(&self, group: &str) -> Option<Qualifier> {
        let words: Vec<String> = group
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        let padded = format!(" {} ", words.join(" "));

        self.qualifiers
            .iter()
            .filter_map(|rule| {
                let needle = format!(" {} ", rule.keyword.to_lowercase());
                padded.find(&needle).map(|pos| (pos, rule.qualifier))
            })
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, qualifier)| qualifier)
    }

    pub fn is_catch_all(&self, word: &str) -> bool {
        self.catch_all_words.iter().any(|w| w.eq_ignore_ascii_case(word))
    }
}

pub fn find_schema_file(filename: &str) -> Result<PathBuf> {
    let candidates = [
        PathBuf::from(format!("schema/{}", filename)),
        PathBuf::from(format!("../schema/{}", filename)),
    ];
    candidates
        .into_iter()
        .find(|p| p.exists())
        .ok_or_else(|| Error::SchemaNotFound(filename.to_string()))
}
