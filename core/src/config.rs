use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::Field;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Multipliers applied to a field's raw token frequencies at insertion time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub title: f64,
    pub authors: f64,
    pub keywords: f64,
    pub year: f64,
    #[serde(rename = "abstract")]
    pub abstract_text: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self { title: 3.0, authors: 2.5, keywords: 2.0, year: 1.5, abstract_text: 1.0 }
    }
}

impl FieldWeights {
    pub fn weight(&self, field: Field) -> f64 {
        match field {
            Field::Title => self.title,
            Field::Authors => self.authors,
            Field::Keywords => self.keywords,
            Field::Year => self.year,
            Field::Abstract => self.abstract_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub stemming: bool,
    pub lemmatization: bool,
    /// Newline-separated stopword list replacing the built-in English list.
    pub stopwords_path: Option<PathBuf>,
    /// Tab-separated `inflected<TAB>lemma` lines merged over the built-in table.
    pub lemmas_path: Option<PathBuf>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self { stemming: true, lemmatization: true, stopwords_path: None, lemmas_path: None }
    }
}

/// Construction-time configuration of an index store. Never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub field_weights: FieldWeights,
    pub normalizer: NormalizerConfig,
}

impl IndexConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::default()),
        }
    }
}
