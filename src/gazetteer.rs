//! # Gazetteer Module
//!
//! Reference data used by the address normalizer: the known suburbs of the
//! council area with their canonical `SUBURB, STATE POSTCODE` suffix, and the
//! hundred names (cadastral land divisions) that look like suburbs but must
//! never be treated as one.
//!
//! Both lists are loaded once at startup from flat files and are read-only
//! afterwards. A malformed suburb line is fatal: normalization quietly
//! degrades when the gazetteer is incomplete, so it is better not to run.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

/// Error type for reference data loading
#[derive(Debug, Error)]
pub enum GazetteerError {
    /// A reference file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A suburb line is not of the form `NAME,STATE POSTCODE`
    #[error("Malformed suburb entry on line {line}: {content:?}")]
    Malformed { line: usize, content: String },
}

/// Known suburbs and hundred names
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    /// Uppercase suburb name -> canonical `SUBURB, STATE POSTCODE`
    suburbs: BTreeMap<String, String>,

    /// Uppercase hundred names
    hundreds: BTreeSet<String>,
}

impl Gazetteer {
    /// Parse the suburb and hundred lists from their textual form
    pub fn parse(suburb_text: &str, hundred_text: &str) -> Result<Self, GazetteerError> {
        let mut suburbs = BTreeMap::new();

        for (index, line) in suburb_text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let (name, rest) = line.split_once(',').ok_or_else(|| GazetteerError::Malformed {
                line: index + 1,
                content: line.to_string(),
            })?;

            let name = canonical_tokens(name);
            if name.is_empty() {
                return Err(GazetteerError::Malformed {
                    line: index + 1,
                    content: line.to_string(),
                });
            }

            let rest = canonical_tokens(rest);
            let canonical = if rest.is_empty() {
                name.clone()
            } else {
                format!("{}, {}", name, rest)
            };
            suburbs.insert(name, canonical);
        }

        let hundreds = hundred_text
            .lines()
            .map(canonical_tokens)
            .filter(|name| !name.is_empty())
            .collect();

        Ok(Self { suburbs, hundreds })
    }

    /// Load the gazetteer from the two reference files
    #[instrument]
    pub fn from_files(suburbs_path: &Path, hundreds_path: &Path) -> Result<Self, GazetteerError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|source| GazetteerError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        let gazetteer = Self::parse(&read(suburbs_path)?, &read(hundreds_path)?)?;
        debug!(
            suburbs = gazetteer.suburbs.len(),
            hundreds = gazetteer.hundreds.len(),
            "Loaded gazetteer"
        );
        Ok(gazetteer)
    }

    /// Canonical suffix for an exact (uppercase) suburb key
    pub fn canonical(&self, key: &str) -> Option<&str> {
        self.suburbs.get(key).map(String::as_str)
    }

    /// Iterate over `(key, canonical)` pairs in key order
    pub fn suburbs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.suburbs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over the hundred names
    pub fn hundreds(&self) -> impl Iterator<Item = &str> {
        self.hundreds.iter().map(String::as_str)
    }

    pub fn suburb_count(&self) -> usize {
        self.suburbs.len()
    }

    pub fn hundred_count(&self) -> usize {
        self.hundreds.len()
    }
}

/// Uppercase, trim, and collapse inner whitespace
fn canonical_tokens(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}
