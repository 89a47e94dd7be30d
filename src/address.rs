//! # Address Normalization Module
//!
//! Turns the free-text address scraped from the register into
//! `street, SUBURB, STATE POSTCODE` by recovering the suburb from the trailing
//! tokens of the address with an approximate lookup against the
//! [`Gazetteer`].
//!
//! ## Algorithm
//!
//! 1. Drop isolated `.` tokens and collapse whitespace.
//! 2. Remove `(Hd …)` annotations; a hundred is never part of the address.
//! 3. Addresses ending in `HD <hundred>` are returned as-is, so hundred names
//!    are never substituted as suburbs.
//! 4. Try the trailing 4, 3, 2, then 1 tokens against the suburb keys within a
//!    small edit distance. The longest window that matches wins, so
//!    `PORT CLINTON` is preferred over `CLINTON`.
//! 5. No match leaves the cleaned address unchanged. Normalization never fails.

use std::sync::OnceLock;

use regex::Regex;
use strsim::levenshtein;

use crate::gazetteer::Gazetteer;

/// Default maximum edit distance for a suburb match
pub const DEFAULT_MAX_DISTANCE: usize = 1;

/// Default smallest number of trailing tokens tried as a suburb
pub const DEFAULT_MIN_WINDOW: usize = 1;

/// Default largest number of trailing tokens tried as a suburb
pub const DEFAULT_MAX_WINDOW: usize = 4;

/// Tuning for the suburb lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Maximum Levenshtein distance accepted for a match
    pub max_distance: usize,

    /// Smallest window size tried
    pub min_window: usize,

    /// Largest window size tried (tried first)
    pub max_window: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            min_window: DEFAULT_MIN_WINDOW,
            max_window: DEFAULT_MAX_WINDOW,
        }
    }
}

/// Outcome of normalizing one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// A suburb was recognized and the canonical suffix substituted
    Matched {
        address: String,
        suburb: String,
        distance: usize,
    },

    /// The address ends with a hundred name and was left alone
    HundredName(String),

    /// No suburb was recognized; the cleaned input is kept
    Unrecognized(String),
}

impl Normalized {
    pub fn address(&self) -> &str {
        match self {
            Normalized::Matched { address, .. } => address,
            Normalized::HundredName(address) | Normalized::Unrecognized(address) => address,
        }
    }

    pub fn into_address(self) -> String {
        match self {
            Normalized::Matched { address, .. } => address,
            Normalized::HundredName(address) | Normalized::Unrecognized(address) => address,
        }
    }
}

/// Normalize an address with the default configuration
pub fn normalize(raw: &str, gazetteer: &Gazetteer) -> String {
    normalize_with(raw, gazetteer, &NormalizerConfig::default()).into_address()
}

/// Normalize an address, reporting how the result was obtained
pub fn normalize_with(raw: &str, gazetteer: &Gazetteer, config: &NormalizerConfig) -> Normalized {
    let cleaned = clean(raw);
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let upper: Vec<String> = tokens.iter().map(|t| t.to_uppercase()).collect();

    if ends_with_hundred(&upper, gazetteer) {
        return Normalized::HundredName(cleaned);
    }

    let max_window = config.max_window.min(tokens.len());
    let min_window = config.min_window.max(1);

    for window in (min_window..=max_window).rev() {
        let split = tokens.len() - window;
        let candidate = upper[split..].join(" ");

        if let Some((suburb, canonical, distance)) =
            lookup(&candidate, gazetteer, config.max_distance)
        {
            let street = tokens[..split].join(" ");
            let street = street.trim_end_matches(',').trim_end();
            let address = if street.is_empty() {
                canonical.to_string()
            } else {
                format!("{}, {}", street, canonical)
            };

            return Normalized::Matched {
                address,
                suburb: suburb.to_string(),
                distance,
            };
        }
    }

    Normalized::Unrecognized(cleaned)
}

/// Strip formatting artifacts and hundred annotations
fn clean(raw: &str) -> String {
    static HUNDRED_ANNOTATION: OnceLock<Regex> = OnceLock::new();
    let hundred_annotation = HUNDRED_ANNOTATION
        .get_or_init(|| Regex::new(r"(?i)\(\s*hd\b[^)]*\)").expect("valid hundred pattern"));

    let without_dots = raw
        .split_whitespace()
        .filter(|token| *token != ".")
        .collect::<Vec<_>>()
        .join(" ");

    hundred_annotation
        .replace_all(&without_dots, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the uppercase tokens end with `HD <hundred name>`
fn ends_with_hundred(upper: &[String], gazetteer: &Gazetteer) -> bool {
    gazetteer.hundreds().any(|hundred| {
        let name: Vec<&str> = hundred.split(' ').collect();
        if upper.len() < name.len() + 1 {
            return false;
        }
        let start = upper.len() - name.len();
        upper[start - 1] == "HD" && upper[start..].iter().zip(&name).all(|(a, b)| a == b)
    })
}

/// Find the closest suburb key within `max_distance`
fn lookup<'a>(
    candidate: &'a str,
    gazetteer: &'a Gazetteer,
    max_distance: usize,
) -> Option<(&'a str, &'a str, usize)> {
    if let Some(canonical) = gazetteer.canonical(candidate) {
        return Some((candidate, canonical, 0));
    }

    let length = candidate.chars().count();
    gazetteer
        .suburbs()
        .filter(|(key, _)| key.chars().count().abs_diff(length) <= max_distance)
        .map(|(key, canonical)| (key, canonical, levenshtein(candidate, key)))
        .filter(|(_, _, distance)| *distance <= max_distance)
        .min_by_key(|(_, _, distance)| *distance)
}
