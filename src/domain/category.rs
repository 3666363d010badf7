//! Category labels and per-URL category sets
//!
//! A label is cleaned the same way no matter which extraction tier found it,
//! so two sites exposing "Home & Garden" and "home-garden" meet in the middle.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::constants::labels::{MAX_CATEGORIES, MAX_LABEL_LEN, MIN_LABEL_LEN};

/// Normalize a raw label: lowercase, punctuation to spaces, whitespace collapsed.
///
/// Word characters, whitespace and `-` survive; everything else becomes a space.
pub fn clean_label(raw: &str) -> String {
    let replaced: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a cleaned label may enter a category set.
pub fn is_acceptable_label(label: &str) -> bool {
    let len = label.chars().count();
    if !(MIN_LABEL_LEN..=MAX_LABEL_LEN).contains(&len) {
        return false;
    }
    if label.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    label.chars().any(|c| c.is_ascii_alphabetic())
}

/// Deduplicated category labels for one URL, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean, filter, dedupe and cap raw labels.
    pub fn from_raw_labels<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_raw_labels_capped(raw, MAX_CATEGORIES)
    }

    pub fn from_raw_labels_capped<I, S>(raw: I, cap: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let labels = raw
            .into_iter()
            .map(|label| clean_label(label.as_ref()))
            .filter(|label| is_acceptable_label(label))
            .filter(|label| seen.insert(label.clone()))
            .take(cap)
            .collect();
        Self(labels)
    }

    /// Wrap labels that were already cleaned (e.g. read back from the cache).
    pub fn from_cleaned(labels: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        Self(labels.into_iter().filter(|l| seen.insert(l.clone())).collect())
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }

    /// Order-insensitive comparison.
    pub fn same_labels(&self, other: &Self) -> bool {
        let a: HashSet<&str> = self.iter().collect();
        let b: HashSet<&str> = other.iter().collect();
        a == b
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Extraction tier a cache record is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategorySource {
    StructuredData,
    Navigation,
    Products,
    Links,
    Fallback,
}

impl CategorySource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StructuredData => "structured-data",
            Self::Navigation => "navigation",
            Self::Products => "products",
            Self::Links => "links",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for CategorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategorySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structured-data" => Ok(Self::StructuredData),
            "navigation" => Ok(Self::Navigation),
            "products" => Ok(Self::Products),
            "links" => Ok(Self::Links),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!("Unknown category source: {other}")),
        }
    }
}

/// Result of extracting one URL: the set plus its dominant tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryExtraction {
    pub categories: CategorySet,
    pub source: CategorySource,
}

impl CategoryExtraction {
    pub fn empty() -> Self {
        Self {
            categories: CategorySet::new(),
            source: CategorySource::Fallback,
        }
    }
}
