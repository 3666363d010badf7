//! Match evidence and classification types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::constants::scoring::{
    COSINE_METHOD_WEIGHT, DEFAULT_CATEGORY_WEIGHT, EDIT_DISTANCE_METHOD_WEIGHT,
    FUZZY_METHOD_WEIGHT, HIGH_VALUE_CATEGORY_WEIGHT, HIGH_VALUE_TERMS,
};

/// Probe that accepted a label pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMethod {
    Fuzzy,
    EditDistance,
    TokenCosine,
}

impl MatchMethod {
    pub const fn weight(self) -> f64 {
        match self {
            Self::Fuzzy => FUZZY_METHOD_WEIGHT,
            Self::EditDistance => EDIT_DISTANCE_METHOD_WEIGHT,
            Self::TokenCosine => COSINE_METHOD_WEIGHT,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fuzzy => "fuzzy",
            Self::EditDistance => "edit-distance",
            Self::TokenCosine => "token-cosine",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category weight for a client label: boosted when it names a high-value vertical.
pub fn category_weight(client_label: &str) -> f64 {
    if HIGH_VALUE_TERMS.iter().any(|term| client_label.contains(term)) {
        HIGH_VALUE_CATEGORY_WEIGHT
    } else {
        DEFAULT_CATEGORY_WEIGHT
    }
}

/// An accepted label pair before scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub client_label: String,
    pub competitor_label: String,
    pub raw_similarity: f64,
    pub method: MatchMethod,
}

/// A scored match between one client label and one competitor label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(flatten)]
    pub candidate: MatchCandidate,
    pub confidence: f64,
}

impl MatchResult {
    /// confidence = min(similarity x method weight x category weight, 1.0)
    pub fn score(candidate: MatchCandidate) -> Self {
        let confidence = (candidate.raw_similarity
            * candidate.method.weight()
            * category_weight(&candidate.client_label))
            .min(1.0);
        Self { candidate, confidence }
    }

    /// Build a result with an explicit confidence (tests, replays).
    pub fn with_confidence(candidate: MatchCandidate, confidence: f64) -> Self {
        Self { candidate, confidence }
    }

    pub fn client_label(&self) -> &str {
        &self.candidate.client_label
    }

    pub fn competitor_label(&self) -> &str {
        &self.candidate.competitor_label
    }

    pub fn method(&self) -> MatchMethod {
        self.candidate.method
    }
}

/// Classification thresholds. Always supplied from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub min_matches: usize,
    pub min_confidence: f64,
    pub min_average_similarity: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_matches: 3,
            min_confidence: 0.6,
            min_average_similarity: 0.55,
        }
    }
}

/// Row classification status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStatus {
    Pass,
    Fail,
    Marginal,
    Skipped,
}

impl MatchStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Marginal => "MARGINAL",
            Self::Skipped => "SKIPPED",
        }
    }

    /// Ordering used by monotonicity checks: FAIL < MARGINAL < PASS.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Skipped | Self::Fail => 0,
            Self::Marginal => 1,
            Self::Pass => 2,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PASS" => Ok(Self::Pass),
            "FAIL" => Ok(Self::Fail),
            "MARGINAL" => Ok(Self::Marginal),
            "SKIPPED" => Ok(Self::Skipped),
            other => Err(format!("Unknown match status: {other}")),
        }
    }
}

pub const REASON_NO_MATCHES: &str = "no matches";
pub const REASON_INSUFFICIENT: &str = "insufficient high-confidence matches";
pub const REASON_BELOW_AVERAGE: &str = "average below threshold";

/// Outcome of the three-tier classification rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub status: MatchStatus,
    pub confidence: f64,
    pub reason: String,
}

impl Classification {
    pub fn no_matches() -> Self {
        Self {
            status: MatchStatus::Fail,
            confidence: 0.0,
            reason: REASON_NO_MATCHES.to_string(),
        }
    }
}

/// Apply the classification rule to a set of scored matches.
///
/// - no matches: FAIL at 0
/// - fewer than `min_matches` results at or above `min_confidence`: FAIL at the best confidence
/// - otherwise the mean over all matches decides PASS or MARGINAL
pub fn classify(matches: &[MatchResult], thresholds: &Thresholds) -> Classification {
    if matches.is_empty() {
        return Classification::no_matches();
    }

    let high_confidence = matches
        .iter()
        .filter(|m| m.confidence >= thresholds.min_confidence)
        .count();

    if high_confidence < thresholds.min_matches {
        let best = matches.iter().map(|m| m.confidence).fold(0.0_f64, f64::max);
        return Classification {
            status: MatchStatus::Fail,
            confidence: best,
            reason: REASON_INSUFFICIENT.to_string(),
        };
    }

    let mean = matches.iter().map(|m| m.confidence).sum::<f64>() / matches.len() as f64;
    if mean >= thresholds.min_average_similarity {
        Classification {
            status: MatchStatus::Pass,
            confidence: mean,
            reason: format!(
                "{} matches, {:.1}% average confidence",
                matches.len(),
                mean * 100.0
            ),
        }
    } else {
        Classification {
            status: MatchStatus::Marginal,
            confidence: mean,
            reason: REASON_BELOW_AVERAGE.to_string(),
        }
    }
}
