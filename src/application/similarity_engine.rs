//! Pairwise category-set comparison
//!
//! Three probes run for every client label: a tokenized fuzzy search over
//! the competitor set (best hit only), an edit-distance check and a
//! token-cosine check against each competitor label. Accepted pairs are
//! pooled in probe order (fuzzy, edit distance, token cosine; client order
//! within each probe) and the first candidate for a (client, competitor)
//! pair wins before any scoring happens.

use std::collections::{HashMap, HashSet};
use strsim::{jaro_winkler, levenshtein};

use crate::domain::category::CategorySet;
use crate::domain::matching::{self, Classification, MatchCandidate, MatchMethod, MatchResult};
use crate::infrastructure::config::MatchingConfig;

#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    config: MatchingConfig,
    stoplist: HashSet<String>,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl SimilarityEngine {
    pub fn new(config: MatchingConfig) -> Self {
        let stoplist = config.stoplist.iter().map(|s| s.trim().to_lowercase()).collect();
        Self { config, stoplist }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Ranked matches between two category sets, highest confidence first.
    pub fn compare(&self, client: &CategorySet, competitor: &CategorySet) -> Vec<MatchResult> {
        if client.is_empty() || competitor.is_empty() {
            return Vec::new();
        }

        let client_labels = self.comparable(client);
        let competitor_labels = self.comparable(competitor);
        if client_labels.is_empty() || competitor_labels.is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for label in &client_labels {
            if let Some(candidate) = self.fuzzy_probe(label, &competitor_labels) {
                candidates.push(candidate);
            }
        }
        for label in &client_labels {
            candidates.extend(self.edit_distance_probe(label, &competitor_labels));
        }
        for label in &client_labels {
            candidates.extend(self.token_cosine_probe(label, &competitor_labels));
        }

        let mut seen = HashSet::new();
        let mut results: Vec<MatchResult> = candidates
            .into_iter()
            .filter(|c| seen.insert((c.client_label.clone(), c.competitor_label.clone())))
            .map(MatchResult::score)
            .collect();

        // stable: equal confidences keep probe order
        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        results
    }

    /// Classify with the configured thresholds.
    pub fn classify(&self, matches: &[MatchResult]) -> Classification {
        matching::classify(matches, &self.config.thresholds)
    }

    fn comparable<'a>(&self, set: &'a CategorySet) -> Vec<&'a str> {
        set.iter()
            .filter(|label| {
                let len = label.chars().count();
                (self.config.min_label_len..=self.config.max_label_len).contains(&len)
                    && !self.stoplist.contains(*label)
            })
            .collect()
    }

    fn fuzzy_probe(&self, label: &str, competitors: &[&str]) -> Option<MatchCandidate> {
        let mut best: Option<(&str, f64)> = None;
        for &competitor in competitors {
            let similarity = fuzzy_similarity(label, competitor);
            if best.is_none_or(|(_, s)| similarity > s) {
                best = Some((competitor, similarity));
            }
        }

        let (competitor, similarity) = best?;
        let distance = 1.0 - similarity;
        (distance <= self.config.fuzzy_max_distance).then(|| MatchCandidate {
            client_label: label.to_string(),
            competitor_label: competitor.to_string(),
            raw_similarity: similarity,
            method: MatchMethod::Fuzzy,
        })
    }

    fn edit_distance_probe(&self, label: &str, competitors: &[&str]) -> Vec<MatchCandidate> {
        competitors
            .iter()
            .filter_map(|competitor| {
                let distance = levenshtein(label, competitor);
                let longest = label.chars().count().max(competitor.chars().count());
                if longest == 0 {
                    return None;
                }
                let similarity = 1.0 - distance as f64 / longest as f64;
                (similarity >= self.config.edit_min_similarity && distance <= self.config.edit_max_distance)
                    .then(|| MatchCandidate {
                        client_label: label.to_string(),
                        competitor_label: (*competitor).to_string(),
                        raw_similarity: similarity,
                        method: MatchMethod::EditDistance,
                    })
            })
            .collect()
    }

    fn token_cosine_probe(&self, label: &str, competitors: &[&str]) -> Vec<MatchCandidate> {
        competitors
            .iter()
            .filter_map(|competitor| {
                let similarity = token_cosine(label, competitor);
                (similarity >= self.config.cosine_min_similarity).then(|| MatchCandidate {
                    client_label: label.to_string(),
                    competitor_label: (*competitor).to_string(),
                    raw_similarity: similarity,
                    method: MatchMethod::TokenCosine,
                })
            })
            .collect()
    }
}

fn tokens(label: &str) -> Vec<&str> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Best of whole-string Jaro-Winkler and the mean best-token Jaro-Winkler
pub fn fuzzy_similarity(a: &str, b: &str) -> f64 {
    let whole = jaro_winkler(a, b);
    let (ta, tb) = (tokens(a), tokens(b));
    if ta.is_empty() || tb.is_empty() {
        return whole;
    }

    let token_mean = ta
        .iter()
        .map(|x| tb.iter().map(|y| jaro_winkler(x, y)).fold(0.0_f64, f64::max))
        .sum::<f64>()
        / ta.len() as f64;

    whole.max(token_mean)
}

fn frequencies(label: &str) -> HashMap<&str, f64> {
    let mut counts = HashMap::new();
    for token in tokens(label) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity of word-frequency vectors
pub fn token_cosine(a: &str, b: &str) -> f64 {
    let (fa, fb) = (frequencies(a), frequencies(b));
    if fa.is_empty() || fb.is_empty() {
        return 0.0;
    }

    let dot: f64 = fa.iter().filter_map(|(t, x)| fb.get(t).map(|y| x * y)).sum();
    let norm = |v: &HashMap<&str, f64>| v.values().map(|x| x * x).sum::<f64>().sqrt();
    dot / (norm(&fa) * norm(&fb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::matching::{MatchStatus, REASON_NO_MATCHES};

    fn set(labels: &[&str]) -> CategorySet {
        CategorySet::from_raw_labels(labels)
    }

    #[test]
    fn test_shared_category_scores_high() {
        let engine = SimilarityEngine::default();
        let matches = engine.compare(&set(&["electronics", "shoes"]), &set(&["electronics", "footwear"]));
        let hit = matches
            .iter()
            .find(|m| m.client_label() == "electronics" && m.competitor_label() == "electronics")
            .expect("electronics should match");
        assert!(hit.confidence >= 0.6);
    }

    #[test]
    fn test_empty_side_yields_no_matches_and_fail() {
        let engine = SimilarityEngine::default();
        let matches = engine.compare(&set(&[]), &set(&["anything"]));
        assert!(matches.is_empty());

        let classification = engine.classify(&matches);
        assert_eq!(classification.status, MatchStatus::Fail);
        assert_eq!(classification.confidence, 0.0);
        assert_eq!(classification.reason, REASON_NO_MATCHES);
    }

    #[test]
    fn test_duplicate_pair_keeps_first_probe_not_best_score() {
        // fuzzy accepts this pair first; edit distance would score it higher
        let engine = SimilarityEngine::default();
        let matches = engine.compare(&set(&["kitchen tools"]), &set(&["kitchen tool"]));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].method(), MatchMethod::Fuzzy);
        assert!(matches[0].confidence < 1.0);
    }

    #[test]
    fn test_stoplist_and_length_filter() {
        let mut config = MatchingConfig::default();
        config.stoplist = vec!["gift cards".to_string()];
        let engine = SimilarityEngine::new(config);

        let matches = engine.compare(&set(&["gift cards"]), &set(&["gift cards"]));
        assert!(matches.is_empty());
    }

    #[test]
    fn test_results_sorted_descending() {
        let engine = SimilarityEngine::default();
        let matches = engine.compare(
            &set(&["garden furniture", "books", "board games"]),
            &set(&["garden furniture", "book", "games board"]),
        );
        assert!(matches.len() >= 2);
        assert!(matches.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert!(matches.iter().all(|m| m.confidence <= 1.0));
    }

    #[test]
    fn test_token_cosine() {
        assert!((token_cosine("board games", "games board") - 1.0).abs() < 1e-9);
        assert!((token_cosine("kitchen tools", "kitchen tool") - 0.5).abs() < 1e-9);
        assert_eq!(token_cosine("toys", "books"), 0.0);
    }

    #[test]
    fn test_fuzzy_similarity_bounds() {
        assert!((fuzzy_similarity("laptops", "laptops") - 1.0).abs() < 1e-9);
        let s = fuzzy_similarity("shoes", "footwear");
        assert!((0.0..0.7).contains(&s));
    }

    #[test]
    fn test_compare_is_deterministic() {
        let engine = SimilarityEngine::default();
        let client = set(&["mens clothing", "womens clothing", "accessories", "shoes"]);
        let competitor = set(&["men clothing", "women clothing", "accessory", "sneakers"]);
        assert_eq!(engine.compare(&client, &competitor), engine.compare(&client, &competitor));
    }
}
