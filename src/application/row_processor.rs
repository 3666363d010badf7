//! Classification of a single spreadsheet row

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::errors::RowError;
use crate::application::similarity_engine::SimilarityEngine;
use crate::domain::category::CategorySet;
use crate::domain::job::{MatchingDetails, RowOutcome, SpreadsheetRow};

/// Resolved categories keyed by trimmed site URL
pub type ResolvedCategories = HashMap<String, CategorySet>;

/// Classifies rows for the batch orchestrator
pub trait RowClassifier: Send + Sync {
    fn sites<'a>(&self, row: &'a SpreadsheetRow) -> (Option<&'a str>, Option<&'a str>);

    fn process(&self, row_index: usize, row: &SpreadsheetRow, resolved: &ResolvedCategories) -> Result<RowOutcome, RowError>;
}

pub struct RowProcessor {
    engine: Arc<SimilarityEngine>,
    client_column: String,
    competitor_column: String,
}

impl RowProcessor {
    pub fn new(engine: Arc<SimilarityEngine>, client_column: impl Into<String>, competitor_column: impl Into<String>) -> Self {
        Self {
            engine,
            client_column: client_column.into(),
            competitor_column: competitor_column.into(),
        }
    }

    pub fn client_column(&self) -> &str {
        &self.client_column
    }

    pub fn competitor_column(&self) -> &str {
        &self.competitor_column
    }

    /// Trimmed (client, competitor) sites; `None` for a blank or missing cell.
    pub fn sites<'a>(&self, row: &'a SpreadsheetRow) -> (Option<&'a str>, Option<&'a str>) {
        (row.site(&self.client_column), row.site(&self.competitor_column))
    }

    /// Classify one row against already-resolved categories. A row missing
    /// either site is SKIPPED without touching the engine.
    pub fn process(&self, row_index: usize, row: &SpreadsheetRow, resolved: &ResolvedCategories) -> Result<RowOutcome, RowError> {
        let (Some(client), Some(competitor)) = self.sites(row) else {
            return Ok(RowOutcome::skipped(
                row_index,
                row.get(&self.client_column).unwrap_or_default(),
                row.get(&self.competitor_column).unwrap_or_default(),
            ));
        };

        let empty = CategorySet::new();
        let client_categories = resolved.get(client).unwrap_or(&empty);
        let competitor_categories = resolved.get(competitor).unwrap_or(&empty);

        tracing::debug!(
            "Categories found: {} ({}) vs {} ({})",
            client_categories.len(),
            client,
            competitor_categories.len(),
            competitor
        );

        let matches = self.engine.compare(client_categories, competitor_categories);
        let classification = self.engine.classify(&matches);

        if !classification.confidence.is_finite() {
            return Err(RowError::NonFiniteScore {
                client: client.to_string(),
                competitor: competitor.to_string(),
                value: classification.confidence,
            });
        }

        let min_confidence = self.engine.config().thresholds.min_confidence;
        let details = MatchingDetails {
            total_matches: matches.len(),
            high_confidence_matches: matches.iter().filter(|m| m.confidence >= min_confidence).count(),
            average_confidence: format!("{}%", (classification.confidence * 100.0).round() as i64),
            reason: classification.reason.clone(),
        };

        Ok(RowOutcome::classified(row_index, client, competitor, &classification, details))
    }
}

impl RowClassifier for RowProcessor {
    fn sites<'a>(&self, row: &'a SpreadsheetRow) -> (Option<&'a str>, Option<&'a str>) {
        RowProcessor::sites(self, row)
    }

    fn process(&self, row_index: usize, row: &SpreadsheetRow, resolved: &ResolvedCategories) -> Result<RowOutcome, RowError> {
        RowProcessor::process(self, row_index, row, resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::matching::MatchStatus;

    fn processor() -> RowProcessor {
        RowProcessor::new(Arc::new(SimilarityEngine::default()), "client_site", "competitors_site")
    }

    fn resolved() -> ResolvedCategories {
        let mut map = ResolvedCategories::new();
        map.insert(
            "client.example".to_string(),
            CategorySet::from_raw_labels(["electronics", "home garden", "books", "toys"]),
        );
        map.insert(
            "rival.example".to_string(),
            CategorySet::from_raw_labels(["electronics", "home garden", "books", "toys"]),
        );
        map
    }

    #[test]
    fn test_missing_competitor_is_skipped() {
        let row = SpreadsheetRow::from_pairs([("client_site", "client.example"), ("competitors_site", "  ")]);
        let outcome = processor().process(0, &row, &resolved()).unwrap();
        assert_eq!(outcome.status, MatchStatus::Skipped);
        assert!(outcome.details.is_none());
    }

    #[test]
    fn test_identical_sets_pass() {
        let row = SpreadsheetRow::from_pairs([("client_site", " client.example "), ("competitors_site", "rival.example")]);
        let outcome = processor().process(3, &row, &resolved()).unwrap();
        assert_eq!(outcome.row_index, 3);
        assert_eq!(outcome.status, MatchStatus::Pass);
        let details = outcome.details.unwrap();
        assert_eq!(details.total_matches, 4);
        assert_eq!(details.high_confidence_matches, 4);
        assert_eq!(details.average_confidence, "100%");
    }

    #[test]
    fn test_unresolved_site_fails_with_no_matches() {
        let row = SpreadsheetRow::from_pairs([("client_site", "client.example"), ("competitors_site", "down.example")]);
        let outcome = processor().process(0, &row, &resolved()).unwrap();
        assert_eq!(outcome.status, MatchStatus::Fail);
        assert_eq!(outcome.confidence, 0.0);
        assert_eq!(outcome.details.unwrap().reason, "no matches");
    }
}
