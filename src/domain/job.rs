//! Job, row and reporting types
//!
//! A job is one uploaded spreadsheet. Rows are opaque field maps; only the
//! client and competitor columns carry meaning for classification, every
//! other field is passed through untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::matching::{Classification, MatchStatus};

/// One spreadsheet row with column order preserved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetRow {
    fields: Vec<(String, String)>,
}

impl SpreadsheetRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (key, value) in pairs {
            row.insert(key, value);
        }
        row
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a field, replacing in place when the column already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields as a JSON object, as written to the error log.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }

    /// Trimmed, non-empty value of a column.
    pub fn site(&self, column: &str) -> Option<&str> {
        self.get(column).map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Per-row summary serialized into the `matching_details` column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingDetails {
    pub total_matches: usize,
    pub high_confidence_matches: usize,
    /// Rounded percentage, e.g. "72%"
    pub average_confidence: String,
    pub reason: String,
}

/// Classified result for one input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub row_index: usize,
    pub client_site: String,
    pub competitor_site: String,
    pub status: MatchStatus,
    pub confidence: f64,
    pub match_count: usize,
    pub details: Option<MatchingDetails>,
    pub error: Option<String>,
}

impl RowOutcome {
    pub fn skipped(row_index: usize, client_site: &str, competitor_site: &str) -> Self {
        Self {
            row_index,
            client_site: client_site.to_string(),
            competitor_site: competitor_site.to_string(),
            status: MatchStatus::Skipped,
            confidence: 0.0,
            match_count: 0,
            details: None,
            error: Some("missing client or competitor site".to_string()),
        }
    }

    /// Default outcome for a row whose processing raised an error.
    pub fn failed(row_index: usize, client_site: &str, competitor_site: &str, error: String) -> Self {
        Self {
            row_index,
            client_site: client_site.to_string(),
            competitor_site: competitor_site.to_string(),
            status: MatchStatus::Fail,
            confidence: 0.0,
            match_count: 0,
            details: None,
            error: Some(error),
        }
    }

    pub fn classified(
        row_index: usize,
        client_site: &str,
        competitor_site: &str,
        classification: &Classification,
        details: MatchingDetails,
    ) -> Self {
        Self {
            row_index,
            client_site: client_site.to_string(),
            competitor_site: competitor_site.to_string(),
            status: classification.status,
            confidence: classification.confidence,
            match_count: details.total_matches,
            details: Some(details),
            error: None,
        }
    }

    /// Merge this outcome onto its original row for the result spreadsheet.
    pub fn merge_into(&self, row: &SpreadsheetRow) -> SpreadsheetRow {
        let mut merged = row.clone();
        merged.insert("status", self.status.as_str());
        if self.status == MatchStatus::Skipped {
            return merged;
        }
        let details = self.details.clone().unwrap_or_default();
        let details_json = serde_json::to_string(&details).unwrap_or_else(|_| "{}".to_string());
        merged.insert("similarity_score", format_score(self.confidence));
        merged.insert("confidence", format_score(self.confidence));
        merged.insert("matching_details", details_json);
        if let Some(error) = &self.error {
            merged.insert("error", error.clone());
        }
        merged
    }
}

fn format_score(value: f64) -> String {
    format!("{value:.4}")
}

/// Work item delivered by the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub job_id: String,
    pub input_path: PathBuf,
    pub notify_email: Option<String>,
}

impl JobDescriptor {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            input_path: input_path.into(),
            notify_email: None,
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = job_id.into();
        self
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.notify_email = email;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown job status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLinks {
    pub excel: String,
    pub success_log: String,
    pub error_log: String,
}

impl DownloadLinks {
    pub fn for_job(base_url: &str, job_id: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            excel: format!("{base}/download/{job_id}/excel"),
            success_log: format!("{base}/download/{job_id}/success"),
            error_log: format!("{base}/download/{job_id}/error"),
        }
    }
}

/// Details attached to a status report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_log_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_log_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_links: Option<DownloadLinks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusDetails {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Stored status of a job as read back from the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub details: JobStatusDetails,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate counts over the category cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total: u64,
    pub valid: u64,
    pub expired: u64,
    pub invalid: u64,
}

/// Per-job outcome counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStats {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub marginal: u64,
    pub skipped: u64,
    pub average_confidence: f64,
    pub high_confidence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_insert_preserves_column_order() {
        let mut row = SpreadsheetRow::from_pairs([("client_site", "a.com"), ("competitors_site", "b.com")]);
        row.insert("client_site", "c.com");
        row.insert("status", "PASS");
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, ["client_site", "competitors_site", "status"]);
        assert_eq!(row.get("client_site"), Some("c.com"));
    }

    #[test]
    fn test_site_trims_and_rejects_blank() {
        let row = SpreadsheetRow::from_pairs([("a", "  x.com "), ("b", "   ")]);
        assert_eq!(row.site("a"), Some("x.com"));
        assert_eq!(row.site("b"), None);
        assert_eq!(row.site("missing"), None);
    }

    #[test]
    fn test_merge_skipped_only_adds_status() {
        let row = SpreadsheetRow::from_pairs([("client_site", "a.com"), ("note", "keep")]);
        let merged = RowOutcome::skipped(0, "a.com", "").merge_into(&row);
        assert_eq!(merged.get("status"), Some("SKIPPED"));
        assert_eq!(merged.get("note"), Some("keep"));
        assert_eq!(merged.get("matching_details"), None);
    }

    #[test]
    fn test_merge_classified_serializes_details_camel_case() {
        let row = SpreadsheetRow::from_pairs([("client_site", "a.com")]);
        let classification = Classification {
            status: MatchStatus::Pass,
            confidence: 0.72,
            reason: "ok".to_string(),
        };
        let details = MatchingDetails {
            total_matches: 4,
            high_confidence_matches: 3,
            average_confidence: "72%".to_string(),
            reason: "ok".to_string(),
        };
        let outcome = RowOutcome::classified(0, "a.com", "b.com", &classification, details);
        let merged = outcome.merge_into(&row);
        assert_eq!(merged.get("status"), Some("PASS"));
        assert_eq!(merged.get("confidence"), Some("0.7200"));
        let json = merged.get("matching_details").unwrap();
        assert!(json.contains("\"totalMatches\":4"));
        assert!(json.contains("\"averageConfidence\":\"72%\""));
    }

    #[test]
    fn test_download_links() {
        let links = DownloadLinks::for_job("http://localhost:8080/", "job-1");
        assert_eq!(links.excel, "http://localhost:8080/download/job-1/excel");
        assert_eq!(links.success_log, "http://localhost:8080/download/job-1/success");
        assert_eq!(links.error_log, "http://localhost:8080/download/job-1/error");
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert_eq!("pending".parse::<JobStatus>(), Ok(JobStatus::Pending));
    }
}
