//! Per-job success and error logs
//!
//! Two plain-text files per job, one line per row. Both are truncated when
//! opened so a redelivered job overwrites rather than appends.

use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::application::errors::{JobError, JobResult};
use crate::domain::job::{RowOutcome, SpreadsheetRow};

pub fn success_log_path(logs_dir: &Path, job_id: &str) -> PathBuf {
    logs_dir.join(format!("{job_id}_success.log"))
}

pub fn error_log_path(logs_dir: &Path, job_id: &str) -> PathBuf {
    logs_dir.join(format!("{job_id}_error.log"))
}

pub struct JobLogs {
    job_id: String,
    success_path: PathBuf,
    error_path: PathBuf,
    success: File,
    error: File,
}

impl JobLogs {
    pub async fn create(logs_dir: &Path, job_id: &str) -> JobResult<Self> {
        fs::create_dir_all(logs_dir)
            .await
            .map_err(|e| JobError::log_write(logs_dir, e))?;

        let success_path = success_log_path(logs_dir, job_id);
        let error_path = error_log_path(logs_dir, job_id);
        let success = File::create(&success_path)
            .await
            .map_err(|e| JobError::log_write(&success_path, e))?;
        let error = File::create(&error_path)
            .await
            .map_err(|e| JobError::log_write(&error_path, e))?;

        Ok(Self {
            job_id: job_id.to_string(),
            success_path,
            error_path,
            success,
            error,
        })
    }

    pub fn success_path(&self) -> &Path {
        &self.success_path
    }

    pub fn error_path(&self) -> &Path {
        &self.error_path
    }

    pub async fn row_processed(&mut self, outcome: &RowOutcome) -> JobResult<()> {
        let line = format!(
            "Job {} - Row processed: Client: {}, Competitor: {}, Status: {}, Confidence: {:.1}%, Matches: {}\n",
            self.job_id,
            outcome.client_site,
            outcome.competitor_site,
            outcome.status,
            outcome.confidence * 100.0,
            outcome.match_count
        );
        write_line(&mut self.success, &self.success_path, &line).await
    }

    pub async fn row_skipped(&mut self, row: &SpreadsheetRow) -> JobResult<()> {
        let line = format!(
            "Job {} - Skipping row due to missing client_site or competitors_site: {}\n",
            self.job_id,
            row.to_json()
        );
        write_line(&mut self.error, &self.error_path, &line).await
    }

    pub async fn row_failed(&mut self, client: &str, competitor: &str, message: &str) -> JobResult<()> {
        let line = format!(
            "Job {} - Error processing row: Client: {}, Competitor: {}, Error: {}\n",
            self.job_id, client, competitor, message
        );
        write_line(&mut self.error, &self.error_path, &line).await
    }

    /// Flush both files; the paths stay valid after the handles drop.
    pub async fn finish(mut self) -> JobResult<(PathBuf, PathBuf)> {
        self.success
            .flush()
            .await
            .map_err(|e| JobError::log_write(&self.success_path, e))?;
        self.error
            .flush()
            .await
            .map_err(|e| JobError::log_write(&self.error_path, e))?;
        Ok((self.success_path, self.error_path))
    }
}

async fn write_line(file: &mut File, path: &Path, line: &str) -> JobResult<()> {
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| JobError::log_write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::MatchingDetails;
    use crate::domain::matching::{Classification, MatchStatus};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_logs_are_truncated_on_create() -> anyhow::Result<()> {
        let dir = tempdir()?;

        let mut logs = JobLogs::create(dir.path(), "job-1").await?;
        logs.row_failed("a.example", "b.example", "boom").await?;
        logs.finish().await?;

        let logs = JobLogs::create(dir.path(), "job-1").await?;
        let (success, error) = logs.finish().await?;

        assert_eq!(std::fs::read_to_string(success)?, "");
        assert_eq!(std::fs::read_to_string(error)?, "");
        Ok(())
    }

    #[tokio::test]
    async fn test_line_formats() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut logs = JobLogs::create(dir.path(), "job-2").await?;

        let classification = Classification {
            status: MatchStatus::Pass,
            confidence: 0.8772,
            reason: "4 matches, 87.7% average confidence".to_string(),
        };
        let details = MatchingDetails {
            total_matches: 4,
            high_confidence_matches: 4,
            average_confidence: "88%".to_string(),
            reason: classification.reason.clone(),
        };
        let outcome = RowOutcome::classified(0, "a.example", "b.example", &classification, details);
        logs.row_processed(&outcome).await?;
        logs.row_skipped(&SpreadsheetRow::from_pairs([("client_site", "a.example")]))
            .await?;

        let (success, error) = logs.finish().await?;
        assert_eq!(
            std::fs::read_to_string(success)?,
            "Job job-2 - Row processed: Client: a.example, Competitor: b.example, Status: PASS, Confidence: 87.7%, Matches: 4\n"
        );
        let error = std::fs::read_to_string(error)?;
        assert!(error.starts_with("Job job-2 - Skipping row due to missing client_site or competitors_site: "));
        assert!(error.trim_end().ends_with(r#"{"client_site":"a.example"}"#));
        Ok(())
    }
}
