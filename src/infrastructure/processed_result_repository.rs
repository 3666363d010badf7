//! Repository for per-row job outcomes
//!
//! Saving a job replaces every row previously stored for it, so a
//! redelivered job never duplicates results.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::domain::job::{JobStats, MatchingDetails, RowOutcome};
use crate::domain::matching::MatchStatus;
use crate::domain::repositories::ProcessedResultRepository;
use crate::infrastructure::database_connection::to_db_timestamp;

/// Confidence at or above which a row counts as high confidence in job stats
pub const HIGH_CONFIDENCE_ROW: f64 = 0.8;

pub struct SqliteProcessedResultRepository {
    pool: SqlitePool,
}

impl SqliteProcessedResultRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_outcome(row: &sqlx::sqlite::SqliteRow) -> Result<RowOutcome> {
        let status: String = row.try_get("status")?;
        let details: Option<String> = row.try_get("matching_details")?;
        let details = details
            .as_deref()
            .map(serde_json::from_str::<MatchingDetails>)
            .transpose()?;

        Ok(RowOutcome {
            row_index: row.try_get::<i64, _>("row_index")? as usize,
            client_site: row.try_get("client_site")?,
            competitor_site: row.try_get("competitor_site")?,
            status: status.parse::<MatchStatus>().map_err(|e| anyhow!(e))?,
            confidence: row.try_get("confidence")?,
            match_count: row.try_get::<i64, _>("matched_categories_count")? as usize,
            details,
            error: row.try_get("error_message")?,
        })
    }
}

#[async_trait]
impl ProcessedResultRepository for SqliteProcessedResultRepository {
    async fn save_outcomes(&self, job_id: &str, outcomes: &[RowOutcome]) -> Result<()> {
        let now = to_db_timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM processed_results WHERE job_id = ?")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        for outcome in outcomes {
            let details = outcome
                .details
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;

            sqlx::query(
                r"
                INSERT INTO processed_results (
                    job_id, row_index, client_site, competitor_site, status, confidence,
                    matched_categories_count, matching_details, error_message, created_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(job_id)
            .bind(outcome.row_index as i64)
            .bind(&outcome.client_site)
            .bind(&outcome.competitor_site)
            .bind(outcome.status.as_str())
            .bind(outcome.confidence)
            .bind(outcome.match_count as i64)
            .bind(details)
            .bind(outcome.error.as_deref())
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!("Stored {} outcomes for job {}", outcomes.len(), job_id);
        Ok(())
    }

    async fn find_by_job(&self, job_id: &str) -> Result<Vec<RowOutcome>> {
        let rows = sqlx::query(
            r"
            SELECT row_index, client_site, competitor_site, status, confidence,
                   matched_categories_count, matching_details, error_message
            FROM processed_results WHERE job_id = ? ORDER BY row_index
            ",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_outcome).collect()
    }

    async fn job_stats(&self, job_id: &str) -> Result<JobStats> {
        let row = sqlx::query(
            r"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'PASS' THEN 1 ELSE 0 END), 0) AS passed,
                COALESCE(SUM(CASE WHEN status = 'FAIL' THEN 1 ELSE 0 END), 0) AS failed,
                COALESCE(SUM(CASE WHEN status = 'MARGINAL' THEN 1 ELSE 0 END), 0) AS marginal,
                COALESCE(SUM(CASE WHEN status = 'SKIPPED' THEN 1 ELSE 0 END), 0) AS skipped,
                COALESCE(AVG(confidence), 0.0) AS average_confidence,
                COALESCE(SUM(CASE WHEN confidence >= ? THEN 1 ELSE 0 END), 0) AS high_confidence
            FROM processed_results WHERE job_id = ?
            ",
        )
        .bind(HIGH_CONFIDENCE_ROW)
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(JobStats {
            total: row.try_get::<i64, _>("total")? as u64,
            passed: row.try_get::<i64, _>("passed")? as u64,
            failed: row.try_get::<i64, _>("failed")? as u64,
            marginal: row.try_get::<i64, _>("marginal")? as u64,
            skipped: row.try_get::<i64, _>("skipped")? as u64,
            average_confidence: row.try_get("average_confidence")?,
            high_confidence: row.try_get::<i64, _>("high_confidence")? as u64,
        })
    }
}
