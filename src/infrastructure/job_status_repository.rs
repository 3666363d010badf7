//! Job status sink backed by the `jobs` table

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::domain::job::{JobRecord, JobStatus, JobStatusDetails};
use crate::domain::repositories::JobStatusRepository;
use crate::infrastructure::database_connection::{parse_db_timestamp, to_db_timestamp};

pub struct SqliteJobStatusRepository {
    pool: SqlitePool,
}

impl SqliteJobStatusRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<JobRecord> {
        let status: String = row.try_get("status")?;
        let status = status.parse::<JobStatus>().map_err(|e| anyhow!(e))?;
        let details: String = row.try_get("details")?;

        let optional_time = |column: &str| -> Result<Option<chrono::DateTime<Utc>>> {
            let value: Option<String> = row.try_get(column)?;
            value.as_deref().map(parse_db_timestamp).transpose()
        };

        Ok(JobRecord {
            job_id: row.try_get("id")?,
            status,
            details: serde_json::from_str(&details)?,
            started_at: optional_time("started_at")?,
            completed_at: optional_time("completed_at")?,
            updated_at: parse_db_timestamp(&row.try_get::<String, _>("updated_at")?)?,
        })
    }
}

#[async_trait]
impl JobStatusRepository for SqliteJobStatusRepository {
    async fn report(&self, job_id: &str, status: JobStatus, details: &JobStatusDetails) -> Result<()> {
        let now = to_db_timestamp(Utc::now());
        let details_json = serde_json::to_string(details)?;
        let started_at = (status == JobStatus::Processing).then(|| now.clone());
        let completed_at = status.is_terminal().then(|| now.clone());

        sqlx::query(
            r"
            INSERT INTO jobs (id, status, details, error_message, started_at, completed_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                details = excluded.details,
                error_message = excluded.error_message,
                started_at = COALESCE(excluded.started_at, jobs.started_at),
                completed_at = excluded.completed_at,
                updated_at = excluded.updated_at
            ",
        )
        .bind(job_id)
        .bind(status.as_str())
        .bind(details_json)
        .bind(details.error.as_deref())
        .bind(started_at)
        .bind(completed_at)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Job {} -> {}", job_id, status);
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let row = sqlx::query(
            "SELECT id, status, details, started_at, completed_at, updated_at FROM jobs WHERE id = ?",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }
}
