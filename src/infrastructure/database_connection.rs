// Database connection and pool management
// This module handles SQLite database connections using sqlx

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        if !in_memory {
            let db_path = database_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let db_path = db_path.split('?').next().unwrap_or(db_path);
            if let Some(parent) = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(10);
        if in_memory {
            // every in-memory connection is its own database: keep exactly one, forever
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to {database_url}"))?;

        Ok(Self { pool })
    }

    /// Shared in-memory database, already migrated
    pub async fn in_memory() -> Result<Self> {
        let db = Self::new("sqlite::memory:").await?;
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_categories_sql = r"
            CREATE TABLE IF NOT EXISTS scraped_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url_hash TEXT NOT NULL UNIQUE,
                url TEXT NOT NULL,
                categories TEXT NOT NULL DEFAULT '[]',
                source TEXT NOT NULL DEFAULT 'fallback',
                scraped_at TEXT NOT NULL,
                ttl_secs INTEGER NOT NULL,
                expires_at TEXT,
                last_accessed_at TEXT,
                access_count INTEGER NOT NULL DEFAULT 0,
                is_valid BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        ";

        let create_jobs_sql = r"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL DEFAULT 'pending',
                details TEXT NOT NULL DEFAULT '{}',
                error_message TEXT,
                started_at TEXT,
                completed_at TEXT,
                updated_at TEXT NOT NULL
            )
        ";

        let create_results_sql = r"
            CREATE TABLE IF NOT EXISTS processed_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL,
                row_index INTEGER NOT NULL,
                client_site TEXT NOT NULL,
                competitor_site TEXT NOT NULL,
                status TEXT NOT NULL,
                confidence REAL NOT NULL DEFAULT 0,
                matched_categories_count INTEGER NOT NULL DEFAULT 0,
                matching_details TEXT,
                error_message TEXT,
                created_at TEXT NOT NULL
            )
        ";

        let create_indexes_sql = [
            "CREATE INDEX IF NOT EXISTS idx_scraped_categories_expires_at ON scraped_categories (expires_at)",
            "CREATE INDEX IF NOT EXISTS idx_scraped_categories_scraped_at ON scraped_categories (scraped_at)",
            "CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs (status)",
            "CREATE INDEX IF NOT EXISTS idx_processed_results_job_row ON processed_results (job_id, row_index)",
        ];

        sqlx::query(create_categories_sql).execute(&self.pool).await?;
        sqlx::query(create_jobs_sql).execute(&self.pool).await?;
        sqlx::query(create_results_sql).execute(&self.pool).await?;
        for sql in create_indexes_sql {
            sqlx::query(sql).execute(&self.pool).await?;
        }

        Ok(())
    }
}

/// Fixed-width UTC timestamp so that text comparison orders correctly
pub fn to_db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_db_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("Failed to parse timestamp {}: {}", value, e))
}
