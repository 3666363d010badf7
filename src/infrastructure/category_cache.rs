//! SQLite-backed category cache
//!
//! One row per URL hash. A row is served only while it is valid and not
//! past `expires_at`; expired rows linger until the sweeper deletes them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use sqlx::{Row, SqlitePool};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::category::{CategorySet, CategorySource};
use crate::domain::job::CacheStats;
use crate::domain::repositories::CategoryCacheRepository;
use crate::infrastructure::database_connection::{parse_db_timestamp, to_db_timestamp};

/// Cache key: BLAKE3 hex digest of the trimmed, lowercased URL
pub fn url_hash(url: &str) -> String {
    blake3::hash(url.trim().to_lowercase().as_bytes()).to_hex().to_string()
}

pub struct SqliteCategoryCache {
    pool: SqlitePool,
    ttl: TimeDelta,
}

impl SqliteCategoryCache {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Result<Self> {
        let ttl = TimeDelta::from_std(ttl).context("Cache TTL out of range")?;
        Ok(Self { pool, ttl })
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    async fn touch(&self, hash: &str) -> Result<()> {
        sqlx::query(
            "UPDATE scraped_categories SET last_accessed_at = ?, access_count = access_count + 1 WHERE url_hash = ?",
        )
        .bind(to_db_timestamp(Utc::now()))
        .bind(hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CategoryCacheRepository for SqliteCategoryCache {
    async fn lookup(&self, url: &str) -> Result<Option<CategorySet>> {
        let hash = url_hash(url);
        let row = sqlx::query(
            "SELECT categories, expires_at, is_valid FROM scraped_categories WHERE url_hash = ?",
        )
        .bind(&hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!("Cache miss: {}", url);
            return Ok(None);
        };

        let is_valid: bool = row.try_get("is_valid")?;
        let expires_at: Option<String> = row.try_get("expires_at")?;
        let expired = match expires_at {
            Some(at) => parse_db_timestamp(&at)? <= Utc::now(),
            None => false,
        };
        if !is_valid || expired {
            debug!("Cache stale for {} (valid: {}, expired: {})", url, is_valid, expired);
            return Ok(None);
        }

        let categories: String = row.try_get("categories")?;
        let labels: Vec<String> = serde_json::from_str(&categories)
            .with_context(|| format!("Corrupt cached categories for {url}"))?;

        // stats are best effort; a failed update never fails the read
        if let Err(e) = self.touch(&hash).await {
            warn!("Failed to update cache access stats for {}: {}", url, e);
        }

        debug!("Cache hit: {} ({} categories)", url, labels.len());
        Ok(Some(CategorySet::from_cleaned(labels)))
    }

    async fn store(&self, url: &str, categories: &CategorySet, source: CategorySource) -> Result<()> {
        let now = Utc::now();
        let now_str = to_db_timestamp(now);
        let expires_at = to_db_timestamp(now + self.ttl);
        let payload = serde_json::to_string(categories)?;

        sqlx::query(
            r"
            INSERT INTO scraped_categories (
                url_hash, url, categories, source, scraped_at, ttl_secs, expires_at,
                last_accessed_at, access_count, is_valid, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL, 0, 1, ?, ?)
            ON CONFLICT(url_hash) DO UPDATE SET
                url = excluded.url,
                categories = excluded.categories,
                source = excluded.source,
                scraped_at = excluded.scraped_at,
                ttl_secs = excluded.ttl_secs,
                expires_at = excluded.expires_at,
                is_valid = 1,
                updated_at = excluded.updated_at
            ",
        )
        .bind(url_hash(url))
        .bind(url.trim())
        .bind(payload)
        .bind(source.as_str())
        .bind(&now_str)
        .bind(self.ttl.num_seconds())
        .bind(expires_at)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to cache categories for {url}"))?;

        debug!("Cached {} categories for {} ({})", categories.len(), url, source);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM scraped_categories WHERE expires_at IS NOT NULL AND expires_at < ?",
        )
        .bind(to_db_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let now = to_db_timestamp(Utc::now());
        let row = sqlx::query(
            r"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN is_valid = 1 AND (expires_at IS NULL OR expires_at > ?) THEN 1 ELSE 0 END), 0) AS valid,
                COALESCE(SUM(CASE WHEN expires_at IS NOT NULL AND expires_at <= ? THEN 1 ELSE 0 END), 0) AS expired,
                COALESCE(SUM(CASE WHEN is_valid = 0 AND (expires_at IS NULL OR expires_at > ?) THEN 1 ELSE 0 END), 0) AS invalid
            FROM scraped_categories
            ",
        )
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(CacheStats {
            total: row.try_get::<i64, _>("total")? as u64,
            valid: row.try_get::<i64, _>("valid")? as u64,
            expired: row.try_get::<i64, _>("expired")? as u64,
            invalid: row.try_get::<i64, _>("invalid")? as u64,
        })
    }

    async fn invalidate(&self, url: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE scraped_categories SET is_valid = 0, updated_at = ? WHERE url_hash = ?")
            .bind(to_db_timestamp(Utc::now()))
            .bind(url_hash(url))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
