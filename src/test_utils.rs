//! Test utilities
//!
//! Isolated in-memory databases and the repositories built on them.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::{
    DatabaseConnection, SqliteCategoryCache, SqliteJobStatusRepository, SqliteProcessedResultRepository,
};

/// Fresh, migrated in-memory database
pub struct TestDatabase {
    pub connection: DatabaseConnection,
}

impl TestDatabase {
    pub async fn new() -> Result<Self> {
        Ok(Self {
            connection: DatabaseConnection::in_memory().await?,
        })
    }

    pub fn pool(&self) -> sqlx::SqlitePool {
        self.connection.pool().clone()
    }
}

/// Every repository over one test database
pub struct TestContext {
    pub database: TestDatabase,
    pub cache: Arc<SqliteCategoryCache>,
    pub job_status: Arc<SqliteJobStatusRepository>,
    pub processed_results: Arc<SqliteProcessedResultRepository>,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        Self::with_cache_ttl(Duration::from_secs(3600)).await
    }

    pub async fn with_cache_ttl(ttl: Duration) -> Result<Self> {
        let database = TestDatabase::new().await?;
        let pool = database.pool();

        Ok(Self {
            cache: Arc::new(SqliteCategoryCache::new(pool.clone(), ttl)?),
            job_status: Arc::new(SqliteJobStatusRepository::new(pool.clone())),
            processed_results: Arc::new(SqliteProcessedResultRepository::new(pool)),
            database,
        })
    }
}

#[macro_export]
macro_rules! test_context {
    () => {{
        $crate::test_utils::TestContext::new().await.expect("Failed to create test context")
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_databases_are_isolated() {
        let a = TestDatabase::new().await.unwrap();
        let b = TestDatabase::new().await.unwrap();

        sqlx::query("INSERT INTO jobs (id, status, updated_at) VALUES ('x', 'pending', '2026-01-01T00:00:00.000Z')")
            .execute(&a.pool())
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&b.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_context_creation() {
        let ctx = crate::test_context!();
        assert!(!ctx.database.pool().is_closed());
    }
}
