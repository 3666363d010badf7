//! Repository interfaces for category caching and job bookkeeping
//!
//! Contains trait definitions for the persistence surfaces the pipeline
//! talks to. Implementations live in the infrastructure layer.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::category::{CategorySet, CategorySource};
use crate::domain::job::{CacheStats, JobRecord, JobStats, JobStatus, JobStatusDetails, RowOutcome};

#[async_trait]
pub trait CategoryCacheRepository: Send + Sync {
    /// Live categories for a URL; `None` when missing, invalid or expired.
    async fn lookup(&self, url: &str) -> Result<Option<CategorySet>>;
    async fn store(&self, url: &str, categories: &CategorySet, source: CategorySource) -> Result<()>;

    // Housekeeping
    async fn cleanup_expired(&self) -> Result<u64>;
    async fn stats(&self) -> Result<CacheStats>;
    async fn invalidate(&self, url: &str) -> Result<bool>;
}

/// Job-status sink
#[async_trait]
pub trait JobStatusRepository: Send + Sync {
    async fn report(&self, job_id: &str, status: JobStatus, details: &JobStatusDetails) -> Result<()>;
    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>>;
}

#[async_trait]
pub trait ProcessedResultRepository: Send + Sync {
    /// Replace every stored outcome for the job.
    async fn save_outcomes(&self, job_id: &str, outcomes: &[RowOutcome]) -> Result<()>;
    async fn find_by_job(&self, job_id: &str) -> Result<Vec<RowOutcome>>;
    async fn job_stats(&self, job_id: &str) -> Result<JobStats>;
}
