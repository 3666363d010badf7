//! Command handlers behind the CLI
//!
//! `AppContext` wires configuration, storage and the processing pipeline
//! once; each handler prints its result to stdout.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::{
    BatchOrchestrator, CachedCategoryResolver, JobHandle, JobQueue, JobRunner, RowProcessor, SimilarityEngine,
    spawn_cache_sweeper,
};
use crate::domain::job::JobDescriptor;
use crate::domain::repositories::{CategoryCacheRepository, JobStatusRepository, ProcessedResultRepository};
use crate::domain::services::CategoryProvider;
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::{
    AppConfig, CategoryExtractor, DatabaseConnection, HttpClient, LogNotifier, SqliteCategoryCache,
    SqliteJobStatusRepository, SqliteProcessedResultRepository, XlsxSpreadsheetCodec,
};

pub struct AppContext {
    pub config: AppConfig,
    pub database: DatabaseConnection,
    pub cache: Arc<SqliteCategoryCache>,
    pub job_status: Arc<SqliteJobStatusRepository>,
    pub processed_results: Arc<SqliteProcessedResultRepository>,
    pub engine: Arc<SimilarityEngine>,
}

impl AppContext {
    pub async fn build(config: AppConfig) -> Result<Self> {
        let database = DatabaseConnection::new(&config.cache.database_url).await?;
        database.migrate().await?;

        let pool = database.pool().clone();
        let cache = Arc::new(SqliteCategoryCache::new(pool.clone(), config.cache.ttl())?);
        let job_status = Arc::new(SqliteJobStatusRepository::new(pool.clone()));
        let processed_results = Arc::new(SqliteProcessedResultRepository::new(pool));
        let engine = Arc::new(SimilarityEngine::new(config.matching.clone()));

        Ok(Self {
            config,
            database,
            cache,
            job_status,
            processed_results,
            engine,
        })
    }

    /// Extractor behind the cache (or bare, when the cache is disabled)
    pub fn category_provider(&self) -> Result<Arc<dyn CategoryProvider>> {
        let client = HttpClient::new(HttpClientConfig::from(&self.config.http))?;
        let extractor: Arc<dyn CategoryProvider> =
            Arc::new(CategoryExtractor::new(client, self.config.extraction.max_categories));

        let resolver = if self.config.cache.enabled {
            let cache: Arc<dyn CategoryCacheRepository> = self.cache.clone();
            CachedCategoryResolver::new(extractor, cache)
        } else {
            CachedCategoryResolver::uncached(extractor)
        };
        Ok(Arc::new(resolver))
    }

    pub fn job_runner(&self) -> Result<JobRunner> {
        let batch = &self.config.batch;
        let processor = RowProcessor::new(
            Arc::clone(&self.engine),
            batch.client_column.clone(),
            batch.competitor_column.clone(),
        );
        let orchestrator = BatchOrchestrator::new(self.category_provider()?, processor, batch);
        let results: Arc<dyn ProcessedResultRepository> = self.processed_results.clone();

        Ok(JobRunner::new(
            Arc::new(XlsxSpreadsheetCodec::new()),
            orchestrator,
            self.job_status.clone(),
            Arc::new(LogNotifier),
            self.config.jobs.clone(),
        )
        .with_result_repository(results))
    }
}

/// Copy an input into the uploads directory; the job consumes the copy.
async fn stage_input(uploads_dir: &Path, input: &Path, job_id: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(uploads_dir)
        .await
        .with_context(|| format!("Failed to create uploads directory {}", uploads_dir.display()))?;

    let extension = input.extension().and_then(|e| e.to_str()).unwrap_or("xlsx");
    let staged = uploads_dir.join(format!("{job_id}.{extension}"));
    tokio::fs::copy(input, &staged)
        .await
        .with_context(|| format!("Failed to stage input {}", input.display()))?;
    Ok(staged)
}

pub async fn run_jobs(ctx: &AppContext, inputs: Vec<PathBuf>, email: Option<String>, job_id: Option<String>) -> Result<()> {
    if job_id.is_some() && inputs.len() > 1 {
        bail!("--job-id can only be used with a single input");
    }

    let runner = Arc::new(ctx.job_runner()?);
    let queue = JobQueue::start(runner, ctx.config.jobs.worker_concurrency);
    let sweeper = spawn_cache_sweeper(ctx.cache.clone(), ctx.config.cache.sweep_interval());

    let mut handles = Vec::with_capacity(inputs.len());
    for input in &inputs {
        match enqueue_input(ctx, &queue, input, email.clone(), job_id.clone()).await {
            Ok(handle) => handles.push((input.clone(), handle)),
            Err(e) => {
                // let already queued jobs reach a terminal status first
                queue.shutdown().await;
                sweeper.abort();
                return Err(e);
            }
        }
    }

    for (input, handle) in handles {
        let job_id = handle.job_id.clone();
        let status = handle.wait().await;
        println!("{}\t{}\t{}", job_id, status, input.display());
    }

    queue.shutdown().await;
    sweeper.abort();
    Ok(())
}

async fn enqueue_input(
    ctx: &AppContext,
    queue: &JobQueue,
    input: &Path,
    email: Option<String>,
    job_id: Option<String>,
) -> Result<JobHandle> {
    let mut job = JobDescriptor::new(input).with_email(email);
    if let Some(id) = job_id {
        job = job.with_job_id(id);
    }
    job.input_path = stage_input(&ctx.config.jobs.uploads_dir, input, &job.job_id).await?;
    info!("Queued {} as job {}", input.display(), job.job_id);

    let staged = job.input_path.clone();
    match queue.enqueue(job).await {
        Ok(handle) => Ok(handle),
        Err(e) => {
            if let Err(remove) = tokio::fs::remove_file(&staged).await {
                warn!("Failed to remove staged input {}: {}", staged.display(), remove);
            }
            Err(e)
        }
    }
}

pub async fn show_status(ctx: &AppContext, job_id: &str) -> Result<()> {
    let Some(record) = ctx.job_status.get(job_id).await? else {
        bail!("Unknown job: {job_id}");
    };
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub async fn cache_stats(ctx: &AppContext) -> Result<()> {
    let stats = ctx.cache.stats().await?;
    println!("total:   {}", stats.total);
    println!("valid:   {}", stats.valid);
    println!("expired: {}", stats.expired);
    println!("invalid: {}", stats.invalid);
    Ok(())
}

pub async fn cache_cleanup(ctx: &AppContext) -> Result<()> {
    let deleted = ctx.cache.cleanup_expired().await?;
    println!("Removed {deleted} expired cache entries");
    Ok(())
}

pub async fn compare_sites(ctx: &AppContext, client: &str, competitor: &str) -> Result<()> {
    let provider = ctx.category_provider()?;
    let (client_extraction, competitor_extraction) =
        tokio::join!(provider.categories_for(client), provider.categories_for(competitor));

    println!("{} ({}): {:?}", client, client_extraction.source, client_extraction.categories.labels());
    println!(
        "{} ({}): {:?}",
        competitor,
        competitor_extraction.source,
        competitor_extraction.categories.labels()
    );

    let matches = ctx
        .engine
        .compare(&client_extraction.categories, &competitor_extraction.categories);
    for m in &matches {
        println!(
            "  {:<30} {:<30} {:<14} {:.3}",
            m.client_label(),
            m.competitor_label(),
            m.method().as_str(),
            m.confidence
        );
    }

    let classification = ctx.engine.classify(&matches);
    println!(
        "{} ({:.1}%): {}",
        classification.status,
        classification.confidence * 100.0,
        classification.reason
    );
    Ok(())
}

pub async fn job_stats(ctx: &AppContext, job_id: &str) -> Result<()> {
    let stats = ctx.processed_results.job_stats(job_id).await?;
    if stats.total == 0 {
        bail!("No processed results for job {job_id}");
    }
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_staged_copy_leaves_original() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("sites.xlsx");
        std::fs::write(&input, b"data")?;

        let staged = stage_input(&dir.path().join("uploads"), &input, "job-9").await?;

        assert_eq!(staged, dir.path().join("uploads").join("job-9.xlsx"));
        assert!(input.exists());
        assert_eq!(std::fs::read(&staged)?, b"data");
        Ok(())
    }

    #[tokio::test]
    async fn test_context_builds_against_memory_database() -> Result<()> {
        let mut config = AppConfig::default();
        config.cache.database_url = "sqlite::memory:".to_string();

        let ctx = AppContext::build(config).await?;
        assert!(ctx.job_runner().is_ok());
        assert_eq!(ctx.cache.stats().await?.total, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_staging_drains_queued_jobs() -> Result<()> {
        let dir = tempdir()?;
        let mut config = AppConfig::default();
        config.cache.database_url = "sqlite::memory:".to_string();
        config.jobs.uploads_dir = dir.path().join("uploads");
        config.jobs.results_dir = dir.path().join("results");
        config.jobs.logs_dir = dir.path().join("logs");
        let ctx = AppContext::build(config).await?;

        let first = dir.path().join("first.xlsx");
        std::fs::write(&first, b"not a workbook")?;
        let missing = dir.path().join("missing.xlsx");

        let result = run_jobs(&ctx, vec![first.clone(), missing], None, None).await;

        assert!(result.is_err());
        assert!(first.exists());
        let leftovers = std::fs::read_dir(dir.path().join("uploads"))?.count();
        assert_eq!(leftovers, 0);
        Ok(())
    }
}
