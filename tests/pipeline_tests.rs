//! End-to-end pipeline tests: a stub category provider behind the SQLite
//! cache, the batch orchestrator, the job runner and the job queue.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;

use competitor_overlap::application::{
    BatchOrchestrator, CachedCategoryResolver, JobLogs, JobQueue, JobRunner, RowProcessor, SimilarityEngine,
};
use competitor_overlap::domain::repositories::{
    CategoryCacheRepository, JobStatusRepository, ProcessedResultRepository,
};
use competitor_overlap::domain::services::{CategoryProvider, SpreadsheetCodec};
use competitor_overlap::domain::{
    CategoryExtraction, CategorySet, CategorySource, JobDescriptor, JobStatus, MatchStatus, SpreadsheetRow,
};
use competitor_overlap::infrastructure::config::{BatchConfig, JobsConfig};
use competitor_overlap::infrastructure::{
    DatabaseConnection, LogNotifier, SqliteCategoryCache, SqliteJobStatusRepository,
    SqliteProcessedResultRepository, XlsxSpreadsheetCodec,
};

/// Serves fixed category lists per site; unknown sites behave like a failed scrape
struct StubProvider {
    sites: HashMap<&'static str, Vec<&'static str>>,
    calls: AtomicUsize,
}

impl StubProvider {
    fn new() -> Self {
        let mut sites = HashMap::new();
        sites.insert("shop-a.example", vec!["electronics", "laptops", "books", "toys", "garden"]);
        sites.insert("shop-b.example", vec!["electronics", "laptop", "books", "toys", "kitchen"]);
        sites.insert("shop-c.example", vec!["jewelry", "watches", "perfume"]);
        Self {
            sites,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CategoryProvider for StubProvider {
    async fn categories_for(&self, url: &str) -> CategoryExtraction {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.sites.get(url) {
            Some(labels) => CategoryExtraction {
                categories: CategorySet::from_raw_labels(labels),
                source: CategorySource::Navigation,
            },
            None => CategoryExtraction::empty(),
        }
    }
}

fn row(client: &str, competitor: &str, note: &str) -> SpreadsheetRow {
    SpreadsheetRow::from_pairs([("client_site", client), ("competitors_site", competitor), ("note", note)])
}

struct Pipeline {
    provider: Arc<StubProvider>,
    cache: Arc<SqliteCategoryCache>,
    job_status: Arc<SqliteJobStatusRepository>,
    processed: Arc<SqliteProcessedResultRepository>,
}

impl Pipeline {
    async fn new() -> anyhow::Result<Self> {
        let db = DatabaseConnection::in_memory().await?;
        let pool = db.pool().clone();
        Ok(Self {
            provider: Arc::new(StubProvider::new()),
            cache: Arc::new(SqliteCategoryCache::new(pool.clone(), Duration::from_secs(3600))?),
            job_status: Arc::new(SqliteJobStatusRepository::new(pool.clone())),
            processed: Arc::new(SqliteProcessedResultRepository::new(pool)),
        })
    }

    fn orchestrator(&self) -> BatchOrchestrator {
        let batch = BatchConfig::default();
        let cache: Arc<dyn CategoryCacheRepository> = self.cache.clone();
        let resolver = Arc::new(CachedCategoryResolver::new(self.provider.clone(), cache));
        let processor = RowProcessor::new(
            Arc::new(SimilarityEngine::default()),
            batch.client_column.clone(),
            batch.competitor_column.clone(),
        );
        BatchOrchestrator::new(resolver, processor, &batch)
    }

    fn runner(&self, dir: &Path) -> JobRunner {
        let config = JobsConfig {
            results_dir: dir.join("results"),
            logs_dir: dir.join("logs"),
            ..JobsConfig::default()
        };
        let processed: Arc<dyn ProcessedResultRepository> = self.processed.clone();
        JobRunner::new(
            Arc::new(XlsxSpreadsheetCodec::new()),
            self.orchestrator(),
            self.job_status.clone(),
            Arc::new(LogNotifier),
            config,
        )
        .with_result_repository(processed)
    }
}

#[tokio::test]
async fn empty_competitor_site_is_skipped_and_only_error_logged() -> anyhow::Result<()> {
    let pipeline = Pipeline::new().await?;
    let dir = tempdir()?;
    let mut logs = JobLogs::create(dir.path(), "skip-job").await?;

    let rows = vec![row("shop-a.example", "", "no competitor")];
    let output = pipeline.orchestrator().run(&rows, &mut logs).await?;
    let (success, error) = logs.finish().await?;

    assert_eq!(output.outcomes[0].status, MatchStatus::Skipped);
    assert_eq!(output.rows[0].get("status"), Some("SKIPPED"));
    assert_eq!(output.rows[0].get("similarity_score"), None);
    assert_eq!(std::fs::read_to_string(success)?.lines().count(), 0);
    assert_eq!(std::fs::read_to_string(error)?.lines().count(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_site_only_affects_its_own_row() -> anyhow::Result<()> {
    let pipeline = Pipeline::new().await?;
    let dir = tempdir()?;
    let mut logs = JobLogs::create(dir.path(), "isolation-job").await?;

    let rows = vec![
        row("shop-a.example", "shop-b.example", "first"),
        row("shop-a.example", "unreachable.example", "second"),
        row("shop-b.example", "shop-a.example", "third"),
        row("shop-a.example", "shop-c.example", "fourth"),
    ];
    let output = pipeline.orchestrator().run(&rows, &mut logs).await?;

    let statuses: Vec<MatchStatus> = output.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![MatchStatus::Pass, MatchStatus::Fail, MatchStatus::Pass, MatchStatus::Fail]
    );
    let notes: Vec<&str> = output.rows.iter().filter_map(|r| r.get("note")).collect();
    assert_eq!(notes, vec!["first", "second", "third", "fourth"]);

    let (success, _) = logs.finish().await?;
    assert_eq!(std::fs::read_to_string(success)?.lines().count(), 4);
    Ok(())
}

#[tokio::test]
async fn cache_serves_sites_across_jobs() -> anyhow::Result<()> {
    let pipeline = Pipeline::new().await?;
    let dir = tempdir()?;
    let rows = vec![row("shop-a.example", "shop-b.example", "")];

    for job in ["first", "second"] {
        let mut logs = JobLogs::create(dir.path(), job).await?;
        pipeline.orchestrator().run(&rows, &mut logs).await?;
    }

    assert_eq!(pipeline.provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(pipeline.cache.stats().await?.valid, 2);
    Ok(())
}

#[tokio::test]
async fn job_runner_writes_results_logs_and_stats() -> anyhow::Result<()> {
    let pipeline = Pipeline::new().await?;
    let dir = tempdir()?;
    let codec = XlsxSpreadsheetCodec::new();

    let input = dir.path().join("upload.xlsx");
    codec.write_rows(
        &input,
        &[
            row("shop-a.example", "shop-b.example", "pair one"),
            row("shop-a.example", "", "pair two"),
            row("shop-a.example", "shop-c.example", "pair three"),
        ],
    )?;

    let runner = pipeline.runner(dir.path());
    let job = JobDescriptor::new(&input).with_job_id("e2e");
    assert_eq!(runner.run(&job).await, JobStatus::Completed);
    assert!(!input.exists());

    let result = dir.path().join("results").join("e2e_processed.xlsx");
    let rows = codec.parse_rows(&result)?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("note"), Some("pair one"));
    assert_eq!(rows[0].get("status"), Some("PASS"));
    assert_eq!(rows[1].get("status"), Some("SKIPPED"));
    assert_eq!(rows[2].get("status"), Some("FAIL"));
    assert!(rows[0].get("matching_details").unwrap_or_default().contains("totalMatches"));

    let record = pipeline.job_status.get("e2e").await?.expect("job recorded");
    assert_eq!(record.status, JobStatus::Completed);
    assert!(record.started_at.is_some());
    assert!(record.completed_at.is_some());

    let stats = pipeline.processed.job_stats("e2e").await?;
    assert_eq!((stats.total, stats.passed, stats.failed, stats.skipped), (3, 1, 1, 1));
    Ok(())
}

#[tokio::test]
async fn rerunning_a_job_overwrites_its_logs() -> anyhow::Result<()> {
    let pipeline = Pipeline::new().await?;
    let dir = tempdir()?;
    let codec = XlsxSpreadsheetCodec::new();
    let runner = pipeline.runner(dir.path());

    for _ in 0..2 {
        let input = dir.path().join("again.xlsx");
        codec.write_rows(&input, &[row("shop-a.example", "shop-b.example", "")])?;
        let job = JobDescriptor::new(&input).with_job_id("redelivered");
        assert_eq!(runner.run(&job).await, JobStatus::Completed);
    }

    let success = std::fs::read_to_string(dir.path().join("logs").join("redelivered_success.log"))?;
    assert_eq!(success.lines().count(), 1);
    assert_eq!(pipeline.processed.find_by_job("redelivered").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn queue_runs_jobs_to_terminal_status() -> anyhow::Result<()> {
    let pipeline = Pipeline::new().await?;
    let dir = tempdir()?;
    let codec = XlsxSpreadsheetCodec::new();
    let queue = JobQueue::start(Arc::new(pipeline.runner(dir.path())), 2);

    let good = dir.path().join("good.xlsx");
    codec.write_rows(&good, &[row("shop-a.example", "shop-b.example", "")])?;
    let bad = dir.path().join("bad.xlsx");
    std::fs::write(&bad, b"not a workbook")?;

    let good_handle = queue.enqueue(JobDescriptor::new(&good).with_job_id("good")).await?;
    let bad_handle = queue.enqueue(JobDescriptor::new(&bad).with_job_id("bad")).await?;

    assert_eq!(good_handle.wait().await, JobStatus::Completed);
    assert_eq!(bad_handle.wait().await, JobStatus::Failed);
    queue.shutdown().await;

    assert!(!good.exists());
    assert!(!bad.exists());
    let failed = pipeline.job_status.get("bad").await?.expect("job recorded");
    assert!(failed.details.error.is_some());
    Ok(())
}
