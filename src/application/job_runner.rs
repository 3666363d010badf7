//! Job Runner
//!
//! Drives one job from `processing` to a terminal status. Every run ends in
//! `completed` or `failed`, and the uploaded input is removed exactly once
//! at the end of the run whichever way it went.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::batch_orchestrator::BatchOrchestrator;
use crate::application::errors::{JobError, JobResult};
use crate::application::job_logs::JobLogs;
use crate::domain::job::{DownloadLinks, JobDescriptor, JobStatus, JobStatusDetails, SpreadsheetRow};
use crate::domain::repositories::{JobStatusRepository, ProcessedResultRepository};
use crate::domain::services::{CompletionNotice, CompletionNotifier, SpreadsheetCodec};
use crate::infrastructure::config::JobsConfig;

pub fn result_path(results_dir: &Path, job_id: &str) -> PathBuf {
    results_dir.join(format!("{job_id}_processed.xlsx"))
}

pub struct JobRunner {
    codec: Arc<dyn SpreadsheetCodec>,
    orchestrator: BatchOrchestrator,
    status: Arc<dyn JobStatusRepository>,
    results: Option<Arc<dyn ProcessedResultRepository>>,
    notifier: Arc<dyn CompletionNotifier>,
    config: JobsConfig,
}

impl JobRunner {
    pub fn new(
        codec: Arc<dyn SpreadsheetCodec>,
        orchestrator: BatchOrchestrator,
        status: Arc<dyn JobStatusRepository>,
        notifier: Arc<dyn CompletionNotifier>,
        config: JobsConfig,
    ) -> Self {
        Self {
            codec,
            orchestrator,
            status,
            results: None,
            notifier,
            config,
        }
    }

    /// Also persist every row outcome for later `job-stats` queries.
    pub fn with_result_repository(mut self, results: Arc<dyn ProcessedResultRepository>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn status_repository(&self) -> &Arc<dyn JobStatusRepository> {
        &self.status
    }

    pub async fn report(&self, job_id: &str, status: JobStatus, details: &JobStatusDetails) {
        if let Err(e) = self.status.report(job_id, status, details).await {
            error!("Failed to report status {} for job {}: {}", status, job_id, e);
        }
    }

    /// Run the job to its terminal status and return that status. A panic
    /// anywhere in the run is reported as `failed`; the input is removed
    /// either way.
    pub async fn run(&self, job: &JobDescriptor) -> JobStatus {
        info!("Starting job {} ({})", job.job_id, job.input_path.display());

        let terminal = match AssertUnwindSafe(self.drive(job)).catch_unwind().await {
            Ok(status) => status,
            Err(panic) => {
                let message = format!("Job panicked: {}", panic_message(panic.as_ref()));
                error!("Job {} failed: {}", job.job_id, message);
                self.report(&job.job_id, JobStatus::Failed, &JobStatusDetails::error(message))
                    .await;
                JobStatus::Failed
            }
        };

        remove_input(&job.input_path).await;
        terminal
    }

    async fn drive(&self, job: &JobDescriptor) -> JobStatus {
        self.report(&job.job_id, JobStatus::Processing, &JobStatusDetails::default())
            .await;

        match self.execute(job).await {
            Ok(details) => {
                self.report(&job.job_id, JobStatus::Completed, &details).await;
                info!("Job {} completed", job.job_id);
                if let (Some(email), Some(links)) = (&job.notify_email, details.download_links) {
                    self.notify(&job.job_id, email, links).await;
                }
                JobStatus::Completed
            }
            Err(e) => {
                error!("Job {} failed: {}", job.job_id, e);
                self.report(&job.job_id, JobStatus::Failed, &JobStatusDetails::error(e.to_string()))
                    .await;
                JobStatus::Failed
            }
        }
    }

    async fn execute(&self, job: &JobDescriptor) -> JobResult<JobStatusDetails> {
        let rows = self.parse(&job.input_path).await?;
        info!("Job {}: {} rows to process", job.job_id, rows.len());

        let mut logs = JobLogs::create(&self.config.logs_dir, &job.job_id).await?;
        let output = self.orchestrator.run(&rows, &mut logs).await?;
        let (success_log_path, error_log_path) = logs.finish().await?;

        let result_path = result_path(&self.config.results_dir, &job.job_id);
        self.write(&result_path, output.rows).await?;

        if let Some(results) = &self.results {
            if let Err(e) = results.save_outcomes(&job.job_id, &output.outcomes).await {
                warn!("Failed to persist outcomes for job {}: {}", job.job_id, e);
            }
        }

        Ok(JobStatusDetails {
            result_path: Some(result_path),
            success_log_path: Some(success_log_path),
            error_log_path: Some(error_log_path),
            download_links: Some(DownloadLinks::for_job(&self.config.base_url, &job.job_id)),
            error: None,
        })
    }

    async fn parse(&self, path: &Path) -> JobResult<Vec<SpreadsheetRow>> {
        let codec = Arc::clone(&self.codec);
        let owned = path.to_path_buf();
        let parsed = tokio::task::spawn_blocking(move || codec.parse_rows(&owned)).await;

        match parsed {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(source)) => Err(JobError::InputUnreadable {
                path: path.to_path_buf(),
                source,
            }),
            Err(join) => Err(JobError::InputUnreadable {
                path: path.to_path_buf(),
                source: join.into(),
            }),
        }
    }

    async fn write(&self, path: &Path, rows: Vec<SpreadsheetRow>) -> JobResult<()> {
        let codec = Arc::clone(&self.codec);
        let owned = path.to_path_buf();
        let written = tokio::task::spawn_blocking(move || codec.write_rows(&owned, &rows)).await;

        match written {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(JobError::OutputWrite {
                path: path.to_path_buf(),
                source,
            }),
            Err(join) => Err(JobError::OutputWrite {
                path: path.to_path_buf(),
                source: join.into(),
            }),
        }
    }

    async fn notify(&self, job_id: &str, email: &str, links: DownloadLinks) {
        let notice = CompletionNotice {
            job_id: job_id.to_string(),
            email: email.to_string(),
            links,
        };
        if let Err(e) = self.notifier.notify(&notice).await {
            error!("Failed to send notification for job {}: {}", job_id, e);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

async fn remove_input(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!("Removed input file {}", path.display()),
        Err(e) => warn!("Failed to remove input file {}: {}", path.display(), e),
    }
}
