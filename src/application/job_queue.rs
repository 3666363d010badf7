//! In-process job queue
//!
//! Jobs are dispatched from an unbounded channel to at most
//! `worker_concurrency` concurrent runs.

use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::application::job_runner::JobRunner;
use crate::domain::job::{JobDescriptor, JobStatus, JobStatusDetails};

struct QueuedJob {
    job: JobDescriptor,
    done: oneshot::Sender<JobStatus>,
}

/// Resolves to the terminal status of one enqueued job
pub struct JobHandle {
    pub job_id: String,
    done: oneshot::Receiver<JobStatus>,
}

impl JobHandle {
    pub async fn wait(self) -> JobStatus {
        // a dropped sender means the run task itself died
        self.done.await.unwrap_or(JobStatus::Failed)
    }
}

pub struct JobQueue {
    runner: Arc<JobRunner>,
    sender: mpsc::UnboundedSender<QueuedJob>,
    dispatcher: JoinHandle<()>,
}

impl JobQueue {
    pub fn start(runner: Arc<JobRunner>, worker_concurrency: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let semaphore = Arc::new(Semaphore::new(worker_concurrency.max(1)));
        let dispatcher = tokio::spawn(dispatch(receiver, Arc::clone(&runner), semaphore));
        info!("Job queue started with {} workers", worker_concurrency.max(1));

        Self {
            runner,
            sender,
            dispatcher,
        }
    }

    /// Report the job as pending and hand it to the workers.
    pub async fn enqueue(&self, job: JobDescriptor) -> Result<JobHandle> {
        self.runner
            .report(&job.job_id, JobStatus::Pending, &JobStatusDetails::default())
            .await;

        let (done, receiver) = oneshot::channel();
        let job_id = job.job_id.clone();
        self.sender
            .send(QueuedJob { job, done })
            .map_err(|_| anyhow!("Job queue is closed"))?;
        debug!("Enqueued job {}", job_id);

        Ok(JobHandle {
            job_id,
            done: receiver,
        })
    }

    /// Stop accepting jobs and wait for every queued and running job.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.dispatcher.await {
            error!("Job dispatcher terminated abnormally: {}", e);
        }
        info!("Job queue drained");
    }
}

async fn dispatch(mut receiver: mpsc::UnboundedReceiver<QueuedJob>, runner: Arc<JobRunner>, semaphore: Arc<Semaphore>) {
    let mut in_flight = JoinSet::new();

    while let Some(queued) = receiver.recv().await {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        let runner = Arc::clone(&runner);
        in_flight.spawn(async move {
            let _permit = permit;
            let status = runner.run(&queued.job).await;
            // the caller may have stopped waiting
            let _ = queued.done.send(status);
        });

        while let Some(finished) = in_flight.try_join_next() {
            if let Err(e) = finished {
                error!("Job task panicked: {}", e);
            }
        }
    }

    while let Some(finished) = in_flight.join_next().await {
        if let Err(e) = finished {
            error!("Job task panicked: {}", e);
        }
    }
}
