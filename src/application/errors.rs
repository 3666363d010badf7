//! Error types for row classification and job execution

use std::path::PathBuf;
use thiserror::Error;

/// Failure classifying a single row. Recovered as a FAIL outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("Classification produced a non-finite confidence ({value}) for {client} vs {competitor}")]
    NonFiniteScore {
        client: String,
        competitor: String,
        value: f64,
    },
}

/// Failure of a whole job. Recovered as a `failed` terminal status.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Failed to read input spreadsheet {path}: {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write result spreadsheet {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write job log {path}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JobError {
    pub fn log_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LogWrite {
            path: path.into(),
            source,
        }
    }
}

pub type JobResult<T> = Result<T, JobError>;
