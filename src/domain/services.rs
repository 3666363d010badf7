//! Domain service contracts
//!
//! Collaborators the pipeline depends on without knowing how they work:
//! where categories come from, how spreadsheets are read and written, and
//! who hears about a finished job.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::domain::category::CategoryExtraction;
use crate::domain::job::{DownloadLinks, SpreadsheetRow};

/// Produces the category set for one URL.
///
/// Implementations never fail: transport and parse problems degrade to an
/// empty extraction.
#[async_trait]
pub trait CategoryProvider: Send + Sync {
    async fn categories_for(&self, url: &str) -> CategoryExtraction;
}

/// Tabular row codec
pub trait SpreadsheetCodec: Send + Sync {
    fn parse_rows(&self, path: &Path) -> Result<Vec<SpreadsheetRow>>;
    fn write_rows(&self, path: &Path, rows: &[SpreadsheetRow]) -> Result<()>;
}

/// Payload handed to the notifier when a job completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotice {
    pub job_id: String,
    pub email: String,
    pub links: DownloadLinks,
}

#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn notify(&self, notice: &CompletionNotice) -> Result<()>;
}
