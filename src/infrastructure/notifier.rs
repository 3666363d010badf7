//! Completion notifier that records the payload through tracing.
//! Outbound mail delivery is handled outside this process.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::domain::services::{CompletionNotice, CompletionNotifier};

#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl CompletionNotifier for LogNotifier {
    async fn notify(&self, notice: &CompletionNotice) -> Result<()> {
        info!(
            job_id = %notice.job_id,
            email = %notice.email,
            excel = %notice.links.excel,
            success_log = %notice.links.success_log,
            error_log = %notice.links.error_log,
            "Job completion notice"
        );
        Ok(())
    }
}
