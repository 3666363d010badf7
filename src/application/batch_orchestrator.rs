//! Batch Orchestrator
//!
//! Rows are handled in fixed-size sub-batches, one after another. Before a
//! sub-batch is classified, every site it references that has not been
//! resolved yet is resolved in chunks: all URLs in a chunk run concurrently
//! and the whole chunk is joined before the next one starts. A URL whose
//! task dies resolves to an empty set. Rows come back in input order.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::errors::JobResult;
use crate::application::job_logs::JobLogs;
use crate::application::row_processor::{ResolvedCategories, RowClassifier};
use crate::domain::category::CategorySet;
use crate::domain::job::{RowOutcome, SpreadsheetRow};
use crate::domain::matching::MatchStatus;
use crate::domain::services::CategoryProvider;
use crate::infrastructure::config::BatchConfig;

/// Outcomes and merged result rows, both in input order
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub outcomes: Vec<RowOutcome>,
    pub rows: Vec<SpreadsheetRow>,
}

pub struct BatchOrchestrator {
    resolver: Arc<dyn CategoryProvider>,
    processor: Box<dyn RowClassifier>,
    row_batch_size: usize,
    scrape_chunk_size: usize,
}

impl BatchOrchestrator {
    pub fn new(
        resolver: Arc<dyn CategoryProvider>,
        processor: impl RowClassifier + 'static,
        config: &BatchConfig,
    ) -> Self {
        Self {
            resolver,
            processor: Box::new(processor),
            row_batch_size: config.row_batch_size.max(1),
            scrape_chunk_size: config.scrape_chunk_size.max(1),
        }
    }

    pub async fn run(&self, rows: &[SpreadsheetRow], logs: &mut JobLogs) -> JobResult<BatchOutput> {
        let mut output = BatchOutput {
            outcomes: Vec::with_capacity(rows.len()),
            rows: Vec::with_capacity(rows.len()),
        };
        let mut resolved = ResolvedCategories::new();
        let total_batches = rows.len().div_ceil(self.row_batch_size);

        for (batch_number, batch) in rows.chunks(self.row_batch_size).enumerate() {
            info!("Processing batch {}/{}", batch_number + 1, total_batches);

            let pending = self.unresolved_sites(batch, &resolved);
            if !pending.is_empty() {
                info!("Scraping {} unique URLs concurrently...", pending.len());
                self.resolve(&pending, &mut resolved).await;
            }

            let offset = batch_number * self.row_batch_size;
            for (i, row) in batch.iter().enumerate() {
                let outcome = self.process_row(offset + i, row, &resolved, logs).await?;
                output.rows.push(outcome.merge_into(row));
                output.outcomes.push(outcome);
            }
        }

        Ok(output)
    }

    /// Distinct trimmed sites of the batch that are not yet resolved, first-seen order.
    fn unresolved_sites(&self, batch: &[SpreadsheetRow], resolved: &ResolvedCategories) -> Vec<String> {
        let mut seen = HashSet::new();
        batch
            .iter()
            .flat_map(|row| {
                let (client, competitor) = self.processor.sites(row);
                [client, competitor]
            })
            .flatten()
            .filter(|site| !resolved.contains_key(*site) && seen.insert(*site))
            .map(str::to_string)
            .collect()
    }

    /// Resolve URLs chunk by chunk, each chunk fully joined before the next.
    pub async fn resolve(&self, urls: &[String], resolved: &mut ResolvedCategories) {
        for chunk in urls.chunks(self.scrape_chunk_size) {
            let handles = chunk.iter().map(|url| {
                let resolver = Arc::clone(&self.resolver);
                let url = url.clone();
                tokio::spawn(async move { resolver.categories_for(&url).await })
            });
            let results = join_all(handles).await;

            for (url, result) in chunk.iter().zip(results) {
                let categories = match result {
                    Ok(extraction) => {
                        debug!(
                            "Resolved {} categories for {} ({})",
                            extraction.categories.len(),
                            url,
                            extraction.source
                        );
                        extraction.categories
                    }
                    Err(e) => {
                        warn!("Failed to scrape {}: {}", url, e);
                        CategorySet::new()
                    }
                };
                resolved.insert(url.clone(), categories);
            }
        }
    }

    async fn process_row(
        &self,
        row_index: usize,
        row: &SpreadsheetRow,
        resolved: &ResolvedCategories,
        logs: &mut JobLogs,
    ) -> JobResult<RowOutcome> {
        match self.processor.process(row_index, row, resolved) {
            Ok(outcome) if outcome.status == MatchStatus::Skipped => {
                warn!("Skipping row {} due to missing client or competitor site", row_index);
                logs.row_skipped(row).await?;
                Ok(outcome)
            }
            Ok(outcome) => {
                logs.row_processed(&outcome).await?;
                Ok(outcome)
            }
            Err(e) => {
                let (client, competitor) = self.processor.sites(row);
                let (client, competitor) = (client.unwrap_or_default(), competitor.unwrap_or_default());
                warn!("Error processing row {}: {}", row_index, e);
                logs.row_failed(client, competitor, &e.to_string()).await?;
                Ok(RowOutcome::failed(row_index, client, competitor, e.to_string()))
            }
        }
    }
}
