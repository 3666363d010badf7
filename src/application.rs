//! Application layer
//!
//! Similarity scoring, row classification, batch orchestration and job
//! execution built on the domain contracts.

pub mod batch_orchestrator;
pub mod cache_sweeper;
pub mod category_resolver;
pub mod errors;
pub mod job_logs;
pub mod job_queue;
pub mod job_runner;
pub mod row_processor;
pub mod similarity_engine;

pub use batch_orchestrator::{BatchOrchestrator, BatchOutput};
pub use cache_sweeper::spawn_cache_sweeper;
pub use category_resolver::CachedCategoryResolver;
pub use errors::{JobError, JobResult, RowError};
pub use job_logs::JobLogs;
pub use job_queue::{JobHandle, JobQueue};
pub use job_runner::JobRunner;
pub use row_processor::{ResolvedCategories, RowClassifier, RowProcessor};
pub use similarity_engine::SimilarityEngine;
