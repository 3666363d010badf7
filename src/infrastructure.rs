//! Infrastructure layer: configuration, logging, page fetching, category
//! extraction, SQLite persistence and the spreadsheet codec.

pub mod category_cache;
pub mod config;
pub mod database_connection;
pub mod extraction;
pub mod extraction_error;
pub mod http_client;
pub mod job_status_repository;
pub mod logging;
pub mod notifier;
pub mod processed_result_repository;
pub mod spreadsheet;

// Re-export commonly used items
pub use category_cache::SqliteCategoryCache;
pub use config::{AppConfig, ConfigError, LoggingConfig};
pub use database_connection::DatabaseConnection;
pub use extraction::{CategoryExtractor, extract_from_markup};
pub use extraction_error::ExtractionError;
pub use http_client::{HttpClient, HttpClientConfig};
pub use job_status_repository::SqliteJobStatusRepository;
pub use logging::{init_logging, init_logging_with_config};
pub use notifier::LogNotifier;
pub use processed_result_repository::SqliteProcessedResultRepository;
pub use spreadsheet::XlsxSpreadsheetCodec;
