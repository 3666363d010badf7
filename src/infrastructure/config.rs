//! Configuration infrastructure
//!
//! Layered loading: built-in defaults, then `config/default.*` and an
//! optional explicit file, then `COMPETITOR_OVERLAP__SECTION__KEY`
//! environment variables. Every threshold the pipeline uses lives here.

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::matching::Thresholds;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "COMPETITOR_OVERLAP";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config from file: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub extraction: ExtractionConfig,
    pub cache: CacheConfig,
    pub matching: MatchingConfig,
    pub batch: BatchConfig,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
}

/// Outbound fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub timeout_secs: u64,
    pub max_redirects: usize,
    /// Process-wide politeness limit
    pub max_requests_per_second: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub max_categories: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub database_url: String,
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

/// Similarity probe acceptance rules and classification thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub thresholds: Thresholds,
    /// Largest accepted fuzzy distance (0 = identical)
    pub fuzzy_max_distance: f64,
    pub edit_min_similarity: f64,
    pub edit_max_distance: usize,
    pub cosine_min_similarity: f64,
    pub min_label_len: usize,
    pub max_label_len: usize,
    /// Generic labels dropped before comparison
    pub stoplist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub row_batch_size: usize,
    pub scrape_chunk_size: usize,
    pub client_column: String,
    pub competitor_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Inputs are staged here and removed once their job ends
    pub uploads_dir: PathBuf,
    pub results_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// Public base for download links
    pub base_url: String,
    pub worker_concurrency: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,
    pub json_format: bool,
    pub console_output: bool,
    pub file_output: bool,
    pub log_dir: PathBuf,
    pub file_name: String,
}

/// Default configuration values
pub mod defaults {
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
    pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

    /// Per-request timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
    pub const MAX_REDIRECTS: usize = 5;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 10;

    pub const MAX_CATEGORIES: usize = crate::domain::constants::labels::MAX_CATEGORIES;

    pub const DATABASE_URL: &str = "sqlite:data/competitor_overlap.db";
    /// 24 hours
    pub const CACHE_TTL_SECS: u64 = 86_400;
    pub const CACHE_SWEEP_INTERVAL_SECS: u64 = 3_600;

    pub const FUZZY_MAX_DISTANCE: f64 = 0.3;
    pub const EDIT_MIN_SIMILARITY: f64 = 0.8;
    pub const EDIT_MAX_DISTANCE: usize = 3;
    pub const COSINE_MIN_SIMILARITY: f64 = 0.7;
    pub const MATCH_LABEL_MIN_LEN: usize = 3;
    pub const MATCH_LABEL_MAX_LEN: usize = 50;
    pub const STOPLIST: &[&str] = &[
        "all", "new", "sale", "more", "shop all", "view all", "see all", "menu", "account",
        "help", "blog", "gift cards",
    ];

    pub const ROW_BATCH_SIZE: usize = 5;
    pub const SCRAPE_CHUNK_SIZE: usize = 5;
    pub const CLIENT_COLUMN: &str = "client_site";
    pub const COMPETITOR_COLUMN: &str = "competitors_site";

    pub const UPLOADS_DIR: &str = "uploads";
    pub const RESULTS_DIR: &str = "results";
    pub const LOGS_DIR: &str = "logs";
    pub const BASE_URL: &str = "http://localhost:8080";
    pub const WORKER_CONCURRENCY: usize = 10;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_DIR: &str = "logs";
    pub const LOG_FILE_NAME: &str = "competitor-overlap.log";
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            accept: defaults::ACCEPT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            max_redirects: defaults::MAX_REDIRECTS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { max_categories: defaults::MAX_CATEGORIES }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_url: defaults::DATABASE_URL.to_string(),
            ttl_secs: defaults::CACHE_TTL_SECS,
            sweep_interval_secs: defaults::CACHE_SWEEP_INTERVAL_SECS,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            fuzzy_max_distance: defaults::FUZZY_MAX_DISTANCE,
            edit_min_similarity: defaults::EDIT_MIN_SIMILARITY,
            edit_max_distance: defaults::EDIT_MAX_DISTANCE,
            cosine_min_similarity: defaults::COSINE_MIN_SIMILARITY,
            min_label_len: defaults::MATCH_LABEL_MIN_LEN,
            max_label_len: defaults::MATCH_LABEL_MAX_LEN,
            stoplist: defaults::STOPLIST.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            row_batch_size: defaults::ROW_BATCH_SIZE,
            scrape_chunk_size: defaults::SCRAPE_CHUNK_SIZE,
            client_column: defaults::CLIENT_COLUMN.to_string(),
            competitor_column: defaults::COMPETITOR_COLUMN.to_string(),
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from(defaults::UPLOADS_DIR),
            results_dir: PathBuf::from(defaults::RESULTS_DIR),
            logs_dir: PathBuf::from(defaults::LOGS_DIR),
            base_url: defaults::BASE_URL.to_string(),
            worker_concurrency: defaults::WORKER_CONCURRENCY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: true,
            log_dir: PathBuf::from(defaults::LOG_DIR),
            file_name: defaults::LOG_FILE_NAME.to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl AppConfig {
    /// Load defaults, `config/default.*` if present, an optional explicit file, then env.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("matching.stoplist"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::validation("http.user_agent must not be empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::validation("http.timeout_secs must be greater than 0"));
        }
        if self.http.max_redirects == 0 {
            return Err(ConfigError::validation("http.max_redirects must be greater than 0"));
        }
        if self.http.max_requests_per_second == 0 {
            return Err(ConfigError::validation(
                "http.max_requests_per_second must be greater than 0",
            ));
        }
        if self.extraction.max_categories == 0 {
            return Err(ConfigError::validation("extraction.max_categories must be greater than 0"));
        }
        if self.batch.row_batch_size == 0 || self.batch.scrape_chunk_size == 0 {
            return Err(ConfigError::validation("batch sizes must be greater than 0"));
        }
        if self.jobs.worker_concurrency == 0 {
            return Err(ConfigError::validation("jobs.worker_concurrency must be greater than 0"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::validation("cache.ttl_secs must be greater than 0"));
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err(ConfigError::validation("cache.sweep_interval_secs must be greater than 0"));
        }

        let m = &self.matching;
        if m.thresholds.min_matches == 0 {
            return Err(ConfigError::validation("matching.thresholds.min_matches must be at least 1"));
        }
        for (name, value) in [
            ("thresholds.min_confidence", m.thresholds.min_confidence),
            ("thresholds.min_average_similarity", m.thresholds.min_average_similarity),
            ("fuzzy_max_distance", m.fuzzy_max_distance),
            ("edit_min_similarity", m.edit_min_similarity),
            ("cosine_min_similarity", m.cosine_min_similarity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::validation(format!(
                    "matching.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if m.min_label_len > m.max_label_len {
            return Err(ConfigError::validation(
                "matching.min_label_len cannot be greater than max_label_len",
            ));
        }

        Ok(())
    }
}
