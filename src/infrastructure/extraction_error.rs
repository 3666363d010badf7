//! Error types for single-page category extraction
//!
//! None of these cross the extractor boundary: the extractor logs them and
//! returns an empty category set instead.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP request failed: {url} - {message}")]
    RequestFailed {
        url: String,
        message: String,
        timed_out: bool,
    },

    #[error("HTTP request failed with status {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {message}")]
    BodyRead { url: String, message: String },
}

impl ExtractionError {
    pub fn invalid_url(url: &str, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn request_failed(url: &str, source: &reqwest::Error) -> Self {
        Self::RequestFailed {
            url: url.to_string(),
            message: source.to_string(),
            timed_out: source.is_timeout(),
        }
    }

    pub fn body_read(url: &str, source: &reqwest::Error) -> Self {
        Self::BodyRead {
            url: url.to_string(),
            message: source.to_string(),
        }
    }

    /// Whether a later attempt could plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidUrl { .. } => false,
            Self::RequestFailed { .. } | Self::BodyRead { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;
