//! HTTP client for single-page category extraction
//!
//! Browser-like headers, a hard per-request timeout, a bounded redirect
//! chain and a process-wide rate limit shared by every job.

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use std::num::NonZeroU32;
use std::time::Duration;
use url::Url;

use crate::infrastructure::config::HttpConfig;
use crate::infrastructure::extraction_error::{ExtractionError, ExtractionResult};

/// HTTP client configuration for page fetches
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub timeout: Duration,
    pub max_redirects: usize,
    pub max_requests_per_second: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for HttpClientConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            accept: config.accept.clone(),
            accept_language: config.accept_language.clone(),
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
            max_requests_per_second: config.max_requests_per_second,
        }
    }
}

/// Rate limited fetch client
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&config.accept).context("Invalid accept header")?,
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).context("Invalid accept-language header")?,
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            config,
        })
    }

    /// Fetch a page body as text. Non-2xx statuses are errors.
    pub async fn get_text(&self, url: &Url) -> ExtractionResult<String> {
        self.rate_limiter.until_ready().await;

        tracing::debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ExtractionError::request_failed(url.as_str(), &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ExtractionError::body_read(url.as_str(), &e))?;

        tracing::debug!("Fetched {} ({} chars)", url, text.len());
        Ok(text)
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

/// Parse a site reference, prefixing `http://` when no scheme is given.
pub fn normalize_site_url(raw: &str) -> ExtractionResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::invalid_url(raw, "empty URL"));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|e| ExtractionError::invalid_url(raw, e))?;
    if url.host_str().is_none() {
        return Err(ExtractionError::invalid_url(raw, "missing host"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("example.com", "http://example.com/")]
    #[case("  https://shop.example.com/path ", "https://shop.example.com/path")]
    #[case("http://example.com", "http://example.com/")]
    #[case("www.example.com/store", "http://www.example.com/store")]
    fn test_normalize_site_url(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_site_url(raw).unwrap().as_str(), expected);
    }

    #[test]
    fn test_normalize_rejects_blank() {
        assert!(normalize_site_url("   ").is_err());
    }

    #[test]
    fn test_client_builds_from_default_config() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(10));
        assert_eq!(client.config().max_redirects, 5);
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let config = HttpClientConfig {
            max_requests_per_second: 0,
            ..HttpClientConfig::default()
        };
        assert!(HttpClient::new(config).is_err());
    }
}
