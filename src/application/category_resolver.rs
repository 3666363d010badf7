//! Category resolution through the cache
//!
//! Cache hit returns the stored set. On a miss the underlying provider
//! extracts, and a non-empty result is written back. Cache failures are
//! logged and bypassed; they never block extraction.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::category::{CategoryExtraction, CategorySource};
use crate::domain::repositories::CategoryCacheRepository;
use crate::domain::services::CategoryProvider;

pub struct CachedCategoryResolver {
    provider: Arc<dyn CategoryProvider>,
    cache: Option<Arc<dyn CategoryCacheRepository>>,
}

impl CachedCategoryResolver {
    pub fn new(provider: Arc<dyn CategoryProvider>, cache: Arc<dyn CategoryCacheRepository>) -> Self {
        Self {
            provider,
            cache: Some(cache),
        }
    }

    /// Resolver that always goes to the provider
    pub fn uncached(provider: Arc<dyn CategoryProvider>) -> Self {
        Self { provider, cache: None }
    }
}

#[async_trait]
impl CategoryProvider for CachedCategoryResolver {
    async fn categories_for(&self, url: &str) -> CategoryExtraction {
        let Some(cache) = &self.cache else {
            return self.provider.categories_for(url).await;
        };

        match cache.lookup(url).await {
            Ok(Some(categories)) => {
                // provenance is not needed downstream of the cache
                return CategoryExtraction {
                    categories,
                    source: CategorySource::Fallback,
                };
            }
            Ok(None) => debug!("No live cache entry for {}", url),
            Err(e) => warn!("Cache lookup failed for {}: {}", url, e),
        }

        let extraction = self.provider.categories_for(url).await;
        if !extraction.categories.is_empty() {
            if let Err(e) = cache.store(url, &extraction.categories, extraction.source).await {
                warn!("Failed to cache categories for {}: {}", url, e);
            }
        }
        extraction
    }
}
