//! Tiered category extraction from a single page
//!
//! Four independent passes run over the same parsed document, in order:
//! structured data, navigation, product facets, generic links. Their
//! labels are unioned in that order, cleaned, filtered and capped. Each
//! pass is a plain `fn(&Html) -> Vec<String>` so it can be tested on
//! fixture markup without any network.

pub mod facets;
pub mod links;
pub mod navigation;
pub mod structured_data;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::domain::category::{CategoryExtraction, CategorySet, CategorySource, clean_label};
use crate::domain::constants::extraction::{EXCLUDED_LINK_TERMS, LINK_TEXT_MAX_LEN, LINK_TEXT_MIN_LEN};
use crate::domain::services::CategoryProvider;
use crate::infrastructure::extraction_error::ExtractionResult;
use crate::infrastructure::http_client::{HttpClient, normalize_site_url};

/// One extraction pass over a parsed document
pub type ExtractionTier = fn(&Html) -> Vec<String>;

/// Passes in union order, each tagged with the source it is credited to
pub const TIERS: [(CategorySource, ExtractionTier); 4] = [
    (CategorySource::StructuredData, structured_data::extract),
    (CategorySource::Navigation, navigation::extract),
    (CategorySource::Products, facets::extract),
    (CategorySource::Links, links::extract),
];

/// Run every tier over `markup` and build the capped category set.
///
/// The reported source is the tier that contributed the most labels to the
/// final set; ties go to the earlier tier and an empty set is `Fallback`.
pub fn extract_from_markup(markup: &str, max_categories: usize) -> CategoryExtraction {
    let document = Html::parse_document(markup);

    let tier_labels: Vec<(CategorySource, Vec<String>)> = TIERS
        .iter()
        .map(|(source, tier)| (*source, tier(&document)))
        .collect();

    let categories = CategorySet::from_raw_labels_capped(
        tier_labels.iter().flat_map(|(_, labels)| labels.iter()),
        max_categories,
    );

    let source = dominant_source(&categories, &tier_labels);
    CategoryExtraction { categories, source }
}

fn dominant_source(categories: &CategorySet, tier_labels: &[(CategorySource, Vec<String>)]) -> CategorySource {
    let mut counts = vec![0_usize; tier_labels.len()];
    for label in categories.iter() {
        if let Some(idx) = tier_labels
            .iter()
            .position(|(_, labels)| labels.iter().any(|l| l == label))
        {
            counts[idx] += 1;
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (idx, count) in counts.iter().enumerate() {
        if *count > 0 && best.is_none_or(|(_, best_count)| *count > best_count) {
            best = Some((idx, *count));
        }
    }

    best.map_or(CategorySource::Fallback, |(idx, _)| tier_labels[idx].0)
}

/// Lowercased, trimmed text content of an element
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_lowercase()
}

/// Every element matching `css`. An unparsable selector matches nothing.
pub(crate) fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(e) => {
            debug!("Skipping selector {}: {:?}", css, e);
            Vec::new()
        }
    }
}

/// Descendants of `scope` matching `css`
pub(crate) fn select_within<'a>(scope: &ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Hrefs that never lead to a listing page
pub(crate) fn is_navigation_href(href: &str) -> bool {
    !href.contains('#')
        && !href.contains("javascript:")
        && !href.starts_with("mailto:")
        && !href.starts_with("tel:")
}

/// Anchor text that is never a category: utility pages or out-of-range length
pub(crate) fn is_excluded_text(text: &str) -> bool {
    let len = text.chars().count();
    let lowered = text.to_lowercase();
    EXCLUDED_LINK_TERMS.iter().any(|term| lowered.contains(term))
        || !(LINK_TEXT_MIN_LEN..=LINK_TEXT_MAX_LEN).contains(&len)
}

/// Ordered, per-tier deduplicating collector of cleaned labels
#[derive(Default)]
pub(crate) struct LabelCollector {
    seen: HashSet<String>,
    labels: Vec<String>,
}

impl LabelCollector {
    pub(crate) fn push(&mut self, raw: &str) {
        let cleaned = clean_label(raw);
        if !cleaned.is_empty() && self.seen.insert(cleaned.clone()) {
            self.labels.push(cleaned);
        }
    }

    pub(crate) fn finish(self) -> Vec<String> {
        self.labels
    }
}

/// Category extractor backed by a live HTTP fetch
pub struct CategoryExtractor {
    client: HttpClient,
    max_categories: usize,
}

impl CategoryExtractor {
    pub fn new(client: HttpClient, max_categories: usize) -> Self {
        Self { client, max_categories }
    }

    /// Fetch and extract, surfacing errors to the caller.
    pub async fn try_extract(&self, raw_url: &str) -> ExtractionResult<CategoryExtraction> {
        let url = normalize_site_url(raw_url)?;
        let markup = self.client.get_text(&url).await?;
        // Html is not Send: parse and extract fully before returning
        Ok(extract_from_markup(&markup, self.max_categories))
    }

    /// Fetch and extract; any failure yields an empty extraction.
    pub async fn extract(&self, raw_url: &str) -> CategoryExtraction {
        match self.try_extract(raw_url).await {
            Ok(extraction) => {
                debug!(
                    "Extracted {} categories from {} (source: {})",
                    extraction.categories.len(),
                    raw_url,
                    extraction.source
                );
                extraction
            }
            Err(e) => {
                warn!(url = raw_url, recoverable = e.is_recoverable(), "Category extraction failed: {}", e);
                CategoryExtraction::empty()
            }
        }
    }
}

#[async_trait]
impl CategoryProvider for CategoryExtractor {
    async fn categories_for(&self, url: &str) -> CategoryExtraction {
        self.extract(url).await
    }
}
