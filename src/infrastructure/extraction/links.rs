//! Generic anchor pass over the whole page

use scraper::Html;

use super::{LabelCollector, element_text, is_excluded_text, select_all};
use crate::domain::constants::extraction::{
    CATEGORY_PATH_SEGMENTS, LINK_TEXT_MIN_LEN, VERTICAL_URL_KEYWORDS,
};

pub fn extract(document: &Html) -> Vec<String> {
    let mut labels = LabelCollector::default();

    for anchor in select_all(document, "a[href]") {
        let href = anchor.value().attr("href").unwrap_or_default();
        let text = element_text(&anchor);
        if is_category_link(&text, href) {
            labels.push(&text);
        }
    }

    labels.finish()
}

/// Non-excluded anchor text whose href looks like a listing, or any
/// sufficiently long text.
pub fn is_category_link(text: &str, href: &str) -> bool {
    if text.is_empty() || href.is_empty() || is_excluded_text(text) {
        return false;
    }

    let href = href.to_lowercase();
    let category_path = CATEGORY_PATH_SEGMENTS.iter().any(|seg| href.contains(seg));
    let vertical = VERTICAL_URL_KEYWORDS.iter().any(|kw| href.contains(kw));

    category_path || vertical || text.chars().count() >= LINK_TEXT_MIN_LEN
}
