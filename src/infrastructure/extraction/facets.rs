//! Product listing filters, facets and category tags

use scraper::Html;

use super::{LabelCollector, element_text, select_all, select_within};
use crate::domain::constants::extraction::{FACET_MAX_LEN, FACET_MIN_LEN};

const FACET_CONTAINERS: &str = r#"[class*="filter"], [class*="facet"], [class*="category"]"#;
const CATEGORY_TAGS: &str = ".product-category, .category-link, [data-category]";

pub fn extract(document: &Html) -> Vec<String> {
    let mut labels = LabelCollector::default();

    for container in select_all(document, FACET_CONTAINERS) {
        for entry in select_within(&container, "a, label") {
            let text = element_text(&entry);
            let len = text.chars().count();
            if (FACET_MIN_LEN..=FACET_MAX_LEN).contains(&len) {
                labels.push(&text);
            }
        }
    }

    // text first, then the data attribute, then the title
    for tag in select_all(document, CATEGORY_TAGS) {
        let text = element_text(&tag);
        let value = if text.is_empty() {
            tag.value()
                .attr("data-category")
                .filter(|v| !v.is_empty())
                .or_else(|| tag.value().attr("title"))
                .map(str::to_string)
                .unwrap_or_default()
        } else {
            text
        };
        if value.chars().count() >= FACET_MIN_LEN {
            labels.push(&value);
        }
    }

    labels.finish()
}
