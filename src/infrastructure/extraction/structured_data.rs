//! JSON-LD structured data pass

use scraper::Html;
use serde_json::Value;

use super::{LabelCollector, select_all};
use crate::domain::constants::extraction::STRUCTURED_DATA_TYPES;

/// Categories, genres and breadcrumb names from every JSON-LD block.
/// Blocks that fail to parse are skipped.
pub fn extract(document: &Html) -> Vec<String> {
    let mut labels = LabelCollector::default();

    for script in select_all(document, r#"script[type="application/ld+json"]"#) {
        let body: String = script.text().collect();
        let Ok(json) = serde_json::from_str::<Value>(&body) else {
            continue;
        };

        match json {
            Value::Array(items) => items.iter().for_each(|item| process_item(item, &mut labels)),
            item => process_item(&item, &mut labels),
        }
    }

    labels.finish()
}

fn process_item(item: &Value, labels: &mut LabelCollector) {
    let relevant = item
        .get("@type")
        .and_then(Value::as_str)
        .is_some_and(|t| STRUCTURED_DATA_TYPES.contains(&t));
    if !relevant {
        return;
    }

    if let Some(category) = item.get("category").and_then(Value::as_str).filter(|s| !s.is_empty()) {
        labels.push(category);
    } else if let Some(genre) = item.get("genre").and_then(Value::as_str).filter(|s| !s.is_empty()) {
        labels.push(genre);
    }

    let elements = item
        .get("breadcrumb")
        .and_then(|b| b.get("itemListElement"))
        .and_then(Value::as_array);
    for element in elements.into_iter().flatten() {
        if let Some(name) = element
            .get("item")
            .and_then(|i| i.get("name"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            labels.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(markup: &str) -> Vec<String> {
        extract(&Html::parse_document(markup))
    }

    #[test]
    fn test_product_category_and_breadcrumb() {
        let labels = run(r#"<script type="application/ld+json">
            {"@type":"WebPage","category":"Home & Garden",
             "breadcrumb":{"itemListElement":[
                {"item":{"name":"Outdoor"}},{"item":{"name":"Patio Furniture"}},{"position":3}]}}
        </script>"#);
        assert_eq!(labels, ["home garden", "outdoor", "patio furniture"]);
    }

    #[test]
    fn test_genre_used_only_without_category() {
        let labels = run(r#"<script type="application/ld+json">
            [{"@type":"Product","genre":"Science Fiction"},
             {"@type":"Product","category":"Books","genre":"Ignored"}]
        </script>"#);
        assert_eq!(labels, ["science fiction", "books"]);
    }

    #[test]
    fn test_irrelevant_types_and_bad_json_are_skipped() {
        let labels = run(r#"
            <script type="application/ld+json">{"@type":"Organization","category":"Nope"}</script>
            <script type="application/ld+json">{ not json </script>
            <script type="application/ld+json">{"@type":"Collection","category":"Toys"}</script>
        "#);
        assert_eq!(labels, ["toys"]);
    }
}
