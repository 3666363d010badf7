//! Navigation menu and breadcrumb pass

use scraper::Html;

use super::{LabelCollector, element_text, is_excluded_text, is_navigation_href, select_all, select_within};
use crate::domain::constants::extraction::{BREADCRUMB_MAX_LEN, BREADCRUMB_MIN_LEN};

const NAV_CONTAINERS: &str = r#"nav, [role="navigation"], .nav, .navigation, .menu"#;
const BREADCRUMB_CONTAINERS: &str = r#".breadcrumb, .breadcrumbs, [class*="breadcrumb"]"#;

pub fn extract(document: &Html) -> Vec<String> {
    let mut labels = LabelCollector::default();

    for container in select_all(document, NAV_CONTAINERS) {
        for anchor in select_within(&container, "a") {
            let href = anchor.value().attr("href").unwrap_or_default();
            let text = element_text(&anchor);
            if !is_navigation_href(href) || is_excluded_text(&text) {
                continue;
            }
            labels.push(&text);
        }
    }

    for container in select_all(document, BREADCRUMB_CONTAINERS) {
        for crumb in select_within(&container, "a, span") {
            let text = element_text(&crumb);
            let len = text.chars().count();
            if (BREADCRUMB_MIN_LEN..=BREADCRUMB_MAX_LEN).contains(&len) {
                labels.push(&text);
            }
        }
    }

    labels.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(markup: &str) -> Vec<String> {
        extract(&Html::parse_document(markup))
    }

    #[test]
    fn test_nav_links_filtered() {
        let labels = run(r#"
            <nav>
              <a href="/">Home</a>
              <a href="/women">Women's Clothing</a>
              <a href="javascript:void(0)">Open menu</a>
              <a href="/kids#new">Kids</a>
              <a href="/go">Go</a>
            </nav>
            <div role="navigation"><a href="/men">Men</a></div>
            <ul class="menu"><li><a href="/login">Login</a></li><li><a href="/sale">Outlet</a></li></ul>
        "#);
        assert_eq!(labels, ["women s clothing", "men", "outlet"]);
    }

    #[test]
    fn test_breadcrumb_text_window() {
        let labels = run(r#"
            <ol class="breadcrumb">
              <li><a href="/">Home</a></li>
              <li><a href="/shoes">Shoes</a></li>
              <li><span>Running Shoes For Trail And Road Use</span></li>
            </ol>
        "#);
        // breadcrumbs skip the exclusion vocabulary but not the length window
        assert_eq!(labels, ["home", "shoes"]);
    }

    #[test]
    fn test_nested_containers_are_deduplicated() {
        let labels = run(r#"<nav class="nav"><div class="menu"><a href="/tea">Tea</a></div></nav>"#);
        assert_eq!(labels, ["tea"]);
    }
}
