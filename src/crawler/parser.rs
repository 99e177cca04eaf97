//! Link extraction from rendered listing pages
//!
//! Two flavors:
//! - category links on the index page must already be absolute
//! - product anchors in a category grid may be relative and are resolved
//!   against the site's link base

use crate::url::{is_valid_url, resolve_link};
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};
use url::Url;

/// Returns the raw `href` of every element matching `selector`
///
/// An unparsable selector yields no hrefs.
pub fn extract_hrefs(html: &str, selector: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(selector) else {
        tracing::warn!("Invalid CSS selector: {}", selector);
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

/// Collects the hrefs matching `selector` that are valid absolute URLs
pub fn collect_absolute_links(html: &str, selector: &str) -> BTreeSet<String> {
    extract_hrefs(html, selector)
        .into_iter()
        .filter(|href| is_valid_url(href))
        .collect()
}

/// Collects the hrefs matching `selector`, resolved against `base`
pub fn collect_resolved_links(html: &str, selector: &str, base: &Url) -> HashSet<String> {
    extract_hrefs(html, selector)
        .iter()
        .filter_map(|href| resolve_link(href, base))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATEGORY_LINK: &str = ".link-list__item a.link-list__text";
    const ARTICLE_ANCHOR: &str = "div.js-content-wrapper div.js-articles a.js-item";

    fn base() -> Url {
        Url::parse("https://www.thomann.de/gb/").unwrap()
    }

    #[test]
    fn test_absolute_links_only() {
        let html = r#"<ul>
            <li class="link-list__item"><a class="link-list__text" href="https://shop.example/gb/guitars.html">G</a></li>
            <li class="link-list__item"><a class="link-list__text" href="not-a-url">X</a></li>
            <li class="link-list__item"><a class="link-list__text" href="/gb/drums.html">D</a></li>
            <li class="link-list__item"><a class="link-list__text">no href</a></li>
            <li><a class="link-list__text" href="https://shop.example/outside.html">O</a></li>
        </ul>"#;

        let links = collect_absolute_links(html, CATEGORY_LINK);
        assert_eq!(
            links.into_iter().collect::<Vec<_>>(),
            vec!["https://shop.example/gb/guitars.html"]
        );
    }

    #[test]
    fn test_relative_anchors_resolved() {
        let html = r#"<div class="js-content-wrapper"><div class="js-articles">
            <a class="js-item" href="harley_benton_st20.htm">1</a>
            <a class="js-item" href="/gb/fender_strat.htm">2</a>
            <a class="js-item" href="https://www.thomann.de/gb/gibson_lp.htm">3</a>
            <a class="js-item" href="harley_benton_st20.htm">dup</a>
            <a class="js-item" href="javascript:void(0)">js</a>
            <a class="other" href="ignored.htm">no</a>
        </div></div>"#;

        let links = collect_resolved_links(html, ARTICLE_ANCHOR, &base());
        assert_eq!(links.len(), 3);
        assert!(links.contains("https://www.thomann.de/gb/harley_benton_st20.htm"));
        assert!(links.contains("https://www.thomann.de/gb/fender_strat.htm"));
        assert!(links.contains("https://www.thomann.de/gb/gibson_lp.htm"));
    }

    #[test]
    fn test_anchor_outside_grid_ignored() {
        let html = r#"<a class="js-item" href="a.htm"></a>"#;
        assert!(collect_resolved_links(html, ARTICLE_ANCHOR, &base()).is_empty());
    }

    #[test]
    fn test_invalid_selector() {
        assert!(extract_hrefs("<a href='x'></a>", "a[").is_empty());
    }
}
