//! URL handling module for Catalog-Harvest
//!
//! Validation of scraped hrefs, category slug derivation, relative link
//! resolution and the reviews-page URL derived from a product URL.

use crate::{UrlError, UrlResult};
use url::Url;

/// Slug used when a URL has no usable path segment
pub const UNKNOWN_SLUG: &str = "unknown";

/// Page suffix of product URLs
const PRODUCT_PAGE_SUFFIX: &str = ".htm";

/// Replacement that turns a product page into its first, newest-first reviews page
const REVIEWS_PAGE_SUFFIX: &str = "_reviews.htm?page=1&order=latest&reviewlang%5B%5D=all";

/// Returns true if `candidate` is an absolute URL with both a scheme and a host
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::is_valid_url;
///
/// assert!(is_valid_url("https://example.com/product1"));
/// assert!(!is_valid_url("invalid-url"));
/// ```
pub fn is_valid_url(candidate: &str) -> bool {
    match Url::parse(candidate.trim()) {
        Ok(url) => !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Parses `candidate` into an absolute URL, rejecting host-less URLs
pub fn parse_absolute(candidate: &str) -> UrlResult<Url> {
    let url = Url::parse(candidate.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(candidate.to_string()));
    }
    Ok(url)
}

/// Derives the category slug from the last non-empty path segment
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::extract_endpoint_name;
///
/// assert_eq!(extract_endpoint_name("https://site/gb/product/1"), "1");
/// assert_eq!(extract_endpoint_name("https://site/gb/"), "gb");
/// assert_eq!(extract_endpoint_name("https://site/"), "unknown");
/// ```
pub fn extract_endpoint_name(url: &str) -> String {
    let path = match Url::parse(url.trim()) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.trim().to_string(),
    };

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_SLUG.to_string())
}

/// Makes a slug safe to use as a file stem
pub fn slug_file_stem(slug: &str) -> String {
    let stem: String = slug
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.trim_matches('.').is_empty() {
        UNKNOWN_SLUG.to_string()
    } else {
        stem
    }
}

/// Resolves an href against `base`, keeping only HTTP(S) results
///
/// Returns None for empty hrefs, fragment-only links, script/mail/tel/data
/// schemes and anything that fails to resolve.
pub fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

/// Derives the reviews page URL from a product page URL
///
/// The last `.htm` page suffix is replaced; URLs without one are returned
/// unchanged.
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::reviews_url;
///
/// assert_eq!(
///     reviews_url("https://shop.example.com/gb/amp.htm"),
///     "https://shop.example.com/gb/amp_reviews.htm?page=1&order=latest&reviewlang%5B%5D=all"
/// );
/// ```
pub fn reviews_url(product_url: &str) -> String {
    match product_url.rfind(PRODUCT_PAGE_SUFFIX) {
        Some(idx) => {
            let tail = &product_url[idx + PRODUCT_PAGE_SUFFIX.len()..];
            format!("{}{}{}", &product_url[..idx], REVIEWS_PAGE_SUFFIX, tail)
        }
        None => product_url.to_string(),
    }
}
