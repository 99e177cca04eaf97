use crate::config::types::{
    Config, CrawlerConfig, PathsConfig, SelectorConfig, SiteConfig, TimeoutConfig, TimeoutRange,
};
use crate::ConfigError;
use url::Url;

/// Upper bound on pages open at once in a product batch
const MAX_CONCURRENCY: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_paths_config(&config.paths)?;
    validate_crawler_config(&config.crawler)?;
    validate_timeout_config(&config.timeouts)?;
    validate_selector_config(&config.selectors)?;
    Ok(())
}

/// Validates the site URLs
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_absolute_url("index-url", &config.index_url)?;
    validate_absolute_url("link-base", &config.link_base)?;
    Ok(())
}

fn validate_absolute_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS",
            name, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            name, value
        )));
    }

    Ok(())
}

/// Validates checkpoint paths
fn validate_paths_config(config: &PathsConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("base-urls-file", &config.base_urls_file),
        ("endpoints-dir", &config.endpoints_dir),
        ("products-file", &config.products_file),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates that every timeout range is ordered
fn validate_timeout_config(config: &TimeoutConfig) -> Result<(), ConfigError> {
    let ranges: [(&str, TimeoutRange); 8] = [
        ("index-navigation", config.index_navigation),
        ("index-content", config.index_content),
        ("category-navigation", config.category_navigation),
        ("category-grid", config.category_grid),
        ("product-navigation", config.product_navigation),
        ("product-content", config.product_content),
        ("consent", config.consent),
        ("overlay", config.overlay),
    ];

    for (name, range) in ranges {
        if range.min > range.max {
            return Err(ConfigError::Validation(format!(
                "timeout '{}' has min {}ms greater than max {}ms",
                name, range.min, range.max
            )));
        }
    }

    Ok(())
}

/// Validates that no selector is blank
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (name, selector) in [
        ("content-wrapper", &config.content_wrapper),
        ("category-link", &config.category_link),
        ("article-grid", &config.article_grid),
        ("article-anchor", &config.article_anchor),
        ("load-more", &config.load_more),
        ("loading-overlay", &config.loading_overlay),
        ("loading-indicator", &config.loading_indicator),
        ("consent-button", &config.consent_button),
    ] {
        if selector.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "selector '{}' cannot be empty",
                name
            )));
        }
    }
    Ok(())
}
