//! Request headers for product page navigation
//!
//! The header set imitates a visitor following a link within the site: a
//! same-origin fetch with a referer, and a user agent drawn once per set.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Desktop browser user agents the set picks from
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.85 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
];

/// Header name/value pairs, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderSet(BTreeMap<String, String>);

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers for a same-origin navigation referred from `referer`
    pub fn referred_navigation(referer: &str) -> Self {
        Self::referred_navigation_with(&mut rand::thread_rng(), referer)
    }

    /// Like [`HeaderSet::referred_navigation`] with an explicit RNG
    pub fn referred_navigation_with<R: Rng>(rng: &mut R, referer: &str) -> Self {
        let user_agent = USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0]);

        let mut headers = Self::new();
        headers
            .insert(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
            )
            .insert("accept-language", "en-US,en;q=0.9")
            .insert("cache-control", "max-age=0")
            .insert("priority", "u=0, i")
            .insert("referer", referer)
            .insert("sec-ch-ua-mobile", "?0")
            .insert("sec-ch-ua-platform", "\"macOS\"")
            .insert("sec-fetch-dest", "document")
            .insert("sec-fetch-mode", "navigate")
            .insert("sec-fetch-site", "same-origin")
            .insert("sec-fetch-user", "?1")
            .insert("upgrade-insecure-requests", "1")
            .insert("user-agent", user_agent);
        headers
    }

    /// Sets a header, replacing any previous value
    pub fn insert(&mut self, name: &str, value: &str) -> &mut Self {
        self.0.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
