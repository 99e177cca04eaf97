//! Cleaned product records and their fingerprints

use super::product::{ProductData, RankingData};
use serde::{Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Placeholder written for every field the page did not provide
pub const NULL_SENTINEL: &str = "null";

/// A cleaned product as it is persisted, one JSON object per line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    #[serde(serialize_with = "or_null")]
    pub product_title: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub review_count: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub description_title: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub description_text: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub good_to_know: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub badges: Option<Vec<String>>,
    #[serde(serialize_with = "or_null")]
    pub features: Option<BTreeMap<String, String>>,
    #[serde(serialize_with = "or_null")]
    pub price: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub product_url: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub disclaimer: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub shipping: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub shipping_prediction: Option<String>,
    pub ranking: RankingRecord,
    #[serde(serialize_with = "or_null")]
    pub reviews_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingRecord {
    #[serde(serialize_with = "or_null")]
    pub rank_value: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub rank_description: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub rank_category: Option<String>,
    #[serde(serialize_with = "or_null")]
    pub rank_link: Option<String>,
}

fn or_null<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(NULL_SENTINEL),
    }
}

/// Collapses whitespace runs to one space and trims both ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean(value: &Option<String>) -> Option<String> {
    value.as_deref().map(collapse_whitespace)
}

impl From<&ProductData> for ProductRecord {
    fn from(data: &ProductData) -> Self {
        Self {
            product_title: clean(&data.product_title),
            review_count: clean(&data.review_count),
            description_title: clean(&data.description_title),
            description_text: clean(&data.description_text),
            good_to_know: clean(&data.good_to_know),
            badges: data
                .badges
                .as_ref()
                .map(|badges| badges.iter().map(|b| collapse_whitespace(b)).collect()),
            features: data.features.as_ref().map(|features| {
                features
                    .iter()
                    .map(|(k, v)| (k.clone(), collapse_whitespace(v)))
                    .collect()
            }),
            price: clean(&data.price),
            product_url: clean(&data.product_url),
            disclaimer: clean(&data.disclaimer),
            shipping: clean(&data.shipping),
            shipping_prediction: clean(&data.shipping_prediction),
            ranking: RankingRecord::from(&data.ranking),
            reviews_url: clean(&data.reviews_url),
        }
    }
}

impl From<&RankingData> for RankingRecord {
    fn from(ranking: &RankingData) -> Self {
        Self {
            rank_value: clean(&ranking.rank_value),
            rank_description: clean(&ranking.rank_description),
            rank_category: clean(&ranking.rank_category),
            rank_link: clean(&ranking.rank_link),
        }
    }
}

impl ProductRecord {
    /// Serializes with object keys sorted at every level
    pub fn canonical_json(&self) -> serde_json::Result<String> {
        let value = sorted(serde_json::to_value(self)?);
        serde_json::to_string(&value)
    }

    /// SHA-256 hex digest of the canonical JSON form
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        Ok(fingerprint(&self.canonical_json()?))
    }
}

/// Rebuilds every object with its keys in ascending order
fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

/// SHA-256 hex digest of `canonical`
pub fn fingerprint(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
