//! Product page parsing
//!
//! The page layout is a primary content region holding a two-column grid.
//! The left column carries the descriptive fields, the right column the
//! commercial ones (price, shipping, ranking). Only the region and grid are
//! required; any other missing element leaves its field empty.

use super::ExtractError;
use crate::url::reviews_url;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

const MAIN_REGION: &str = ".product-main-content.fx-content-product-grid__col";
const GRID: &str = ".fx-grid--prod";
const LEFT_COLUMN: &str = ".fx-grid__col.fx-col--lg-8";
const RIGHT_COLUMN: &str = ".fx-grid__col.fx-col--lg-4";

const TITLE: &str = ".product-title h1.product-title__title";
const REVIEW_COUNT: &str = "a .fx-rating-stars .product-title__rating-description";
const DESCRIPTION: &str = ".product-text[itemprop=\"description\"]";
const DESCRIPTION_TITLE: &str = ".text-original h2.fx-headline";
const DESCRIPTION_ITEMS: &str = "ul.product-text__list li";
const GOOD_TO_KNOW: &str = "p.fx-text--plus";
const BADGES: &str = "div.badges .badges__item a";
const KEY_FEATURES: &str = "div.keyfeatures";
const KEY_FEATURE: &str = ".keyfeature";
const KEY_FEATURE_LABEL: &str = ".keyfeature__label";
const KEY_FEATURE_VALUE: &str = ".fx-text--bold";

const STICKY_BOX: &str = "div.fx-position-sticky";
const PRICE_BOX: &str = "div.fx-position-sticky .product-price-box .price-and-availability";
const PRICE: &str = ".price-wrapper .price";
const PRODUCT_URL: &str = ".price-wrapper meta[itemprop=\"url\"]";
const DISCLAIMER: &str = ".meta .meta__disclaimer";
const SHIPPING: &str =
    ".price-and-availability__tooltip-wrapper div[aria-label=\"tooltip\"] span span span.fx-availability";
const SHIPPING_PREDICTION: &str = ".shipping-prediction";
const RANK_VALUE: &str = ".meta-box__value";
const RANK_DESCRIPTION: &str = ".meta-box__texts .meta-box__description";
const RANK_CATEGORY: &str = ".meta-box__texts .meta-box__subtext";
const RANK_LINK: &str = ".product-rank-and-visitors a.meta-box--link";

/// Feature label dropped from the feature map
const SHOW_MORE_FEATURE: &str = "Show more";

/// Feature label renamed to [`ITEM_ID_FEATURE`]
const ITEM_NUMBER_FEATURE: &str = "Item number";
const ITEM_ID_FEATURE: &str = "item_id";

/// Fields read from a product page, before cleaning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductData {
    pub product_title: Option<String>,
    pub review_count: Option<String>,
    pub description_title: Option<String>,
    pub description_text: Option<String>,
    pub good_to_know: Option<String>,
    pub badges: Option<Vec<String>>,
    pub features: Option<BTreeMap<String, String>>,
    pub price: Option<String>,
    pub product_url: Option<String>,
    pub disclaimer: Option<String>,
    pub shipping: Option<String>,
    pub shipping_prediction: Option<String>,
    pub ranking: RankingData,
    pub reviews_url: Option<String>,
}

/// The category rank block of the right column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingData {
    pub rank_value: Option<String>,
    pub rank_description: Option<String>,
    pub rank_category: Option<String>,
    pub rank_link: Option<String>,
}

impl ProductData {
    /// True when the page yielded no field at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Extracts a product from rendered page HTML
///
/// Returns `None` when the page lacks the product layout; that case is logged
/// once at error level. Missing fields inside the layout are left as `None`.
pub fn extract_product_data(html: &str) -> Option<ProductData> {
    match parse_product(html) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::error!("Error parsing page content: {}", e);
            None
        }
    }
}

/// Like [`extract_product_data`] but reports why the layout was rejected
pub fn parse_product(html: &str) -> Result<ProductData, ExtractError> {
    let document = Html::parse_document(html);

    let main = select_first(document.root_element(), MAIN_REGION)
        .ok_or(ExtractError::MissingContainer("main content region"))?;
    let grid = select_first(main, GRID).ok_or(ExtractError::MissingContainer("product grid"))?;

    let mut data = ProductData::default();

    if let Some(left) = select_first(grid, LEFT_COLUMN) {
        read_left_column(left, &mut data);
    }
    if let Some(right) = select_first(grid, RIGHT_COLUMN) {
        read_right_column(right, &mut data);
    }

    Ok(data)
}

fn read_left_column(left: ElementRef<'_>, data: &mut ProductData) {
    data.product_title = select_text(left, TITLE);
    data.review_count = select_text(left, REVIEW_COUNT);

    let Some(description) = select_first(left, DESCRIPTION) else {
        return;
    };

    data.description_title = select_text(description, DESCRIPTION_TITLE);
    data.description_text = description_text(description);
    data.good_to_know = select_text(description, GOOD_TO_KNOW);
    data.badges = Some(
        select_all(description, BADGES)
            .into_iter()
            .map(stripped_text)
            .collect(),
    );
    data.features = select_first(description, KEY_FEATURES).map(key_features);
}

/// Joins the first span of every description bullet into sentences
fn description_text(description: ElementRef<'_>) -> Option<String> {
    let span = Selector::parse("span").ok()?;
    let sentences: Vec<String> = select_all(description, DESCRIPTION_ITEMS)
        .into_iter()
        .filter_map(|li| li.select(&span).next())
        .map(|s| format!("{}.", element_text(s)))
        .collect();

    if sentences.is_empty() {
        None
    } else {
        Some(sentences.join(" "))
    }
}

fn key_features(container: ElementRef<'_>) -> BTreeMap<String, String> {
    let mut features = BTreeMap::new();
    for feature in select_all(container, KEY_FEATURE) {
        let label = select_first(feature, KEY_FEATURE_LABEL).map(stripped_text);
        let value = select_first(feature, KEY_FEATURE_VALUE).map(stripped_text);
        if let (Some(label), Some(value)) = (label, value) {
            features.insert(label, value);
        }
    }

    features.remove(SHOW_MORE_FEATURE);
    if let Some(item_number) = features.remove(ITEM_NUMBER_FEATURE) {
        features.insert(ITEM_ID_FEATURE.to_string(), item_number);
    }
    features
}

fn read_right_column(right: ElementRef<'_>, data: &mut ProductData) {
    if let Some(price_box) = select_first(right, PRICE_BOX) {
        data.price = select_text(price_box, PRICE);
        data.product_url = select_first(price_box, PRODUCT_URL)
            .and_then(|meta| meta.value().attr("content"))
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty());
        data.reviews_url = data.product_url.as_deref().map(reviews_url);
        data.disclaimer = select_text(price_box, DISCLAIMER);
        data.shipping = select_text(price_box, SHIPPING);
        data.shipping_prediction = select_first(price_box, SHIPPING_PREDICTION)
            .and_then(shipping_prediction);
    }

    if let Some(sticky) = select_first(right, STICKY_BOX) {
        data.ranking = RankingData {
            rank_value: select_text(sticky, RANK_VALUE),
            rank_description: select_text(sticky, RANK_DESCRIPTION),
            rank_category: select_text(sticky, RANK_CATEGORY),
            rank_link: select_first(sticky, RANK_LINK)
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string),
        };
    }
}

/// Delivery estimate: the prediction link text, plus the date window when
/// exactly two dates are given
fn shipping_prediction(prediction: ElementRef<'_>) -> Option<String> {
    let mut text = select_text(prediction, "a").unwrap_or_default();

    let dates: Vec<String> = select_all(prediction, "strong span")
        .into_iter()
        .map(element_text)
        .collect();
    if let [from, to] = dates.as_slice() {
        text.push_str(&format!(", expected between: {} and {}", from, to));
    }

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn select_first<'a>(scope: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    scope.select(&selector).next()
}

fn select_all<'a>(scope: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Trimmed text of the first match, `None` when absent or blank
fn select_text(scope: ElementRef<'_>, selector: &str) -> Option<String> {
    select_first(scope, selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Concatenation of every trimmed text node
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(left: &str, right: &str) -> String {
        format!(
            r#"<html><body>
            <div class="product-main-content fx-content-product-grid__col">
              <div class="fx-grid fx-grid--prod">
                {}
                {}
              </div>
            </div>
            </body></html>"#,
            left, right
        )
    }

    const LEFT: &str = r#"
        <div class="fx-grid__col fx-col--lg-8">
          <div class="product-title">
            <h1 class="product-title__title"> Harley Benton ST-20 </h1>
            <a href="reviews.htm"><div class="fx-rating-stars">
              <span class="product-title__rating-description">1234</span>
            </div></a>
          </div>
          <div class="product-text" itemprop="description">
            <div class="text-original"><h2 class="fx-headline">Electric Guitar</h2></div>
            <ul class="product-text__list">
              <li><span>Basswood body</span></li>
              <li><span>Maple neck</span></li>
              <li>no span here</li>
            </ul>
            <p class="fx-text--plus">Supplied without case</p>
            <div class="badges">
              <div class="badges__item"><a> Top <b>Seller</b> </a></div>
              <div class="badges__item"><a>Customer favourite</a></div>
            </div>
            <div class="keyfeatures">
              <div class="keyfeature"><span class="keyfeature__label">Body</span><span class="fx-text--bold">Basswood</span></div>
              <div class="keyfeature"><span class="keyfeature__label">Item number</span><span class="fx-text--bold">123456</span></div>
              <div class="keyfeature"><span class="keyfeature__label">Show more</span><span class="fx-text--bold">...</span></div>
              <div class="keyfeature"><span class="keyfeature__label">Orphan</span></div>
            </div>
          </div>
        </div>"#;

    const RIGHT: &str = r#"
        <div class="fx-grid__col fx-col--lg-4">
          <div class="fx-position-sticky">
            <div class="product-price-box">
              <div class="price-and-availability">
                <div class="price-wrapper">
                  <meta itemprop="url" content="https://www.thomann.de/gb/harley_benton_st20.htm">
                  <span class="price">£ 79</span>
                </div>
                <div class="meta"><span class="meta__disclaimer">incl. VAT</span></div>
                <div class="price-and-availability__tooltip-wrapper">
                  <div aria-label="tooltip"><span><span><span class="fx-availability">In stock</span></span></span></div>
                </div>
                <div class="shipping-prediction">
                  <a>Delivery</a>
                  <strong><span>Monday</span><span>Tuesday</span></strong>
                </div>
              </div>
            </div>
            <div class="product-rank-and-visitors">
              <a class="meta-box--link" href="/gb/st_models.html">
                <span class="meta-box__value">3</span>
                <span class="meta-box__texts">
                  <span class="meta-box__description">Rank</span>
                  <span class="meta-box__subtext">ST-Style Guitars</span>
                </span>
              </a>
            </div>
          </div>
        </div>"#;

    #[test]
    fn test_full_page() {
        let data = extract_product_data(&page(LEFT, RIGHT)).unwrap();

        assert_eq!(data.product_title.as_deref(), Some("Harley Benton ST-20"));
        assert_eq!(data.review_count.as_deref(), Some("1234"));
        assert_eq!(data.description_title.as_deref(), Some("Electric Guitar"));
        assert_eq!(
            data.description_text.as_deref(),
            Some("Basswood body. Maple neck.")
        );
        assert_eq!(data.good_to_know.as_deref(), Some("Supplied without case"));
        assert_eq!(
            data.badges,
            Some(vec!["TopSeller".to_string(), "Customer favourite".to_string()])
        );

        let features = data.features.unwrap();
        assert_eq!(features.get("Body").map(String::as_str), Some("Basswood"));
        assert_eq!(features.get("item_id").map(String::as_str), Some("123456"));
        assert!(!features.contains_key("Item number"));
        assert!(!features.contains_key("Show more"));
        assert!(!features.contains_key("Orphan"));

        assert_eq!(data.price.as_deref(), Some("£ 79"));
        assert_eq!(
            data.product_url.as_deref(),
            Some("https://www.thomann.de/gb/harley_benton_st20.htm")
        );
        assert_eq!(
            data.reviews_url.as_deref(),
            Some("https://www.thomann.de/gb/harley_benton_st20_reviews.htm?page=1&order=latest&reviewlang%5B%5D=all")
        );
        assert_eq!(data.disclaimer.as_deref(), Some("incl. VAT"));
        assert_eq!(data.shipping.as_deref(), Some("In stock"));
        assert_eq!(
            data.shipping_prediction.as_deref(),
            Some("Delivery, expected between: Monday and Tuesday")
        );
        assert_eq!(data.ranking.rank_value.as_deref(), Some("3"));
        assert_eq!(data.ranking.rank_description.as_deref(), Some("Rank"));
        assert_eq!(data.ranking.rank_category.as_deref(), Some("ST-Style Guitars"));
        assert_eq!(data.ranking.rank_link.as_deref(), Some("/gb/st_models.html"));
    }

    #[test]
    fn test_left_column_only() {
        let data = extract_product_data(&page(LEFT, "")).unwrap();

        assert_eq!(data.product_title.as_deref(), Some("Harley Benton ST-20"));
        assert!(data.price.is_none());
        assert!(data.product_url.is_none());
        assert!(data.reviews_url.is_none());
        assert!(data.shipping_prediction.is_none());
        assert_eq!(data.ranking, RankingData::default());
    }

    #[test]
    fn test_missing_main_region() {
        let html = "<html><body><div class='fx-grid--prod'></div></body></html>";
        assert_eq!(
            parse_product(html),
            Err(ExtractError::MissingContainer("main content region"))
        );
        assert!(extract_product_data(html).is_none());
    }

    #[test]
    fn test_missing_grid() {
        let html = r#"<div class="product-main-content fx-content-product-grid__col"></div>"#;
        assert_eq!(
            parse_product(html),
            Err(ExtractError::MissingContainer("product grid"))
        );
    }

    #[test]
    fn test_empty_grid_yields_empty_record() {
        let data = extract_product_data(&page("", "")).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_prediction_needs_two_dates() {
        let right = r#"
            <div class="fx-grid__col fx-col--lg-4"><div class="fx-position-sticky">
              <div class="product-price-box"><div class="price-and-availability">
                <div class="shipping-prediction"><a>Ships soon</a><strong><span>Monday</span></strong></div>
              </div></div>
            </div></div>"#;
        let data = extract_product_data(&page("", right)).unwrap();
        assert_eq!(data.shipping_prediction.as_deref(), Some("Ships soon"));
    }
}
