//! Adapter for thenaturalpetstore.co.uk, a Shopify storefront.
//!
//! Listings state their product count and paginate 24 per page. Name,
//! description and rating come from the product page; variants and prices
//! come from the same URL requested as JSON.

use std::str::FromStr;
use std::sync::LazyLock;

use async_trait::async_trait;
use petprice_core::normalize::parse_price;
use petprice_core::{Discount, ProductRowSet, Rating, Shop, ShopConfig, UrlRow};
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use serde::Deserialize;

use super::ShopAdapter;
use crate::document::Document;
use crate::error::ScraperError;
use crate::fetch::Fetch;
use crate::parse::{absolute_url, first_text, static_selector};

pub(crate) const PAGE_SIZE: usize = 24;

const NO_REVIEWS: &str = "No reviews";
const JSON_HEADERS: [(&str, &str); 1] = [("Accept", "application/json")];

static PRODUCT_COUNT: LazyLock<Selector> =
    LazyLock::new(|| static_selector("p.collection__products-count-total"));
static PRODUCT_ITEM: LazyLock<Selector> =
    LazyLock::new(|| static_selector("div.product-item--vertical"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| static_selector("a"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| static_selector("h1.product-meta__title"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    static_selector("div.product-block-list__item--description div.text--pull")
});
static RATING_CAPTION: LazyLock<Selector> =
    LazyLock::new(|| static_selector("span.rating__caption"));
static RATING_STARS: LazyLock<Selector> = LazyLock::new(|| static_selector("div.rating__stars"));

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number regex"));

#[derive(Debug, Clone)]
pub struct TheNaturalPetStore {
    base_url: String,
}

impl Default for TheNaturalPetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TheNaturalPetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(Shop::TheNaturalPetStore.config().base_url)
    }

    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn relative_url<'a>(&self, url: &'a str) -> &'a str {
        url.strip_prefix(self.base_url.as_str()).unwrap_or(url)
    }

    async fn fetch_variants(
        &self,
        fetcher: &dyn Fetch,
        url: &str,
    ) -> Result<Vec<(String, Discount)>, ScraperError> {
        let body = fetcher
            .fetch_json(url, &JSON_HEADERS)
            .await?
            .ok_or_else(|| ScraperError::Parse {
                url: url.to_string(),
                reason: "product JSON unavailable".to_string(),
            })?;
        parse_variants(body, url)
    }
}

#[async_trait]
impl ShopAdapter for TheNaturalPetStore {
    fn config(&self) -> &'static ShopConfig {
        Shop::TheNaturalPetStore.config()
    }

    async fn discover_links(
        &self,
        fetcher: &dyn Fetch,
        category: &str,
    ) -> Result<Vec<UrlRow>, ScraperError> {
        self.validate_category(category)?;

        let listing = format!("{}{category}", self.base_url);
        let Some(first) = fetcher.fetch(&listing, "", &[]).await? else {
            tracing::warn!(url = %listing, "collection page unavailable");
            return Ok(Vec::new());
        };

        let total = product_count(first.body()).unwrap_or(0);
        let pages = total.div_ceil(PAGE_SIZE);
        tracing::debug!(category, total, pages, "collection size");

        let mut rows = Vec::new();
        for page in 1..=pages {
            let page_url = format!("{listing}?page={page}");
            let Some(document) = fetcher.fetch(&page_url, "", &[]).await? else {
                tracing::warn!(url = %page_url, "collection page unavailable");
                continue;
            };
            rows.extend(
                extract_product_links(document.body(), &self.base_url)
                    .into_iter()
                    .map(|link| UrlRow::new(self.shop_name(), link)),
            );
        }

        Ok(rows)
    }

    async fn parse_product(
        &self,
        fetcher: &dyn Fetch,
        document: &Document,
        url: &str,
    ) -> Option<ProductRowSet> {
        let page = match parse_product_page(document.body(), url) {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(url, error = %e, "failed to parse product page");
                return None;
            }
        };

        let variants = match self.fetch_variants(fetcher, url).await {
            Ok(variants) => variants,
            Err(e) => {
                tracing::error!(url, error = %e, "failed to read product variants");
                return None;
            }
        };

        let mut rows = ProductRowSet::new(
            self.shop_name(),
            page.name,
            page.rating,
            page.description,
            self.relative_url(url),
        );
        for (label, discount) in variants {
            rows.push_variant(label, discount);
        }
        Some(rows)
    }
}

#[derive(Debug)]
pub(crate) struct ProductPage {
    pub name: String,
    pub description: Option<String>,
    pub rating: Rating,
}

/// Number of products a collection page says it holds ("118 products").
pub(crate) fn product_count(body: &str) -> Option<usize> {
    let html = Html::parse_document(body);
    let text = first_text(&html, &PRODUCT_COUNT)?;
    NUMBER_RE.find(&text)?.as_str().parse().ok()
}

pub(crate) fn extract_product_links(body: &str, base_url: &str) -> Vec<String> {
    let html = Html::parse_document(body);
    html.select(&PRODUCT_ITEM)
        .filter_map(|item| item.select(&ANCHOR).next())
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| absolute_url(base_url, href))
        .collect()
}

pub(crate) fn parse_product_page(body: &str, url: &str) -> Result<ProductPage, ScraperError> {
    let html = Html::parse_document(body);

    let name = first_text(&html, &TITLE)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ScraperError::Parse {
            url: url.to_string(),
            reason: "missing product title".to_string(),
        })?;
    let description = first_text(&html, &DESCRIPTION).filter(|text| !text.is_empty());

    let reviewed = first_text(&html, &RATING_CAPTION).is_some_and(|caption| caption != NO_REVIEWS);
    let rating = if reviewed {
        html.select(&RATING_STARS)
            .next()
            .and_then(|stars| stars.value().attr("aria-label"))
            .map_or_else(Rating::unrated, rating_from_label)
    } else {
        Rating::unrated()
    };

    Ok(ProductPage {
        name,
        description,
        rating,
    })
}

/// Read `"4.5 out of 5 stars"` style labels; the second number, when
/// present, is the site's own scale.
pub(crate) fn rating_from_label(label: &str) -> Rating {
    let mut numbers = NUMBER_RE.find_iter(label).map(|m| m.as_str());
    let value = numbers.next().and_then(|n| Decimal::from_str(n).ok());
    let scale = numbers.next().and_then(|n| n.parse::<u32>().ok());

    match (value, scale) {
        (Some(value), Some(scale)) if !value.is_zero() && scale > 0 => Rating::new(value, scale),
        (value, _) => Rating::from_average(value),
    }
}

#[derive(Debug, Deserialize)]
struct ProductJson {
    product: ProductBody,
}

#[derive(Debug, Deserialize)]
struct ProductBody {
    #[serde(default)]
    variants: Vec<VariantJson>,
}

#[derive(Debug, Deserialize)]
struct VariantJson {
    title: String,
    price: serde_json::Value,
    #[serde(default)]
    compare_at_price: serde_json::Value,
}

pub(crate) fn parse_variants(
    body: serde_json::Value,
    url: &str,
) -> Result<Vec<(String, Discount)>, ScraperError> {
    let parsed: ProductJson =
        serde_json::from_value(body).map_err(|e| ScraperError::Deserialize {
            context: format!("product JSON from {url}"),
            source: e,
        })?;

    parsed
        .product
        .variants
        .into_iter()
        .map(|variant| {
            let price = json_price(&variant.price, url)?.ok_or_else(|| ScraperError::Parse {
                url: url.to_string(),
                reason: format!("variant '{}' has no price", variant.title),
            })?;
            let list_price = json_price(&variant.compare_at_price, url)?;
            Ok((variant.title, Discount::from_prices(list_price, price)))
        })
        .collect()
}

/// Shopify sends prices as strings, sometimes as numbers; empty and null
/// mean "not set".
fn json_price(value: &serde_json::Value, url: &str) -> Result<Option<Decimal>, ScraperError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => Ok(Some(parse_price(s)?)),
        serde_json::Value::Number(n) => Ok(Some(parse_price(&n.to_string())?)),
        other => Err(ScraperError::Parse {
            url: url.to_string(),
            reason: format!("unexpected price value {other}"),
        }),
    }
}

#[cfg(test)]
#[path = "naturalpetstore_test.rs"]
mod tests;
