//! Adapter for burnspet.co.uk.
//!
//! Category listings paginate with `?paged=N`; product pages carry their
//! variants in a `<select>` and their rating in a Trustpilot widget whose
//! data is fetched from the Trustpilot trustbox endpoint.

use std::str::FromStr;
use std::sync::LazyLock;

use async_trait::async_trait;
use petprice_core::normalize::parse_price;
use petprice_core::{Discount, ProductRowSet, Rating, Shop, ShopConfig, UrlRow};
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};

use super::ShopAdapter;
use crate::document::Document;
use crate::error::ScraperError;
use crate::fetch::Fetch;
use crate::parse::{absolute_url, element_text, first_text_in, has_exact_text, static_selector};

/// Upper bound on listing pages per category. Stops a listing that never
/// returns an empty page from looping forever.
pub(crate) const MAX_PAGES: usize = 50;

const TRUSTPILOT_TRUSTBOX_URL: &str = "https://widget.trustpilot.com/trustbox-data";
const DEFAULT_LOCALE: &str = "en-GB";
const OUT_OF_STOCK: &str = "Out of stock";

static PRODUCT_LINK: LazyLock<Selector> =
    LazyLock::new(|| static_selector("a[class*='home-productrange-slider-item __productlist']"));
static PRODUCT_FLAVOUR: LazyLock<Selector> =
    LazyLock::new(|| static_selector("p.home-productrange-slider-item-flavour"));
static USER_CONTENT: LazyLock<Selector> = LazyLock::new(|| static_selector("div.usercontent"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| static_selector("h1"));
static SUBTITLE: LazyLock<Selector> = LazyLock::new(|| static_selector("h2"));
static TAB_PANEL: LazyLock<Selector> =
    LazyLock::new(|| static_selector("div.producttabpanel-panel"));
static TRUSTPILOT_WIDGET: LazyLock<Selector> =
    LazyLock::new(|| static_selector("div.trustpilot-widget"));
static VARIANT_OPTION: LazyLock<Selector> =
    LazyLock::new(|| static_selector("select#Variants option"));

// "<label> - £<price>"; the label may itself contain hyphens.
static VARIANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<label>.+?)\s*-\s*£?\s*(?P<price>\d[\d,]*(?:\.\d+)?)\s*$")
        .expect("valid variant regex")
});

#[derive(Debug, Clone)]
pub struct BurnsPet {
    base_url: String,
    trustbox_url: String,
}

impl Default for BurnsPet {
    fn default() -> Self {
        Self::new()
    }
}

impl BurnsPet {
    #[must_use]
    pub fn new() -> Self {
        Self::with_urls(Shop::BurnsPet.config().base_url, TRUSTPILOT_TRUSTBOX_URL)
    }

    /// Point the adapter at a different site root and Trustpilot endpoint.
    #[must_use]
    pub fn with_urls(base_url: impl Into<String>, trustbox_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            trustbox_url: trustbox_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn listing_url(&self, category: &str, page: usize) -> String {
        if page == 1 {
            format!("{}{category}", self.base_url)
        } else {
            format!("{}{category}/?paged={page}", self.base_url)
        }
    }

    fn relative_url<'a>(&self, url: &'a str) -> &'a str {
        url.strip_prefix(self.base_url.as_str()).unwrap_or(url)
    }

    async fn fetch_rating(
        &self,
        fetcher: &dyn Fetch,
        widget: &TrustpilotWidget,
        url: &str,
    ) -> Rating {
        let request_url = match widget.request_url(&self.trustbox_url) {
            Ok(request_url) => request_url,
            Err(e) => {
                tracing::warn!(url, error = %e, "could not build Trustpilot request");
                return Rating::unrated();
            }
        };

        match fetcher.fetch_json(&request_url, &[]).await {
            Ok(Some(body)) => Rating::from_average(stars_average(&body)),
            Ok(None) => Rating::unrated(),
            Err(e) => {
                tracing::warn!(url, error = %e, "Trustpilot rating unavailable");
                Rating::unrated()
            }
        }
    }
}

#[async_trait]
impl ShopAdapter for BurnsPet {
    fn config(&self) -> &'static ShopConfig {
        Shop::BurnsPet.config()
    }

    async fn discover_links(
        &self,
        fetcher: &dyn Fetch,
        category: &str,
    ) -> Result<Vec<UrlRow>, ScraperError> {
        self.validate_category(category)?;

        let mut rows = Vec::new();
        for page in 1..=MAX_PAGES {
            let listing = self.listing_url(category, page);
            let document = match fetcher.fetch(&listing, "", &[]).await {
                Ok(Some(document)) => document,
                Ok(None) => break,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        url = %listing,
                        error = %e,
                        "listing page fetch failed; keeping links found so far"
                    );
                    break;
                }
            };

            let links = extract_product_links(document.body(), &self.base_url);
            tracing::debug!(url = %listing, links = links.len(), "parsed listing page");
            if links.is_empty() {
                break;
            }
            rows.extend(links.into_iter().map(|link| UrlRow::new(self.shop_name(), link)));

            if page == MAX_PAGES {
                tracing::warn!(category, max_pages = MAX_PAGES, "listing page cap reached");
            }
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
            Ok(PageOutcome::Product(page)) => page,
            Ok(PageOutcome::OutOfStock) => {
                tracing::info!(url, "skipping sold-out product");
                return None;
            }
            Err(e) => {
                tracing::error!(url, error = %e, "failed to parse product page");
                return None;
            }
        };

        let rating = match &page.widget {
            Some(widget) => self.fetch_rating(fetcher, widget, url).await,
            None => Rating::unrated(),
        };

        let mut rows = ProductRowSet::new(
            self.shop_name(),
            page.name,
            rating,
            page.description,
            self.relative_url(url),
        );
        for (label, price) in page.variants {
            rows.push_variant(label, Discount::full_price(price));
        }
        Some(rows)
    }
}

/// Attributes of the Trustpilot product-reviews widget on a product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrustpilotWidget {
    pub business_unit_id: String,
    pub template_id: String,
    pub locale: String,
    pub sku: String,
}

impl TrustpilotWidget {
    fn request_url(&self, trustbox_url: &str) -> Result<String, ScraperError> {
        let mut url = reqwest::Url::parse(&format!("{trustbox_url}/{}", self.template_id))
            .map_err(|e| ScraperError::Parse {
                url: trustbox_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("businessUnitId", &self.business_unit_id)
            .append_pair("locale", &self.locale)
            .append_pair("sku", &self.sku);
        Ok(url.into())
    }
}

#[derive(Debug)]
pub(crate) struct ProductPage {
    pub name: String,
    pub description: Option<String>,
    pub widget: Option<TrustpilotWidget>,
    pub variants: Vec<(String, Decimal)>,
}

#[derive(Debug)]
pub(crate) enum PageOutcome {
    Product(ProductPage),
    OutOfStock,
}

/// Product links on a listing page: slider anchors that carry a flavour line.
pub(crate) fn extract_product_links(body: &str, base_url: &str) -> Vec<String> {
    let html = Html::parse_document(body);
    html.select(&PRODUCT_LINK)
        .filter(|anchor| anchor.select(&PRODUCT_FLAVOUR).next().is_some())
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| absolute_url(base_url, href))
        .collect()
}

pub(crate) fn parse_product_page(body: &str, url: &str) -> Result<PageOutcome, ScraperError> {
    let html = Html::parse_document(body);
    if has_exact_text(&html, OUT_OF_STOCK) {
        return Ok(PageOutcome::OutOfStock);
    }

    let parse_error = |reason: &str| ScraperError::Parse {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let content = html
        .select(&USER_CONTENT)
        .next()
        .ok_or_else(|| parse_error("missing div.usercontent"))?;
    let title = first_text_in(content, &TITLE).ok_or_else(|| parse_error("missing h1"))?;
    let name = match first_text_in(content, &SUBTITLE) {
        Some(subtitle) if !subtitle.is_empty() => format!("{title} - {subtitle}"),
        _ => title,
    };

    let panels: Vec<_> = html.select(&TAB_PANEL).collect();
    let description = panels
        .first()
        .and_then(|panel| first_text_in(*panel, &USER_CONTENT))
        .filter(|text| !text.is_empty());
    let widget = panels
        .last()
        .and_then(|panel| panel.select(&TRUSTPILOT_WIDGET).next())
        .map(|widget| {
            let attr = |name: &str| widget.value().attr(name).unwrap_or_default().to_string();
            let locale = attr("data-locale");
            TrustpilotWidget {
                business_unit_id: attr("data-businessunit-id"),
                template_id: attr("data-template-id"),
                locale: if locale.is_empty() {
                    DEFAULT_LOCALE.to_string()
                } else {
                    locale
                },
                sku: attr("data-sku"),
            }
        });

    let mut variants = Vec::new();
    for option in html.select(&VARIANT_OPTION) {
        let text = element_text(option);
        match parse_variant_option(&text) {
            Some(variant) => variants.push(variant),
            None => tracing::debug!(url, option = %text, "skipping unpriced variant option"),
        }
    }

    Ok(PageOutcome::Product(ProductPage {
        name,
        description,
        widget,
        variants,
    }))
}

/// Split `"<label> - £<price>"` into its parts.
pub(crate) fn parse_variant_option(text: &str) -> Option<(String, Decimal)> {
    let captures = VARIANT_RE.captures(text.trim())?;
    let price = parse_price(&captures["price"]).ok()?;
    Some((captures["label"].trim().to_string(), price))
}

/// `productReviewsSummary.starsAverage` from a trustbox response.
pub(crate) fn stars_average(body: &serde_json::Value) -> Option<Decimal> {
    let average = body.get("productReviewsSummary")?.get("starsAverage")?;
    match average {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "burnspet_test.rs"]
mod tests;
