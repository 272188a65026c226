use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::{Discount, Rating};
use crate::CoreError;

/// A product page URL discovered on a category listing, tagged with its shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRow {
    pub shop: String,
    pub url: String,
}

impl UrlRow {
    #[must_use]
    pub fn new(shop: &str, url: impl Into<String>) -> Self {
        Self {
            shop: shop.to_string(),
            url: url.into(),
        }
    }
}

/// Scrape lifecycle of a row in the permanent `urls` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScrapeStatus {
    Pending,
    Done,
    Failed,
}

impl ScrapeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeStatus::Pending => "PENDING",
            ScrapeStatus::Done => "DONE",
            ScrapeStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapeStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ScrapeStatus::Pending),
            "DONE" => Ok(ScrapeStatus::Done),
            "FAILED" => Ok(ScrapeStatus::Failed),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// A `urls` row selected for the product detail pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnscrapedUrl {
    pub id: i64,
    pub url: String,
}

/// One normalized product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub shop: String,
    pub name: String,
    /// Rendered `"<value>/<scale>"` fraction, `"0/5"` when unrated.
    pub rating: String,
    pub description: Option<String>,
    /// Shop-relative path of the product page.
    pub url: String,
}

/// One purchasable variant of a [`ProductRecord`], e.g. a bag size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub shop: String,
    pub url: String,
    pub variant: String,
    pub price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
}

/// A product with its variants, the unit an adapter hands back per page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRowSet {
    pub product: ProductRecord,
    pub variants: Vec<VariantRecord>,
}

impl ProductRowSet {
    #[must_use]
    pub fn new(
        shop: &str,
        name: impl Into<String>,
        rating: Rating,
        description: Option<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            product: ProductRecord {
                shop: shop.to_string(),
                name: name.into(),
                rating: rating.to_string(),
                description,
                url: url.into(),
            },
            variants: Vec::new(),
        }
    }

    /// Append a variant, copying shop and url from the product.
    pub fn push_variant(&mut self, label: impl Into<String>, discount: Discount) {
        self.variants.push(VariantRecord {
            shop: self.product.shop.clone(),
            url: self.product.url.clone(),
            variant: label.into(),
            price: discount.price,
            discounted_price: discount.discounted_price,
            discount_percentage: discount.discount_percentage,
        });
    }

    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Number of rows this set occupies in a flat staging table: one per
    /// variant, or a single product-only row when there are none.
    #[must_use]
    pub fn staged_row_count(&self) -> usize {
        self.variants.len().max(1)
    }
}
