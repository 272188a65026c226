//! Shop-independent normalization of ratings and prices.
//!
//! Every adapter funnels its raw values through these helpers so that the
//! staging tables see one representation regardless of the source site.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::CoreError;

/// Denominator used when a site does not state its own.
pub const DEFAULT_RATING_SCALE: u32 = 5;

/// A star rating stored as the string fraction `"<value>/<scale>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating {
    value: Decimal,
    scale: u32,
}

impl Rating {
    #[must_use]
    pub fn new(value: Decimal, scale: u32) -> Self {
        Self {
            value: value.normalize(),
            scale,
        }
    }

    /// The rating of a product with no reviews: `0/5`.
    #[must_use]
    pub fn unrated() -> Self {
        Self::new(Decimal::ZERO, DEFAULT_RATING_SCALE)
    }

    /// Normalize an optional average on the default scale; a missing or zero
    /// average becomes [`Rating::unrated`].
    #[must_use]
    pub fn from_average(average: Option<Decimal>) -> Self {
        match average {
            Some(value) if !value.is_zero() => Self::new(value, DEFAULT_RATING_SCALE),
            _ => Self::unrated(),
        }
    }

    #[must_use]
    pub fn value(&self) -> Decimal {
        self.value
    }

    #[must_use]
    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.value, self.scale)
    }
}

/// List price plus optional markdown for one variant.
///
/// `discounted_price` and `discount_percentage` are either both present or
/// both absent; a variant without a markdown never carries zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    pub price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
}

impl Discount {
    /// A variant sold at `price` with no markdown.
    #[must_use]
    pub fn full_price(price: Decimal) -> Self {
        Self {
            price,
            discounted_price: None,
            discount_percentage: None,
        }
    }

    /// Build from an optional list (compare-at) price and the current price.
    ///
    /// A discount is recorded only when the list price is strictly greater
    /// than the current price; the percentage is the fractional reduction
    /// rounded to two decimal places.
    #[must_use]
    pub fn from_prices(list_price: Option<Decimal>, current_price: Decimal) -> Self {
        match list_price {
            Some(list) if list > current_price && list > Decimal::ZERO => {
                let percentage = ((list - current_price) / list).round_dp(2);
                Self {
                    price: list,
                    discounted_price: Some(current_price),
                    discount_percentage: Some(percentage),
                }
            }
            _ => Self::full_price(current_price),
        }
    }
}

/// Parse a displayed price such as `"£12.99"`, `" 1,299.00 "` or `"7.5"`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPrice`] when nothing numeric remains after
/// stripping currency symbols, separators and whitespace.
pub fn parse_price(raw: &str) -> Result<Decimal, CoreError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if cleaned.is_empty() {
        return Err(CoreError::InvalidPrice {
            raw: raw.to_string(),
            reason: "no digits found".to_string(),
        });
    }

    Decimal::from_str(&cleaned).map_err(|e| CoreError::InvalidPrice {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}
