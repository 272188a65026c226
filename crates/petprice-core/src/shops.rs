//! Static registry of the retailers the ETL knows how to scrape.
//!
//! Each [`Shop`] maps to exactly one [`ShopConfig`] holding its identity,
//! base URL, declared category set and the CSS selector a product page must
//! match before it is handed to the shop's adapter.

use std::str::FromStr;

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shop {
    BurnsPet,
    TheNaturalPetStore,
}

#[derive(Debug)]
pub struct ShopConfig {
    pub shop: Shop,
    /// Display name, also written to the `shop` column of every row.
    pub name: &'static str,
    pub base_url: &'static str,
    /// Selector that must match on a product page for the fetch to count.
    pub product_selector: &'static str,
    pub categories: &'static [&'static str],
}

static BURNS_PET: ShopConfig = ShopConfig {
    shop: Shop::BurnsPet,
    name: "BurnsPet",
    base_url: "https://burnspet.co.uk",
    product_selector: "div.usercontent h1",
    categories: &["/dog-food", "/cat-food"],
};

static THE_NATURAL_PET_STORE: ShopConfig = ShopConfig {
    shop: Shop::TheNaturalPetStore,
    name: "TheNaturalPetStore",
    base_url: "https://www.thenaturalpetstore.co.uk",
    product_selector: "h1.product-meta__title",
    categories: &[
        "/collections/dogs",
        "/collections/cat",
        "/collections/small-pets",
        "/collections/birds",
        "/collections/pic-n-mix",
    ],
};

impl Shop {
    pub const ALL: [Shop; 2] = [Shop::BurnsPet, Shop::TheNaturalPetStore];

    #[must_use]
    pub fn config(self) -> &'static ShopConfig {
        match self {
            Shop::BurnsPet => &BURNS_PET,
            Shop::TheNaturalPetStore => &THE_NATURAL_PET_STORE,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.config().name
    }

    /// Lowercased shop name, used for staging table names and category files.
    #[must_use]
    pub fn slug(self) -> String {
        self.name().to_lowercase()
    }
}

impl std::fmt::Display for Shop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shop {
    type Err = CoreError;

    /// Accepts either the display name or the slug, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Shop::ALL
            .into_iter()
            .find(|shop| shop.slug() == wanted)
            .ok_or_else(|| CoreError::UnknownShop(s.to_string()))
    }
}

impl ShopConfig {
    #[must_use]
    pub fn declares(&self, category: &str) -> bool {
        self.categories.contains(&category)
    }

    /// Check that `category` belongs to this shop's declared set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCategory`] when it does not.
    pub fn validate_category(&self, category: &str) -> Result<(), CoreError> {
        if self.declares(category) {
            return Ok(());
        }
        Err(CoreError::InvalidCategory {
            shop: self.name.to_string(),
            category: category.to_string(),
            allowed: self.categories.iter().map(ToString::to_string).collect(),
        })
    }

    /// Absolute URL of a category listing page.
    #[must_use]
    pub fn category_url(&self, category: &str) -> String {
        format!("{}{category}", self.base_url)
    }

    /// Strip the base URL from an absolute product URL, leaving the path.
    #[must_use]
    pub fn relative_url<'a>(&self, url: &'a str) -> &'a str {
        url.strip_prefix(self.base_url).unwrap_or(url)
    }
}
