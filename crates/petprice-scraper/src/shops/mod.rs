//! Site-specific adapters: link discovery and product page parsing.

mod burnspet;
mod naturalpetstore;

use async_trait::async_trait;
use petprice_core::{CoreError, ProductRowSet, Shop, ShopConfig, UrlRow};

use crate::document::Document;
use crate::error::ScraperError;
use crate::fetch::Fetch;

pub use burnspet::BurnsPet;
pub use naturalpetstore::TheNaturalPetStore;

/// What a shop adapter can do for the ETL pipelines.
#[async_trait]
pub trait ShopAdapter: Send + Sync {
    fn config(&self) -> &'static ShopConfig;

    /// Value written to the `shop` column.
    fn shop_name(&self) -> &'static str {
        self.config().name
    }

    /// Selector a product page must match to count as fetched.
    fn product_selector(&self) -> &'static str {
        self.config().product_selector
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCategory`] when `category` is not declared.
    fn validate_category(&self, category: &str) -> Result<(), CoreError> {
        self.config().validate_category(category)
    }

    /// Collect every product URL listed under `category`.
    ///
    /// Returns an empty vector when the category lists nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Core`] for an undeclared category, or a
    /// transport error from the fetcher.
    async fn discover_links(
        &self,
        fetcher: &dyn Fetch,
        category: &str,
    ) -> Result<Vec<UrlRow>, ScraperError>;

    /// Parse one fetched product page. Failures are logged and reported as
    /// `None`.
    async fn parse_product(
        &self,
        fetcher: &dyn Fetch,
        document: &Document,
        url: &str,
    ) -> Option<ProductRowSet>;
}

/// Static registry of the built-in adapters.
#[derive(Debug, Clone)]
pub enum Adapter {
    BurnsPet(BurnsPet),
    TheNaturalPetStore(TheNaturalPetStore),
}

impl Adapter {
    #[must_use]
    pub fn for_shop(shop: Shop) -> Self {
        match shop {
            Shop::BurnsPet => Adapter::BurnsPet(BurnsPet::new()),
            Shop::TheNaturalPetStore => Adapter::TheNaturalPetStore(TheNaturalPetStore::new()),
        }
    }

    fn inner(&self) -> &dyn ShopAdapter {
        match self {
            Adapter::BurnsPet(adapter) => adapter,
            Adapter::TheNaturalPetStore(adapter) => adapter,
        }
    }
}

#[async_trait]
impl ShopAdapter for Adapter {
    fn config(&self) -> &'static ShopConfig {
        self.inner().config()
    }

    async fn discover_links(
        &self,
        fetcher: &dyn Fetch,
        category: &str,
    ) -> Result<Vec<UrlRow>, ScraperError> {
        self.inner().discover_links(fetcher, category).await
    }

    async fn parse_product(
        &self,
        fetcher: &dyn Fetch,
        document: &Document,
        url: &str,
    ) -> Option<ProductRowSet> {
        self.inner().parse_product(fetcher, document, url).await
    }
}
