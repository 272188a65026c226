//! Staging-table protocol: create, bulk append, promote, drop.
//!
//! [`StagingStore`] is the seam the orchestrator drives; [`PgStagingStore`]
//! implements it on a Postgres pool by rendering [`Template`]s. Every
//! statement runs on its own and commits independently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use petprice_core::{ProductRowSet, ScrapeStatus, Shop, UnscrapedUrl, UrlRow};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::templates::{validate_identifier, Template, TemplateParams};
use crate::DbError;

/// Which pipeline a staging table belongs to; decides its column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingKind {
    Links,
    Products,
}

/// A validated staging table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingTable {
    name: String,
    kind: StagingKind,
}

impl StagingTable {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidIdentifier`] if `name` fails the allow-list.
    pub fn new(name: impl Into<String>, kind: StagingKind) -> Result<Self, DbError> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Self { name, kind })
    }

    /// `stg_<shop_slug>_temp`, the link-discovery staging table.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidIdentifier`] if the shop slug is not a
    /// valid identifier fragment.
    pub fn for_links(shop: Shop) -> Result<Self, DbError> {
        Self::new(format!("stg_{}_temp", shop.slug()), StagingKind::Links)
    }

    /// `stg_<shop_slug>_temp_products`, the product-detail staging table.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidIdentifier`] if the shop slug is not a
    /// valid identifier fragment.
    pub fn for_products(shop: Shop) -> Result<Self, DbError> {
        Self::new(
            format!("stg_{}_temp_products", shop.slug()),
            StagingKind::Products,
        )
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> StagingKind {
        self.kind
    }

    fn params(&self) -> TemplateParams<'_> {
        TemplateParams::table(&self.name)
    }
}

impl std::fmt::Display for StagingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A templated insert from staging into a permanent table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    Urls,
    Products,
    Variants,
    Prices,
}

impl Promotion {
    /// Product-detail promotions in the only order that satisfies their
    /// foreign keys.
    pub const PRODUCT_ORDER: [Promotion; 3] =
        [Promotion::Products, Promotion::Variants, Promotion::Prices];

    #[must_use]
    pub fn template(self) -> Template {
        match self {
            Promotion::Urls => Template::PromoteUrls,
            Promotion::Products => Template::PromoteProducts,
            Promotion::Variants => Template::PromoteVariants,
            Promotion::Prices => Template::PromotePrices,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Promotion::Urls => "urls",
            Promotion::Products => "products",
            Promotion::Variants => "product variants",
            Promotion::Prices => "product variant prices",
        }
    }
}

#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Create `table` with the column layout of its [`StagingKind`].
    async fn create_staging_table(&self, table: &StagingTable) -> Result<(), DbError>;

    async fn drop_table(&self, table: &StagingTable, if_exists: bool) -> Result<(), DbError>;

    /// Bulk-append discovered URLs; returns the number of rows written.
    async fn append_urls(&self, table: &StagingTable, rows: &[UrlRow]) -> Result<u64, DbError>;

    /// Bulk-append one product row-set; returns the number of rows written.
    async fn append_products(
        &self,
        table: &StagingTable,
        rows: &ProductRowSet,
    ) -> Result<u64, DbError>;

    async fn select_unscraped_urls(&self, shop: &str) -> Result<Vec<UnscrapedUrl>, DbError>;

    async fn update_url_status(
        &self,
        id: i64,
        status: ScrapeStatus,
        at: DateTime<Utc>,
    ) -> Result<(), DbError>;

    /// Run a promotion template; returns the number of rows inserted or updated.
    async fn promote(&self, promotion: Promotion, table: &StagingTable) -> Result<u64, DbError>;
}

/// [`StagingStore`] backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStagingStore {
    pool: PgPool,
}

impl PgStagingStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn execute_template(
        &self,
        template: Template,
        params: &TemplateParams<'_>,
    ) -> Result<u64, DbError> {
        let sql = template.render(params)?;
        let rows_affected = sqlx::query(&sql)
            .execute(&self.pool)
            .await?
            .rows_affected();
        tracing::debug!(template = template.name(), rows_affected, "executed template");
        Ok(rows_affected)
    }
}

#[async_trait]
impl StagingStore for PgStagingStore {
    async fn create_staging_table(&self, table: &StagingTable) -> Result<(), DbError> {
        let template = match table.kind() {
            StagingKind::Links => Template::CreateLinksStaging,
            StagingKind::Products => Template::CreateProductsStaging,
        };
        self.execute_template(template, &table.params()).await?;
        Ok(())
    }

    async fn drop_table(&self, table: &StagingTable, if_exists: bool) -> Result<(), DbError> {
        let template = if if_exists {
            Template::DropTableIfExists
        } else {
            Template::DropTable
        };
        self.execute_template(template, &table.params()).await?;
        Ok(())
    }

    async fn append_urls(&self, table: &StagingTable, rows: &[UrlRow]) -> Result<u64, DbError> {
        if rows.is_empty() {
            return Ok(0);
        }

        // Parallel column vectors for UNNEST binding.
        let (shops, urls): (Vec<String>, Vec<String>) = rows
            .iter()
            .map(|row| (row.shop.clone(), row.url.clone()))
            .unzip();

        let sql = Template::AppendUrls.render(&table.params())?;
        let rows_affected = sqlx::query(&sql)
            .bind(&shops)
            .bind(&urls)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn append_products(
        &self,
        table: &StagingTable,
        rows: &ProductRowSet,
    ) -> Result<u64, DbError> {
        let columns = FlatProductColumns::from_row_set(rows);

        let sql = Template::AppendProducts.render(&table.params())?;
        let rows_affected = sqlx::query(&sql)
            .bind(&columns.shops)
            .bind(&columns.names)
            .bind(&columns.ratings)
            .bind(&columns.descriptions)
            .bind(&columns.urls)
            .bind(&columns.variants)
            .bind(&columns.prices)
            .bind(&columns.discounted_prices)
            .bind(&columns.discount_percentages)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!(
            table = %table,
            url = %rows.product.url,
            rows = columns.len(),
            "staged product rows"
        );
        Ok(rows_affected)
    }

    async fn select_unscraped_urls(&self, shop: &str) -> Result<Vec<UnscrapedUrl>, DbError> {
        let sql = Template::SelectUnscrapedUrls.render(&TemplateParams::default())?;
        let rows: Vec<(i64, String)> = sqlx::query_as::<_, (i64, String)>(&sql)
            .bind(shop)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, url)| UnscrapedUrl { id, url })
            .collect())
    }

    async fn update_url_status(
        &self,
        id: i64,
        status: ScrapeStatus,
        at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let sql = Template::UpdateUrlStatus.render(&TemplateParams::default())?;
        sqlx::query(&sql)
            .bind(id)
            .bind(status.as_str())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn promote(&self, promotion: Promotion, table: &StagingTable) -> Result<u64, DbError> {
        self.execute_template(promotion.template(), &table.params())
            .await
    }
}

/// Column-major view of a [`ProductRowSet`] for `UNNEST` binding.
///
/// Product columns repeat on every variant row; a product without variants
/// becomes one row with null variant columns.
#[derive(Debug, Default)]
struct FlatProductColumns {
    shops: Vec<String>,
    names: Vec<String>,
    ratings: Vec<String>,
    descriptions: Vec<Option<String>>,
    urls: Vec<String>,
    variants: Vec<Option<String>>,
    prices: Vec<Option<Decimal>>,
    discounted_prices: Vec<Option<Decimal>>,
    discount_percentages: Vec<Option<Decimal>>,
}

impl FlatProductColumns {
    fn from_row_set(rows: &ProductRowSet) -> Self {
        let mut columns = Self::default();
        let product = &rows.product;

        let push_product = |columns: &mut Self| {
            columns.shops.push(product.shop.clone());
            columns.names.push(product.name.clone());
            columns.ratings.push(product.rating.clone());
            columns.descriptions.push(product.description.clone());
            columns.urls.push(product.url.clone());
        };

        if rows.variants.is_empty() {
            push_product(&mut columns);
            columns.variants.push(None);
            columns.prices.push(None);
            columns.discounted_prices.push(None);
            columns.discount_percentages.push(None);
            return columns;
        }

        for variant in &rows.variants {
            push_product(&mut columns);
            columns.variants.push(Some(variant.variant.clone()));
            columns.prices.push(Some(variant.price));
            columns.discounted_prices.push(variant.discounted_price);
            columns.discount_percentages.push(variant.discount_percentage);
        }

        columns
    }

    fn len(&self) -> usize {
        self.shops.len()
    }
}
