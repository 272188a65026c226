//! The two pipelines run for a shop.
//!
//! Both follow the same staging protocol: drop any leftover staging table,
//! create it fresh, append, promote into the permanent tables, drop. A
//! failure while loading or promoting leaves the staging table in place for
//! inspection; the next run drops it before starting.

use chrono::Utc;
use petprice_core::{CategoriesFile, ScrapeStatus, UnscrapedUrl};
use petprice_db::{DbError, Promotion, StagingStore, StagingTable};
use petprice_scraper::{Fetch, ScraperError, ShopAdapter};

use crate::error::EtlError;

/// Headers sent with every product page request.
pub const PRODUCT_PAGE_HEADERS: [(&str, &str); 1] = [("Upgrade-Insecure-Requests", "1")];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkDiscoverySummary {
    pub categories: usize,
    pub links_staged: u64,
    pub urls_promoted: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductScrapeSummary {
    pub selected: usize,
    pub done: usize,
    pub failed: usize,
    pub products_promoted: u64,
    pub variants_promoted: u64,
    pub prices_promoted: u64,
}

/// Runs the pipelines for the shop behind `adapter`.
///
/// Everything is borrowed: the caller owns the pool-backed store and the
/// HTTP client and decides their lifetime.
pub struct Orchestrator<'a, A, S> {
    adapter: &'a A,
    fetcher: &'a dyn Fetch,
    store: &'a S,
}

impl<'a, A, S> Orchestrator<'a, A, S>
where
    A: ShopAdapter,
    S: StagingStore,
{
    #[must_use]
    pub fn new(adapter: &'a A, fetcher: &'a dyn Fetch, store: &'a S) -> Self {
        Self {
            adapter,
            fetcher,
            store,
        }
    }

    /// Discover product links for every category and add new ones to `urls`.
    ///
    /// # Errors
    ///
    /// - [`EtlError::Validation`] if any category is not declared by the
    ///   shop; nothing has been written at that point.
    /// - [`EtlError::Load`] if appending to staging fails; the staging table
    ///   is left behind.
    /// - [`EtlError::Staging`] or [`EtlError::Promotion`] for failures
    ///   creating, dropping or promoting the staging table.
    pub async fn discover_and_store_links(
        &self,
        categories: &CategoriesFile,
    ) -> Result<LinkDiscoverySummary, EtlError> {
        let shop = self.adapter.shop_name();
        for category in &categories.data {
            self.adapter.validate_category(category)?;
        }

        let table = self.staging_table(StagingTable::for_links(self.adapter.config().shop))?;
        self.recreate(&table).await?;

        let mut summary = LinkDiscoverySummary {
            categories: categories.data.len(),
            ..LinkDiscoverySummary::default()
        };

        for category in &categories.data {
            let rows = match self.adapter.discover_links(self.fetcher, category).await {
                Ok(rows) => rows,
                Err(ScraperError::Core(e)) => return Err(EtlError::Validation(e)),
                Err(e) => {
                    tracing::error!(shop, category = %category, error = %e, "link discovery failed; skipping category");
                    continue;
                }
            };

            if rows.is_empty() {
                tracing::debug!(shop, category = %category, "no links found");
                continue;
            }

            let staged = self
                .store
                .append_urls(&table, &rows)
                .await
                .map_err(|source| {
                    tracing::error!(shop, table = %table, rows = rows.len(), error = %source, "failed to stage links");
                    EtlError::Load {
                        table: table.name().to_string(),
                        rows: rows.len(),
                        source,
                    }
                })?;
            tracing::info!(shop, category = %category, rows = staged, "staged links");
            summary.links_staged += staged;
        }

        summary.urls_promoted = self.promote(Promotion::Urls, &table).await?;
        self.drop_staging(&table).await?;

        tracing::info!(
            shop,
            categories = summary.categories,
            links_staged = summary.links_staged,
            urls_promoted = summary.urls_promoted,
            "link discovery complete"
        );
        Ok(summary)
    }

    /// Scrape every URL of this shop not yet DONE and promote the results.
    ///
    /// Each URL ends the run as DONE or FAILED. Fetch and parse failures
    /// only affect their own row.
    ///
    /// # Errors
    ///
    /// - [`EtlError::Select`] if the URL selection fails.
    /// - [`EtlError::Load`] if appending a product fails; the staging table
    ///   is left behind and remaining URLs stay untouched.
    /// - [`EtlError::StatusUpdate`] if a status write fails.
    /// - [`EtlError::Staging`] or [`EtlError::Promotion`] for failures
    ///   creating, dropping or promoting the staging table.
    pub async fn scrape_and_store_products(&self) -> Result<ProductScrapeSummary, EtlError> {
        let shop = self.adapter.shop_name();
        let table = self.staging_table(StagingTable::for_products(self.adapter.config().shop))?;
        self.recreate(&table).await?;

        let pending = self
            .store
            .select_unscraped_urls(shop)
            .await
            .map_err(|source| EtlError::Select {
                shop: shop.to_string(),
                source,
            })?;

        let mut summary = ProductScrapeSummary {
            selected: pending.len(),
            ..ProductScrapeSummary::default()
        };
        tracing::info!(shop, selected = summary.selected, "selected URLs to scrape");

        for row in &pending {
            match self.scrape_one(&table, row).await? {
                ScrapeStatus::Done => summary.done += 1,
                ScrapeStatus::Failed | ScrapeStatus::Pending => summary.failed += 1,
            }
        }

        for promotion in Promotion::PRODUCT_ORDER {
            let promoted = self.promote(promotion, &table).await?;
            match promotion {
                Promotion::Products => summary.products_promoted = promoted,
                Promotion::Variants => summary.variants_promoted = promoted,
                Promotion::Prices => summary.prices_promoted = promoted,
                Promotion::Urls => {}
            }
        }
        self.drop_staging(&table).await?;

        tracing::info!(
            shop,
            selected = summary.selected,
            done = summary.done,
            failed = summary.failed,
            products = summary.products_promoted,
            variants = summary.variants_promoted,
            prices = summary.prices_promoted,
            "product scrape complete"
        );
        Ok(summary)
    }

    /// Fetch, parse and stage one URL, then record its status.
    async fn scrape_one(
        &self,
        table: &StagingTable,
        row: &UnscrapedUrl,
    ) -> Result<ScrapeStatus, EtlError> {
        let document = match self
            .fetcher
            .fetch(&row.url, self.adapter.product_selector(), &PRODUCT_PAGE_HEADERS)
            .await
        {
            Ok(Some(document)) => Some(document),
            Ok(None) => {
                tracing::warn!(url = %row.url, "product page unavailable");
                None
            }
            Err(e) => {
                tracing::warn!(url = %row.url, error = %e, "product page fetch failed");
                None
            }
        };

        let parsed = match &document {
            Some(document) => {
                self.adapter
                    .parse_product(self.fetcher, document, &row.url)
                    .await
            }
            None => None,
        };

        let status = match parsed {
            Some(rows) => {
                self.store
                    .append_products(table, &rows)
                    .await
                    .map_err(|source| {
                        tracing::error!(url = %row.url, table = %table, error = %source, "failed to stage product");
                        EtlError::Load {
                            table: table.name().to_string(),
                            rows: rows.staged_row_count(),
                            source,
                        }
                    })?;
                ScrapeStatus::Done
            }
            None => ScrapeStatus::Failed,
        };

        self.store
            .update_url_status(row.id, status, Utc::now())
            .await
            .map_err(|source| EtlError::StatusUpdate { id: row.id, source })?;
        tracing::debug!(id = row.id, url = %row.url, %status, "recorded scrape status");
        Ok(status)
    }

    fn staging_table(
        &self,
        table: Result<StagingTable, DbError>,
    ) -> Result<StagingTable, EtlError> {
        table.map_err(|source| EtlError::Staging {
            table: self.adapter.config().shop.slug(),
            source,
        })
    }

    async fn recreate(&self, table: &StagingTable) -> Result<(), EtlError> {
        let staging_error = |source| EtlError::Staging {
            table: table.name().to_string(),
            source,
        };
        self.store
            .drop_table(table, true)
            .await
            .map_err(staging_error)?;
        self.store
            .create_staging_table(table)
            .await
            .map_err(staging_error)?;
        tracing::info!(table = %table, "staging table created");
        Ok(())
    }

    async fn drop_staging(&self, table: &StagingTable) -> Result<(), EtlError> {
        self.store
            .drop_table(table, false)
            .await
            .map_err(|source| EtlError::Staging {
                table: table.name().to_string(),
                source,
            })?;
        tracing::info!(table = %table, "staging table dropped");
        Ok(())
    }

    async fn promote(&self, promotion: Promotion, table: &StagingTable) -> Result<u64, EtlError> {
        let promoted = self
            .store
            .promote(promotion, table)
            .await
            .map_err(|source| {
                tracing::error!(table = %table, operation = promotion.label(), error = %source, "promotion failed");
                EtlError::Promotion {
                    operation: promotion.label(),
                    table: table.name().to_string(),
                    source,
                }
            })?;
        tracing::info!(table = %table, operation = promotion.label(), rows = promoted, "promoted");
        Ok(promoted)
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
