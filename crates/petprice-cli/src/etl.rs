//! ETL command handlers for the CLI.
//!
//! Shops run one after another. A failed shop is logged and the run moves
//! on; the command only fails when every selected shop failed.

use anyhow::Context as _;
use petprice_core::{load_categories, AppConfig, Shop};
use petprice_db::PgStagingStore;
use petprice_etl::Orchestrator;
use petprice_scraper::{Adapter, PageFetcher};

pub(crate) fn print_shops() {
    for shop in Shop::ALL {
        let config = shop.config();
        println!(
            "{:<20} {:<40} {}",
            config.name,
            config.base_url,
            config.categories.join(", ")
        );
    }
}

/// Resolve the `--shop` filter; no filter means every shop.
pub(crate) fn select_shops(filter: Option<&str>) -> anyhow::Result<Vec<Shop>> {
    match filter {
        Some(name) => Ok(vec![name.parse::<Shop>()?]),
        None => Ok(Shop::ALL.to_vec()),
    }
}

fn build_fetcher(config: &AppConfig) -> anyhow::Result<PageFetcher> {
    PageFetcher::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )
    .context("failed to build page fetcher")
}

/// Run link discovery for each selected shop.
///
/// # Errors
///
/// Returns an error if the shop filter is unknown, the fetcher cannot be
/// built, or every selected shop failed.
pub(crate) async fn run_links(
    store: &PgStagingStore,
    config: &AppConfig,
    shop_filter: Option<&str>,
) -> anyhow::Result<()> {
    let shops = select_shops(shop_filter)?;
    let fetcher = build_fetcher(config)?;

    let mut failed = 0;
    for &shop in &shops {
        let adapter = Adapter::for_shop(shop);
        let result = async {
            let categories = load_categories(&config.categories_dir, shop)?;
            let summary = Orchestrator::new(&adapter, &fetcher, store)
                .discover_and_store_links(&categories)
                .await?;
            anyhow::Ok(summary)
        }
        .await;

        match result {
            Ok(summary) => println!(
                "{shop}: {} categories, {} links staged, {} new urls",
                summary.categories, summary.links_staged, summary.urls_promoted
            ),
            Err(e) => {
                tracing::error!(shop = %shop, error = %e, "link discovery failed");
                failed += 1;
            }
        }
    }

    check_failures("link discovery", failed, shops.len())
}

/// Run the product detail pipeline for each selected shop.
///
/// # Errors
///
/// Returns an error if the shop filter is unknown, the fetcher cannot be
/// built, or every selected shop failed.
pub(crate) async fn run_products(
    store: &PgStagingStore,
    config: &AppConfig,
    shop_filter: Option<&str>,
) -> anyhow::Result<()> {
    let shops = select_shops(shop_filter)?;
    let fetcher = build_fetcher(config)?;

    let mut failed = 0;
    for &shop in &shops {
        let adapter = Adapter::for_shop(shop);
        match Orchestrator::new(&adapter, &fetcher, store)
            .scrape_and_store_products()
            .await
        {
            Ok(summary) => println!(
                "{shop}: {} selected, {} done, {} failed; promoted {} products, {} variants, {} prices",
                summary.selected,
                summary.done,
                summary.failed,
                summary.products_promoted,
                summary.variants_promoted,
                summary.prices_promoted
            ),
            Err(e) => {
                tracing::error!(shop = %shop, error = %e, "product scrape failed");
                failed += 1;
            }
        }
    }

    check_failures("product scrape", failed, shops.len())
}

pub(crate) fn check_failures(pipeline: &str, failed: usize, total: usize) -> anyhow::Result<()> {
    if total > 0 && failed == total {
        anyhow::bail!("{pipeline} failed for all {total} shop(s)");
    }
    if failed > 0 {
        tracing::warn!(pipeline, failed, total, "some shops failed");
    }
    Ok(())
}
