//! Live integration tests for petprice-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/petprice-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory. Run with `DATABASE_URL` set and `--ignored`.

use std::str::FromStr;

use chrono::Utc;
use petprice_core::{Discount, ProductRowSet, Rating, ScrapeStatus, Shop, UrlRow};
use petprice_db::{PgStagingStore, Promotion, StagingStore, StagingTable};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn count(pool: &sqlx::PgPool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| panic!("count query failed ({sql}): {e}"))
}

async fn table_exists(pool: &sqlx::PgPool, name: &str) -> bool {
    sqlx::query_scalar::<_, Option<String>>("SELECT to_regclass($1)::text")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("to_regclass failed")
        .is_some()
}

fn kibble(price: &str, list: Option<&str>) -> ProductRowSet {
    let mut set = ProductRowSet::new(
        "BurnsPet",
        "Original Chicken & Brown Rice",
        Rating::from_average(Some(dec("4.6"))),
        Some("Complete food for adult dogs".to_string()),
        "/dog-food/original-chicken",
    );
    set.push_variant("2kg", Discount::from_prices(list.map(dec), dec(price)));
    set
}

// ---------------------------------------------------------------------------
// Link staging
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn link_staging_round_trip_promotes_distinct_urls(pool: sqlx::PgPool) {
    let store = PgStagingStore::new(pool.clone());
    let table = StagingTable::for_links(Shop::BurnsPet).unwrap();

    store.drop_table(&table, true).await.unwrap();
    store.create_staging_table(&table).await.unwrap();
    assert!(table_exists(&pool, table.name()).await);

    let rows = vec![
        UrlRow::new("BurnsPet", "/dog-food/a"),
        UrlRow::new("BurnsPet", "/dog-food/b"),
        UrlRow::new("BurnsPet", "/dog-food/a"),
    ];
    assert_eq!(store.append_urls(&table, &rows).await.unwrap(), 3);

    let promoted = store.promote(Promotion::Urls, &table).await.unwrap();
    assert_eq!(promoted, 2);

    store.drop_table(&table, false).await.unwrap();
    assert!(!table_exists(&pool, table.name()).await);

    // Re-running with the same links inserts nothing new.
    store.create_staging_table(&table).await.unwrap();
    store.append_urls(&table, &rows).await.unwrap();
    assert_eq!(store.promote(Promotion::Urls, &table).await.unwrap(), 0);
    store.drop_table(&table, false).await.unwrap();

    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM urls WHERE status = 'PENDING'").await,
        2
    );
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn append_urls_with_no_rows_is_a_no_op(pool: sqlx::PgPool) {
    let store = PgStagingStore::new(pool);
    let table = StagingTable::for_links(Shop::TheNaturalPetStore).unwrap();
    store.create_staging_table(&table).await.unwrap();
    assert_eq!(store.append_urls(&table, &[]).await.unwrap(), 0);
    store.drop_table(&table, false).await.unwrap();
}

// ---------------------------------------------------------------------------
// URL status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn select_unscraped_skips_done_rows(pool: sqlx::PgPool) {
    let store = PgStagingStore::new(pool.clone());
    sqlx::query(
        "INSERT INTO urls (shop, url, status) VALUES \
         ('BurnsPet', '/a', 'PENDING'), ('BurnsPet', '/b', 'DONE'), \
         ('BurnsPet', '/c', 'FAILED'), ('TheNaturalPetStore', '/d', 'PENDING')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let rows = store.select_unscraped_urls("BurnsPet").await.unwrap();
    let urls: Vec<&str> = rows.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["/a", "/c"]);

    store
        .update_url_status(rows[0].id, ScrapeStatus::Done, Utc::now())
        .await
        .unwrap();

    let (status, scraped): (String, Option<chrono::DateTime<Utc>>) =
        sqlx::query_as("SELECT status, scraped_at FROM urls WHERE id = $1")
            .bind(rows[0].id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "DONE");
    assert!(scraped.is_some());

    let remaining = store.select_unscraped_urls("BurnsPet").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].url, "/c");
}

// ---------------------------------------------------------------------------
// Product staging
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn product_promotion_records_only_changed_prices(pool: sqlx::PgPool) {
    let store = PgStagingStore::new(pool.clone());
    let table = StagingTable::for_products(Shop::BurnsPet).unwrap();

    let no_variants =
        ProductRowSet::new("BurnsPet", "Gift Card", Rating::unrated(), None, "/gift-card");

    for run in [kibble("7.50", Some("10.00")), kibble("7.50", Some("10.00")), kibble("9.00", None)] {
        store.drop_table(&table, true).await.unwrap();
        store.create_staging_table(&table).await.unwrap();
        store.append_products(&table, &run).await.unwrap();
        store.append_products(&table, &no_variants).await.unwrap();
        for promotion in Promotion::PRODUCT_ORDER {
            store.promote(promotion, &table).await.unwrap();
        }
        store.drop_table(&table, false).await.unwrap();
    }

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM products").await, 2);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM product_variants").await, 1);
    // Second run repeated the first price; only two snapshots exist.
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM product_variant_prices").await, 2);

    let rating: String =
        sqlx::query_scalar("SELECT rating FROM products WHERE url = '/dog-food/original-chicken'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rating, "4.6/5");

    let (price, discounted): (Decimal, Option<Decimal>) = sqlx::query_as(
        "SELECT price, discounted_price FROM product_variant_prices \
         ORDER BY captured_at DESC, id DESC LIMIT 1",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(price, dec("9.00"));
    assert!(discounted.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn failed_append_leaves_staging_table_in_place(pool: sqlx::PgPool) {
    let store = PgStagingStore::new(pool.clone());
    let table = StagingTable::for_products(Shop::TheNaturalPetStore).unwrap();
    let links = StagingTable::for_links(Shop::TheNaturalPetStore).unwrap();

    store.create_staging_table(&links).await.unwrap();
    // Product rows do not fit the link staging layout.
    let err = store
        .append_products(&links, &kibble("1.00", None))
        .await
        .unwrap_err();
    assert!(matches!(err, petprice_db::DbError::Sqlx(_)));
    assert!(table_exists(&pool, links.name()).await);
    assert!(!table_exists(&pool, table.name()).await);
}
