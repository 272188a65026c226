use std::collections::HashMap;

use serde_json::json;

use super::*;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

const LISTING: &str = r#"
<html><body>
  <a class="home-productrange-slider-item __productlist" href="https://burnspet.co.uk/dog-food/original-chicken/">
    <p class="home-productrange-slider-item-flavour">Chicken &amp; Brown Rice</p>
  </a>
  <a class="home-productrange-slider-item __productlist" href="/dog-food/weight-control/">
    <p class="home-productrange-slider-item-flavour">Weight Control</p>
  </a>
  <a class="home-productrange-slider-item __productlist" href="/dog-food/range-banner/">
    <span>Browse the range</span>
  </a>
</body></html>
"#;

const PRODUCT: &str = r#"
<html><body>
  <div class="usercontent"><h1>Original</h1><h2>Chicken &amp; Brown Rice</h2></div>
  <select id="Variants">
    <option>2kg - £10.99</option>
    <option>Large Breed - 12kg - £45.50</option>
    <option>Please choose</option>
  </select>
  <div class="producttabpanel-panel">
    <div class="usercontent"><p>A complete food for adult dogs.</p></div>
  </div>
  <div class="producttabpanel-panel">
    <div class="trustpilot-widget" data-businessunit-id="bu-1" data-template-id="tpl-9"
         data-locale="en-GB" data-sku="SKU1,SKU2"></div>
  </div>
</body></html>
"#;

#[test]
fn listing_links_require_flavour_line() {
    let links = extract_product_links(LISTING, "https://burnspet.co.uk");
    assert_eq!(
        links,
        vec![
            "https://burnspet.co.uk/dog-food/original-chicken/".to_string(),
            "https://burnspet.co.uk/dog-food/weight-control/".to_string(),
        ]
    );
}

#[test]
fn listing_url_paginates_from_second_page() {
    let adapter = BurnsPet::new();
    assert_eq!(adapter.listing_url("/dog-food", 1), "https://burnspet.co.uk/dog-food");
    assert_eq!(
        adapter.listing_url("/dog-food", 3),
        "https://burnspet.co.uk/dog-food/?paged=3"
    );
}

#[test]
fn product_page_yields_name_description_widget_and_variants() {
    let PageOutcome::Product(page) =
        parse_product_page(PRODUCT, "https://burnspet.co.uk/dog-food/original-chicken/").unwrap()
    else {
        panic!("expected a product");
    };

    assert_eq!(page.name, "Original - Chicken & Brown Rice");
    assert_eq!(page.description.as_deref(), Some("A complete food for adult dogs."));
    assert_eq!(
        page.widget,
        Some(TrustpilotWidget {
            business_unit_id: "bu-1".to_string(),
            template_id: "tpl-9".to_string(),
            locale: "en-GB".to_string(),
            sku: "SKU1,SKU2".to_string(),
        })
    );
    assert_eq!(
        page.variants,
        vec![
            ("2kg".to_string(), dec("10.99")),
            ("Large Breed - 12kg".to_string(), dec("45.50")),
        ]
    );
}

#[test]
fn out_of_stock_page_is_skipped() {
    let body = PRODUCT.replace("<select id=\"Variants\">", "<p>Out of stock</p><select id=\"Variants\">");
    let outcome = parse_product_page(&body, "https://burnspet.co.uk/x").unwrap();
    assert!(matches!(outcome, PageOutcome::OutOfStock));
}

#[test]
fn page_without_user_content_is_a_parse_error() {
    let err = parse_product_page("<html><body><h1>Hi</h1></body></html>", "https://burnspet.co.uk/x")
        .unwrap_err();
    assert!(matches!(err, ScraperError::Parse { .. }));
}

#[test]
fn trustpilot_request_url_encodes_query() {
    let widget = TrustpilotWidget {
        business_unit_id: "bu-1".to_string(),
        template_id: "tpl-9".to_string(),
        locale: "en-GB".to_string(),
        sku: "SKU1,SKU2".to_string(),
    };
    let url = widget.request_url(TRUSTPILOT_TRUSTBOX_URL).unwrap();
    assert_eq!(
        url,
        "https://widget.trustpilot.com/trustbox-data/tpl-9?businessUnitId=bu-1&locale=en-GB&sku=SKU1%2CSKU2"
    );
}

#[test]
fn stars_average_reads_number_or_string() {
    assert_eq!(
        stars_average(&json!({"productReviewsSummary": {"starsAverage": 4.6}})),
        Some(dec("4.6"))
    );
    assert_eq!(
        stars_average(&json!({"productReviewsSummary": {"starsAverage": "4.5"}})),
        Some(dec("4.5"))
    );
    assert_eq!(stars_average(&json!({"productReviewsSummary": {}})), None);
    assert_eq!(
        Rating::from_average(stars_average(&json!({"productReviewsSummary": {"starsAverage": 0.0}})))
            .to_string(),
        "0/5"
    );
}

#[test]
fn variant_option_without_price_is_rejected() {
    assert!(parse_variant_option("Please choose").is_none());
    assert_eq!(
        parse_variant_option(" 6kg - £29.99 "),
        Some(("6kg".to_string(), dec("29.99")))
    );
}

/// Listing fetcher with scripted replies per URL; unknown URLs are missing.
struct ScriptedListing {
    pages: HashMap<String, Result<&'static str, &'static str>>,
}

#[async_trait]
impl Fetch for ScriptedListing {
    async fn fetch(
        &self,
        url: &str,
        _selector: &str,
        _headers: &[(&str, &str)],
    ) -> Result<Option<Document>, ScraperError> {
        match self.pages.get(url) {
            Some(Ok(body)) => Ok(Some(Document::new(url, *body))),
            Some(Err(reason)) => Err(ScraperError::Parse {
                url: url.to_string(),
                reason: (*reason).to_string(),
            }),
            None => Ok(None),
        }
    }

    async fn fetch_json(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
    ) -> Result<Option<serde_json::Value>, ScraperError> {
        Ok(None)
    }
}

#[tokio::test]
async fn later_listing_page_error_keeps_links_already_found() {
    let fetcher = ScriptedListing {
        pages: HashMap::from([
            ("https://burnspet.co.uk/dog-food".to_string(), Ok(LISTING)),
            (
                "https://burnspet.co.uk/dog-food/?paged=2".to_string(),
                Err("connection reset"),
            ),
        ]),
    };

    let rows = BurnsPet::new()
        .discover_links(&fetcher, "/dog-food")
        .await
        .expect("links from the first page survive");

    let urls: Vec<&str> = rows.iter().map(|row| row.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://burnspet.co.uk/dog-food/original-chicken/",
            "https://burnspet.co.uk/dog-food/weight-control/",
        ]
    );
}

#[tokio::test]
async fn first_listing_page_error_is_returned() {
    let fetcher = ScriptedListing {
        pages: HashMap::from([(
            "https://burnspet.co.uk/dog-food".to_string(),
            Err("connection reset"),
        )]),
    };

    let err = BurnsPet::new()
        .discover_links(&fetcher, "/dog-food")
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::Parse { .. }));
}
