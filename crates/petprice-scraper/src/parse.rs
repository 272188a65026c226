//! Small HTML helpers shared by the shop adapters.
//!
//! Everything here is synchronous and takes a parsed [`Html`] or an
//! [`ElementRef`]; adapters call them between fetches, never across one.

use scraper::{ElementRef, Html, Selector};

use crate::ScraperError;

/// Compile a selector known at compile time.
///
/// # Panics
///
/// Panics if `css` is not a valid selector. Only call with literals.
#[must_use]
pub fn static_selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

/// Compile a selector supplied at runtime.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSelector`] if `css` does not parse.
pub fn compile_selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Whether `body` contains at least one element matching `selector`.
#[must_use]
pub fn body_matches(body: &str, selector: &Selector) -> bool {
    Html::parse_document(body).select(selector).next().is_some()
}

/// All descendant text of `element`, whitespace-collapsed and trimmed.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match of `selector` anywhere in `html`.
#[must_use]
pub fn first_text(html: &Html, selector: &Selector) -> Option<String> {
    html.select(selector).next().map(element_text)
}

/// Text of the first match of `selector` below `element`.
#[must_use]
pub fn first_text_in(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(element_text)
}

/// Whether any text node in the document equals `needle` once trimmed.
#[must_use]
pub fn has_exact_text(html: &Html, needle: &str) -> bool {
    html.root_element().text().any(|t| t.trim() == needle)
}

/// Resolve an `href` against a shop's base URL.
///
/// Absolute URLs pass through; root-relative and bare paths are joined.
#[must_use]
pub fn absolute_url(base_url: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}
