//! ETL orchestration for one shop: link discovery and product detail runs
//! over the staging-table protocol.

pub mod error;
pub mod orchestrator;

pub use error::EtlError;
pub use orchestrator::{
    LinkDiscoverySummary, Orchestrator, ProductScrapeSummary, PRODUCT_PAGE_HEADERS,
};
