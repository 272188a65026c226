pub mod app_config;
pub mod categories;
pub mod config;
pub mod normalize;
pub mod products;
pub mod shops;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use categories::{load_categories, CategoriesFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use normalize::{Discount, Rating};
pub use products::{ProductRecord, ProductRowSet, ScrapeStatus, UnscrapedUrl, UrlRow, VariantRecord};
pub use shops::{Shop, ShopConfig};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid category '{category}' for {shop}; must be one of {allowed:?}")]
    InvalidCategory {
        shop: String,
        category: String,
        allowed: Vec<String>,
    },

    #[error("unknown shop: {0}")]
    UnknownShop(String),

    #[error("invalid price '{raw}': {reason}")]
    InvalidPrice { raw: String, reason: String },

    #[error("invalid scrape status: {0}")]
    InvalidStatus(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read categories file {path}: {source}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse categories file {path}: {source}")]
    CategoriesFileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("categories validation failed: {0}")]
    Validation(String),
}
