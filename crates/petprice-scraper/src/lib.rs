pub mod document;
pub mod error;
pub mod fetch;
pub mod parse;
pub mod shops;

pub use document::Document;
pub use error::ScraperError;
pub use fetch::{Fetch, PageFetcher};
pub use shops::{Adapter, BurnsPet, ShopAdapter, TheNaturalPetStore};
