use petprice_core::CoreError;
use petprice_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("validation failed: {0}")]
    Validation(#[from] CoreError),

    #[error("staging table {table}: {source}")]
    Staging {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("failed to load {rows} rows into {table}: {source}")]
    Load {
        table: String,
        rows: usize,
        #[source]
        source: DbError,
    },

    #[error("failed to select unscraped URLs for {shop}: {source}")]
    Select {
        shop: String,
        #[source]
        source: DbError,
    },

    #[error("failed to update status of URL {id}: {source}")]
    StatusUpdate {
        id: i64,
        #[source]
        source: DbError,
    },

    #[error("{operation} promotion from {table} failed: {source}")]
    Promotion {
        operation: &'static str,
        table: String,
        #[source]
        source: DbError,
    },
}
