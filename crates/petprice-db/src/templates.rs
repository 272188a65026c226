//! Registry of the SQL statements the staging protocol runs.
//!
//! Each [`Template`] names one operation and embeds its SQL from `sql/`.
//! Table names are the only values interpolated into the text, and only
//! after passing [`validate_identifier`]; everything else (shop, ids,
//! statuses, row data) is a bound parameter.

use std::sync::LazyLock;

use regex::Regex;

use crate::DbError;

const TABLE_NAME_PLACEHOLDER: &str = "{table_name}";

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").expect("valid identifier regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    CreateLinksStaging,
    CreateProductsStaging,
    DropTable,
    DropTableIfExists,
    AppendUrls,
    AppendProducts,
    SelectUnscrapedUrls,
    UpdateUrlStatus,
    PromoteUrls,
    PromoteProducts,
    PromoteVariants,
    PromotePrices,
}

/// Named parameters available to a template at render time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateParams<'a> {
    pub table_name: Option<&'a str>,
}

impl<'a> TemplateParams<'a> {
    #[must_use]
    pub fn table(table_name: &'a str) -> Self {
        Self {
            table_name: Some(table_name),
        }
    }
}

impl Template {
    pub const ALL: [Template; 12] = [
        Template::CreateLinksStaging,
        Template::CreateProductsStaging,
        Template::DropTable,
        Template::DropTableIfExists,
        Template::AppendUrls,
        Template::AppendProducts,
        Template::SelectUnscrapedUrls,
        Template::UpdateUrlStatus,
        Template::PromoteUrls,
        Template::PromoteProducts,
        Template::PromoteVariants,
        Template::PromotePrices,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Template::CreateLinksStaging => "create_links_staging",
            Template::CreateProductsStaging => "create_products_staging",
            Template::DropTable => "drop_table",
            Template::DropTableIfExists => "drop_table_if_exists",
            Template::AppendUrls => "append_urls",
            Template::AppendProducts => "append_products",
            Template::SelectUnscrapedUrls => "select_unscraped_urls",
            Template::UpdateUrlStatus => "update_url_status",
            Template::PromoteUrls => "promote_urls",
            Template::PromoteProducts => "promote_products",
            Template::PromoteVariants => "promote_variants",
            Template::PromotePrices => "promote_prices",
        }
    }

    #[must_use]
    pub fn source(self) -> &'static str {
        match self {
            Template::CreateLinksStaging => include_str!("../sql/create_links_staging.sql"),
            Template::CreateProductsStaging => include_str!("../sql/create_products_staging.sql"),
            Template::DropTable => include_str!("../sql/drop_table.sql"),
            Template::DropTableIfExists => include_str!("../sql/drop_table_if_exists.sql"),
            Template::AppendUrls => include_str!("../sql/append_urls.sql"),
            Template::AppendProducts => include_str!("../sql/append_products.sql"),
            Template::SelectUnscrapedUrls => include_str!("../sql/select_unscraped_urls.sql"),
            Template::UpdateUrlStatus => include_str!("../sql/update_url_status.sql"),
            Template::PromoteUrls => include_str!("../sql/promote_urls.sql"),
            Template::PromoteProducts => include_str!("../sql/promote_products.sql"),
            Template::PromoteVariants => include_str!("../sql/promote_variants.sql"),
            Template::PromotePrices => include_str!("../sql/promote_prices.sql"),
        }
    }

    /// Look a template up by its operation name.
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    #[must_use]
    pub fn requires_table_name(self) -> bool {
        self.source().contains(TABLE_NAME_PLACEHOLDER)
    }

    /// Produce executable SQL for this template.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingTemplateParam`] if the template needs a
    /// table name and none was given, or [`DbError::InvalidIdentifier`] if
    /// the table name fails the allow-list.
    pub fn render(self, params: &TemplateParams<'_>) -> Result<String, DbError> {
        let source = self.source().trim_end();
        if !self.requires_table_name() {
            return Ok(source.to_string());
        }

        let table_name = params.table_name.ok_or(DbError::MissingTemplateParam {
            template: self.name(),
            param: "table_name",
        })?;
        validate_identifier(table_name)?;

        Ok(source.replace(TABLE_NAME_PLACEHOLDER, table_name))
    }
}

/// Reject anything that is not a plain lowercase SQL identifier.
///
/// # Errors
///
/// Returns [`DbError::InvalidIdentifier`] when `name` fails the pattern.
pub fn validate_identifier(name: &str) -> Result<(), DbError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}
