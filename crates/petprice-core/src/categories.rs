use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::shops::Shop;
use crate::ConfigError;

/// Per-shop category list, stored as `{"data": ["/dog-food", ...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesFile {
    pub data: Vec<String>,
}

/// Path of the category file for `shop` inside `dir`.
#[must_use]
pub fn categories_path(dir: &Path, shop: Shop) -> PathBuf {
    dir.join(format!("{}.json", shop.slug()))
}

/// Load and validate the category list for `shop` from `dir`.
///
/// Membership in the shop's declared set is not checked here; the
/// orchestrator does that before a pipeline touches the store.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(dir: &Path, shop: Shop) -> Result<CategoriesFile, ConfigError> {
    let path = categories_path(dir, shop);
    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CategoriesFile =
        serde_json::from_str(&content).map_err(|e| ConfigError::CategoriesFileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_categories(&file)?;

    Ok(file)
}

fn validate_categories(file: &CategoriesFile) -> Result<(), ConfigError> {
    if file.data.is_empty() {
        return Err(ConfigError::Validation(
            "category list must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for category in &file.data {
        if category.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category must be non-empty".to_string(),
            ));
        }
        if !seen.insert(category.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category: '{category}'"
            )));
        }
    }

    Ok(())
}
