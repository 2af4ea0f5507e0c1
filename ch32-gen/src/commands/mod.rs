pub mod boards;
pub mod chips;
pub mod configure;
pub mod link;

use crate::catalog::BoardCatalog;
use anyhow::{Context, Result};
use std::path::Path;

/// Loads the catalog from `path`, or the built-in one.
pub(crate) fn load_catalog(path: Option<&Path>) -> Result<BoardCatalog> {
    match path {
        Some(path) => BoardCatalog::from_path(path)
            .with_context(|| format!("Failed to load catalog '{}'.", path.display())),
        None => BoardCatalog::builtin().context("Failed to load the built-in catalog."),
    }
}
