//! Export the loaded catalog as JSON for static hosting.
//!
//! The output is the catalog itself (`{"categories": [...]}`) with every
//! id, banner and image already resolved, so a static front end can use
//! it without repeating the load.

use anyhow::Result;
use shivaya_catalog_core::images::ImageResolver;
use std::path::Path;

use crate::config::Config;
use crate::loader::load_catalog;

/// If `output` is `Some`, writes to that file path. Otherwise writes to
/// stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let resolver = ImageResolver::default();
    let load = load_catalog(config, &resolver).await?;
    if let Some(error) = load.error {
        anyhow::bail!(error);
    }

    let json = serde_json::to_string_pretty(&load.catalog)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!(
                "Exported {} categories, {} products to {}",
                load.catalog.categories.len(),
                load.catalog.product_count(),
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
