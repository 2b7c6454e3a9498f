//! `shivaya browse <path>`: resolves a catalog URL and prints what that
//! page would show.

use shivaya_catalog_core::images::ImageResolver;
use shivaya_catalog_core::navigation::{Navigator, View};
use std::sync::Arc;

use crate::config::Config;
use crate::loader::load_catalog;

pub async fn run_browse(config: &Config, path: &str) -> anyhow::Result<()> {
    let resolver = ImageResolver::default();
    let load = load_catalog(config, &resolver).await?;
    if let Some(error) = load.error {
        anyhow::bail!(error);
    }

    let mut navigator = Navigator::new(Arc::new(load.catalog));
    navigator.restore_from_path(path)?;

    let resolved = navigator.path();
    if resolved != path.trim_end_matches('/') {
        println!("resolved: {} (requested {})", resolved, path);
    } else {
        println!("resolved: {}", resolved);
    }
    println!("layer: {}", navigator.state().layer);
    println!();
    print_view(&navigator.view());
    Ok(())
}

pub fn print_view(view: &View<'_>) {
    match view {
        View::Categories { categories } => {
            if categories.is_empty() {
                println!("No products available.");
            }
            for category in categories.iter() {
                println!(
                    "{} ({} subcategories)",
                    category.name,
                    category.subcategories.len()
                );
            }
        }
        View::Subcategories { category } => {
            println!("{}", category.name);
            println!("banner: {}", category.banner);
            if category.subcategories.is_empty() {
                println!("No products available.");
            }
            for subcategory in &category.subcategories {
                println!("  {} ({} products)", subcategory.name, subcategory.products.len());
            }
        }
        View::Products {
            category,
            subcategory,
        } => {
            println!("{} / {}", category, subcategory.name);
            if subcategory.products.is_empty() {
                println!("No products available.");
            }
            for product in &subcategory.products {
                println!("  {}  {}", product.id, product.name);
            }
        }
        View::Product {
            category,
            subcategory,
            product,
        } => {
            println!("{} / {} / {}", category, subcategory, product.name);
            println!("id:          {}", product.id);
            if !product.description.is_empty() {
                println!("description: {}", product.description);
            }
            if let Some(brand) = &product.brand {
                println!("brand:       {}", brand);
            }
            if let Some(material) = &product.material {
                println!("material:    {}", material);
            }
            if let Some(features) = &product.features {
                println!("features:");
                for feature in features {
                    println!("  - {}", feature);
                }
            }
            if let Some(image) = &product.image {
                println!("image:       {}", image);
            }
        }
    }
}
