//! Catalog construction: classification, id assignment, grouping and
//! image attachment for a flat list of normalized records.
//!
//! The builder is a pure function of its input. Running it twice over
//! identical records yields identical ids, grouping and images, which is
//! what keeps bookmarked product URLs valid across reloads.

use std::collections::{HashMap, HashSet};

use crate::classify::{classify, CategoryRule};
use crate::images::{ImageCache, ImageResolver};
use crate::models::{Catalog, Category, Product, Subcategory};
use crate::normalize::NormalizedRecord;

/// Two upper-cased alphanumeric characters of `name`, or `XX` when it has none.
pub fn id_prefix(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(2)
        .collect::<String>()
        .to_ascii_uppercase();
    if prefix.is_empty() {
        "XX".to_string()
    } else {
        prefix
    }
}

/// `{CC}-{SS}-{NNN}` with a 1-based sequence.
pub fn synthetic_id(category: &str, subcategory: &str, sequence: u32) -> String {
    format!(
        "{}-{}-{:03}",
        id_prefix(category),
        id_prefix(subcategory),
        sequence
    )
}

/// Builds the catalog from records in source order.
///
/// Records without a category are classified with `rules`. A record
/// without a subcategory takes its series, then its parent label, then
/// the matched rule's subcategory.
pub fn build_catalog<C: ImageCache>(
    records: Vec<NormalizedRecord>,
    rules: &[CategoryRule],
    resolver: &ImageResolver<C>,
) -> Catalog {
    let mut products: Vec<(Product, Option<String>)> = records
        .into_iter()
        .map(|record| classify_record(record, rules))
        .collect();

    assign_ids(&mut products);

    let mut catalog = Catalog::default();
    let mut category_index: HashMap<String, usize> = HashMap::new();
    let mut subcategory_index: HashMap<(String, String), usize> = HashMap::new();

    for (mut product, _) in products {
        if product.image.is_none() {
            product.image = Some(resolver.product_image(&product));
        }

        let ci = *category_index
            .entry(product.category.clone())
            .or_insert_with(|| {
                catalog.categories.push(Category {
                    name: product.category.clone(),
                    banner: resolver.category_banner(&product.category),
                    subcategories: Vec::new(),
                });
                catalog.categories.len() - 1
            });
        let category = &mut catalog.categories[ci];

        let si = *subcategory_index
            .entry((product.category.clone(), product.subcategory.clone()))
            .or_insert_with(|| {
                category.subcategories.push(Subcategory {
                    name: product.subcategory.clone(),
                    image: resolver.subcategory_image(&product.category, &product.subcategory),
                    products: Vec::new(),
                });
                category.subcategories.len() - 1
            });
        category.subcategories[si].products.push(product);
    }

    catalog
}

fn classify_record(record: NormalizedRecord, rules: &[CategoryRule]) -> (Product, Option<String>) {
    let NormalizedRecord {
        mut product,
        supplied_id,
        category,
        subcategory,
        parent_label,
        source_label,
    } = record;

    let rule = classify(
        rules,
        [
            Some(product.name.as_str()),
            parent_label.as_deref(),
            source_label.as_deref(),
        ]
        .into_iter()
        .flatten(),
    );

    product.category = category.unwrap_or_else(|| rule.category.to_string());
    product.subcategory = subcategory
        .or_else(|| product.series.clone())
        .or(parent_label)
        .unwrap_or_else(|| rule.subcategory.to_string());
    (product, supplied_id)
}

/// Keeps the first occurrence of each supplied id and gives everything
/// else a synthetic id that no other product holds.
fn assign_ids(products: &mut [(Product, Option<String>)]) {
    let mut taken: HashSet<String> = HashSet::new();
    for (product, supplied) in products.iter_mut() {
        if let Some(id) = supplied.take() {
            if taken.insert(id.clone()) {
                product.id = id;
            }
        }
    }

    let mut counters: HashMap<(String, String), u32> = HashMap::new();
    for (product, _) in products.iter_mut() {
        if !product.id.is_empty() {
            continue;
        }
        let counter = counters
            .entry((product.category.clone(), product.subcategory.clone()))
            .or_insert(0);
        let id = loop {
            *counter += 1;
            let candidate = synthetic_id(&product.category, &product.subcategory, *counter);
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(id.clone());
        product.id = id;
    }
}
