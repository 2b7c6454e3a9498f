//! Ranked free-text search across categories, subcategories and products.
//!
//! Matching is a case-insensitive substring test. Ranking keys, in order:
//! exact name match, name starts with the query, result type
//! (product before subcategory before category), catalog encounter order.

use serde::{Deserialize, Serialize};

use crate::models::{Catalog, Product};

/// Cap applied when the caller has no preference.
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Category,
    Subcategory,
    Product,
}

impl ResultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Category => "category",
            ResultKind::Subcategory => "subcategory",
            ResultKind::Product => "product",
        }
    }

    fn priority(self) -> u8 {
        match self {
            ResultKind::Product => 0,
            ResultKind::Subcategory => 1,
            ResultKind::Category => 2,
        }
    }
}

/// A transient projection of one matching entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn contains(text: &str, query: &str) -> bool {
    text.to_lowercase().contains(query)
}

fn product_matches(product: &Product, query: &str) -> bool {
    contains(&product.name, query)
        || contains(&product.description, query)
        || contains(&product.subcategory, query)
        || product.brand.as_deref().is_some_and(|b| contains(b, query))
        || product
            .features
            .iter()
            .flatten()
            .any(|feature| contains(feature, query))
}

/// Returns at most `limit` results for `query`. A blank query returns nothing.
pub fn search(catalog: &Catalog, query: &str, limit: usize) -> Vec<SearchResult> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut results = Vec::new();
    for category in &catalog.categories {
        if contains(&category.name, &query) {
            results.push(SearchResult {
                kind: ResultKind::Category,
                id: format!("cat-{}", category.name),
                name: category.name.clone(),
                category: Some(category.name.clone()),
                subcategory: None,
                product: None,
                description: Some(format!(
                    "{} subcategories available",
                    category.subcategories.len()
                )),
                image: Some(category.banner.clone()),
            });
        }

        for subcategory in &category.subcategories {
            if contains(&subcategory.name, &query) {
                results.push(SearchResult {
                    kind: ResultKind::Subcategory,
                    id: format!("subcat-{}-{}", category.name, subcategory.name),
                    name: subcategory.name.clone(),
                    category: Some(category.name.clone()),
                    subcategory: Some(subcategory.name.clone()),
                    product: None,
                    description: Some(format!(
                        "{} products available",
                        subcategory.products.len()
                    )),
                    image: Some(subcategory.image.clone()),
                });
            }

            for product in &subcategory.products {
                if product_matches(product, &query) {
                    results.push(SearchResult {
                        kind: ResultKind::Product,
                        id: product.id.clone(),
                        name: product.name.clone(),
                        category: Some(category.name.clone()),
                        subcategory: Some(subcategory.name.clone()),
                        description: Some(product.description.clone()),
                        image: product.image.clone(),
                        product: Some(product.clone()),
                    });
                }
            }
        }
    }

    // sort_by_key is stable, so encounter order breaks remaining ties.
    results.sort_by_key(|r| {
        let name = r.name.to_lowercase();
        (name != query, !name.starts_with(&query), r.kind.priority())
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Subcategory};

    fn product(id: &str, name: &str, subcategory: &str) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "Kitchen World".to_string(),
            subcategory: subcategory.to_string(),
            ..Default::default()
        }
    }

    fn catalog() -> Catalog {
        let mut knife = product("KI-KN-001", "Chef Knife", "Knives");
        knife.features = Some(vec!["Stainless steel blade".to_string()]);
        let mut set = product("KI-KN-002", "Knife Set", "Knives");
        set.brand = Some("Shivaya Solutions".to_string());
        Catalog {
            categories: vec![
                Category {
                    name: "Kitchen World".to_string(),
                    banner: "banner.jpg".to_string(),
                    subcategories: vec![
                        Subcategory {
                            name: "Knives".to_string(),
                            image: "knives.jpg".to_string(),
                            products: vec![
                                knife,
                                set,
                                product("KI-KN-003", "Knife", "Knives"),
                            ],
                        },
                        Subcategory {
                            name: "Cookware".to_string(),
                            image: "cookware.jpg".to_string(),
                            products: vec![product("KI-CO-001", "Kadai", "Cookware")],
                        },
                    ],
                },
                Category {
                    name: "Metal Pens".to_string(),
                    banner: "pens.jpg".to_string(),
                    subcategories: vec![],
                },
            ],
        }
    }

    fn names(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_blank_query_is_empty() {
        let catalog = catalog();
        assert!(search(&catalog, "", DEFAULT_LIMIT).is_empty());
        assert!(search(&catalog, "   ", DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn test_exact_match_ranks_first() {
        let results = search(&catalog(), "knife", DEFAULT_LIMIT);
        assert_eq!(names(&results), ["Knife", "Knife Set", "Chef Knife"]);
    }

    #[test]
    fn test_type_priority_then_encounter_order() {
        // "kni" prefixes all three products and the subcategory.
        let results = search(&catalog(), "KNI", DEFAULT_LIMIT);
        let kinds: Vec<ResultKind> = results.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            [
                ResultKind::Product,
                ResultKind::Product,
                ResultKind::Subcategory,
                ResultKind::Product,
            ]
        );
        assert_eq!(names(&results), ["Knife Set", "Knife", "Knives", "Chef Knife"]);
    }

    #[test]
    fn test_matches_features_and_brand() {
        let catalog = catalog();
        assert_eq!(names(&search(&catalog, "stainless", 10)), ["Chef Knife"]);
        assert_eq!(names(&search(&catalog, "shivaya", 10)), ["Knife Set"]);
    }

    #[test]
    fn test_category_and_subcategory_results() {
        let results = search(&catalog(), "world", 10);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.kind, ResultKind::Category);
        assert_eq!(result.id, "cat-Kitchen World");
        assert_eq!(result.description.as_deref(), Some("2 subcategories available"));
        assert_eq!(result.image.as_deref(), Some("banner.jpg"));

        // Exact name match outranks the product whose subcategory matched.
        let results = search(&catalog(), "cookware", 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].kind, ResultKind::Product);
        let sub = &results[0];
        assert_eq!(sub.kind, ResultKind::Subcategory);
        assert_eq!(sub.id, "subcat-Kitchen World-Cookware");
        assert_eq!(sub.description.as_deref(), Some("1 products available"));
    }

    #[test]
    fn test_limit() {
        assert_eq!(search(&catalog(), "k", 2).len(), 2);
    }

    #[test]
    fn test_serializes_type_tag() {
        let results = search(&catalog(), "metal", 10);
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["type"], "category");
        assert!(json.get("product").is_none());
    }
}
