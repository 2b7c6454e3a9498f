//! Core data models for the product catalog.
//!
//! A [`Catalog`] is an ordered list of [`Category`]s, each holding ordered
//! [`Subcategory`]s, each holding ordered [`Product`]s. The catalog is built
//! once per load by [`crate::catalog::build_catalog`] and treated as
//! read-only afterwards.

use serde::{Deserialize, Serialize};

/// A catalog item after normalization and id assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique within the whole catalog.
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<ModelEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Variants>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ProductOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_l: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moq: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
    /// Display URL. Supplied by the source record or resolved by the loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A `{model_no, name}` pair from a source's model table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub model_no: String,
    pub name: String,
}

/// Product variants: plain labels in some source files, richer records in others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variants {
    Labels(Vec<String>),
    Detailed(Vec<VariantRecord>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A purchase option, e.g. "with lid" / "without lid".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_lid: Option<bool>,
    pub description: String,
}

/// Named grouping of products within one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub name: String,
    pub image: String,
    /// Source order.
    pub products: Vec<Product>,
}

/// Top-level grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub banner: String,
    pub subcategories: Vec<Subcategory>,
}

impl Category {
    pub fn find_subcategory(&self, name: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|s| s.name == name)
    }

    pub fn product_count(&self) -> usize {
        self.subcategories.iter().map(|s| s.products.len()).sum()
    }
}

/// The root structure returned by the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn find_category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn find_subcategory(&self, category: &str, name: &str) -> Option<&Subcategory> {
        self.find_category(category)?.find_subcategory(name)
    }

    pub fn find_product(&self, id: &str) -> Option<&Product> {
        self.products().find(|p| p.id == id)
    }

    /// All products in catalog encounter order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.categories
            .iter()
            .flat_map(|c| c.subcategories.iter())
            .flat_map(|s| s.products.iter())
    }

    pub fn product_count(&self) -> usize {
        self.categories.iter().map(Category::product_count).sum()
    }
}
