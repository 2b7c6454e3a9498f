//! Normalization of loosely-typed source records.
//!
//! Source files were exported from different catalogs and disagree on
//! field names and shapes. [`normalize_record`] is a total function from
//! any JSON value to an optional [`NormalizedRecord`]: known aliases are
//! folded into the internal field, unknown fields are ignored, and a
//! record without a usable name is dropped.
//!
//! # Accepted document shapes
//!
//! | Shape | Handling |
//! |-------|----------|
//! | `[ {...}, {...} ]` | each element is a record |
//! | `{ "products": [...] }` | the array is the record list |
//! | group record `{ "name": "...", "products": [...] }` | flattened; children inherit the group name as parent label and the group category |
//!
//! # Field aliases
//!
//! | Field | Keys (first non-empty wins) |
//! |-------|-----------------------------|
//! | name | `name`, `product_name`, `title` |
//! | subcategory | `subcategory`, `sub_category`, `type` |
//! | description | `description`, `desc` |
//! | image | `image`, `image_url` |

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{ModelEntry, Product, ProductOption, VariantRecord, Variants};

/// A record after field normalization, before classification and id
/// assignment. `product.id`, `product.category` and `product.subcategory`
/// are left empty; the catalog builder fills them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    pub product: Product,
    /// Id supplied by the source, if any.
    pub supplied_id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Name of the enclosing group record, if the record was nested.
    pub parent_label: Option<String>,
    /// Label of the source file the record came from.
    pub source_label: Option<String>,
}

/// Records extracted from one source document.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSource {
    pub records: Vec<NormalizedRecord>,
    /// Records dropped for lacking a name.
    pub dropped: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("expected a JSON array of products or an object with a `products` array, found {0}")]
    Unsupported(&'static str),
}

/// Replaces third-party brand names with the house brand in product text.
#[derive(Debug, Clone, Default)]
pub struct BrandRewrite {
    pattern: Option<Regex>,
    house_brand: String,
}

impl BrandRewrite {
    /// Builds a case-insensitive rewrite for `brands`. An empty list
    /// produces a rewrite that leaves text untouched.
    pub fn new(house_brand: &str, brands: &[String]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = brands
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Ok(Self::disabled());
        }
        let pattern = RegexBuilder::new(&format!("({})", alternatives.join("|")))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            pattern: Some(pattern),
            house_brand: house_brand.to_string(),
        })
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn apply(&self, text: &str) -> String {
        match &self.pattern {
            Some(re) => re.replace_all(text, self.house_brand.as_str()).into_owned(),
            None => text.to_string(),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Flattens and normalizes a whole source document.
pub fn normalize_source(
    document: &Value,
    source_label: Option<&str>,
    rewrite: &BrandRewrite,
) -> Result<NormalizedSource, ShapeError> {
    let items = match document {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("products") {
            Some(Value::Array(items)) => items,
            _ => return Err(ShapeError::Unsupported("an object without a `products` array")),
        },
        other => return Err(ShapeError::Unsupported(type_name(other))),
    };

    let mut out = NormalizedSource::default();
    let inherited = Inherited {
        parent_label: None,
        category: None,
        source_label: source_label.map(str::to_string),
    };
    flatten_into(items, &inherited, rewrite, &mut out);
    Ok(out)
}

struct Inherited {
    parent_label: Option<String>,
    category: Option<String>,
    source_label: Option<String>,
}

fn flatten_into(
    items: &[Value],
    inherited: &Inherited,
    rewrite: &BrandRewrite,
    out: &mut NormalizedSource,
) {
    for item in items {
        if let Some(Value::Array(children)) = item.get("products") {
            let obj = item.as_object();
            let child_inherited = Inherited {
                parent_label: obj
                    .and_then(|o| str_field(o, &["name", "title", "subcategory"]))
                    .or_else(|| inherited.parent_label.clone()),
                category: obj
                    .and_then(|o| str_field(o, &["category"]))
                    .or_else(|| inherited.category.clone()),
                source_label: inherited.source_label.clone(),
            };
            flatten_into(children, &child_inherited, rewrite, out);
            continue;
        }

        match normalize_record(item, inherited.parent_label.as_deref(), rewrite) {
            Some(mut record) => {
                if record.category.is_none() {
                    record.category = inherited.category.clone();
                }
                record.source_label = inherited.source_label.clone();
                out.records.push(record);
            }
            None => out.dropped += 1,
        }
    }
}

/// Normalizes one record. Returns `None` when the value is not an object
/// or has no usable name.
pub fn normalize_record(
    value: &Value,
    parent_label: Option<&str>,
    rewrite: &BrandRewrite,
) -> Option<NormalizedRecord> {
    let obj = value.as_object()?;
    let name = str_field(obj, &["name", "product_name", "title"])?;

    let description = str_field(obj, &["description", "desc"]).unwrap_or_default();

    let product = Product {
        id: String::new(),
        name: rewrite.apply(&name),
        category: String::new(),
        subcategory: String::new(),
        description: rewrite.apply(&description),
        brand: str_field(obj, &["brand"]),
        series: str_field(obj, &["series"]),
        material: str_field(obj, &["material"]),
        features: list_field(obj, "features"),
        sizes: list_field(obj, "sizes"),
        colors: list_field(obj, "colors"),
        capacities: list_field(obj, "capacities"),
        models: models_field(obj),
        variants: variants_field(obj),
        options: options_field(obj),
        outer_dimension: str_field(obj, &["outer_dimension"]),
        inner_dimension: str_field(obj, &["inner_dimension"]),
        capacity_l: num_field(obj, "capacity_l"),
        packaging: str_field(obj, &["packaging"]),
        moq: num_field(obj, "moq"),
        price_per_kg: num_field(obj, "price_per_kg"),
        finish: str_field(obj, &["finish"]),
        image: str_field(obj, &["image", "image_url"]),
    };

    Some(NormalizedRecord {
        product,
        supplied_id: str_field(obj, &["id"]),
        category: str_field(obj, &["category"]),
        subcategory: str_field(obj, &["subcategory", "sub_category", "type"]),
        parent_label: parent_label.map(str::to_string),
        source_label: None,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(scalar_to_string)
}

fn list_field(obj: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = obj
        .get(key)?
        .as_array()?
        .iter()
        .filter_map(scalar_to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

fn num_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn models_field(obj: &Map<String, Value>) -> Option<Vec<ModelEntry>> {
    let models: Vec<ModelEntry> = obj
        .get("models")?
        .as_array()?
        .iter()
        .filter_map(|m| {
            let m = m.as_object()?;
            Some(ModelEntry {
                model_no: str_field(m, &["model_no", "model", "code"])?,
                name: str_field(m, &["name"]).unwrap_or_default(),
            })
        })
        .collect();
    (!models.is_empty()).then_some(models)
}

fn variants_field(obj: &Map<String, Value>) -> Option<Variants> {
    let items = obj.get("variants")?.as_array()?;
    if items.iter().all(|v| !v.is_object()) {
        let labels: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
        return (!labels.is_empty()).then_some(Variants::Labels(labels));
    }

    let records: Vec<VariantRecord> = items
        .iter()
        .filter_map(|v| match v {
            Value::Object(o) => Some(VariantRecord {
                size: str_field(o, &["size"]),
                color: str_field(o, &["color", "colour"]),
                model: str_field(o, &["model", "model_no"]),
                name: str_field(o, &["name"]),
                description: str_field(o, &["description"]),
            }),
            other => scalar_to_string(other).map(|name| VariantRecord {
                name: Some(name),
                ..Default::default()
            }),
        })
        .collect();
    (!records.is_empty()).then_some(Variants::Detailed(records))
}

fn options_field(obj: &Map<String, Value>) -> Option<Vec<ProductOption>> {
    let options: Vec<ProductOption> = obj
        .get("options")?
        .as_array()?
        .iter()
        .filter_map(|o| {
            let o = o.as_object()?;
            Some(ProductOption {
                with_lid: o.get("with_lid").and_then(Value::as_bool),
                description: str_field(o, &["description"])?,
            })
        })
        .collect();
    (!options.is_empty()).then_some(options)
}
