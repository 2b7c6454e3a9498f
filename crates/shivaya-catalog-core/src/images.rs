//! Deterministic image resolution for categories, subcategories and products.
//!
//! No image search service is involved. Every entity maps to a candidate
//! list from a fixed table, and the entry is chosen with
//! `hash_key(stable_key) % len`, so the same entity always gets the same
//! picture while siblings spread across the pool.
//!
//! # Lookup order
//!
//! | Level | Candidates | Stable key |
//! |-------|------------|------------|
//! | category | category `default` list | category name |
//! | subcategory | exact subcategory entry → keyword match → `default` | subcategory name |
//! | product | subcategory → series → text match → keyword match → `default` | product id |
//!
//! Categories missing from the table resolve through the `Other Products`
//! pool. An empty pool yields the global fallback image.
//!
//! Results are memoized in an injected [`ImageCache`] for the lifetime of
//! the resolver. Cache keys cover every input the choice depends on, so a
//! resolver can be shared across reloads.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::Product;

/// Image used when a pool is empty, and by consumers when an image fails to load.
pub const FALLBACK_IMAGE: &str =
    "https://images.unsplash.com/photo-1553413077-190dd305871c?auto=format&fit=crop&w=800&h=600&q=80";

/// Pool used for categories that have no table entry of their own.
pub const OTHER_PRODUCTS: &str = "Other Products";

/// Candidate images for one category.
#[derive(Debug)]
pub struct CategoryImages {
    pub category: &'static str,
    pub subcategories: &'static [(&'static str, &'static [&'static str])],
    pub default: &'static [&'static str],
}

impl CategoryImages {
    fn subcategory(&self, name: &str) -> Option<&'static [&'static str]> {
        self.subcategories
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, urls)| *urls)
    }

    /// Every URL this category can resolve to.
    fn all_urls(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.subcategories
            .iter()
            .flat_map(|(_, urls)| urls.iter().copied())
            .chain(self.default.iter().copied())
    }
}

macro_rules! unsplash {
    ($id:literal) => {
        concat!(
            "https://images.unsplash.com/photo-",
            $id,
            "?auto=format&fit=crop&w=800&h=600&q=80"
        )
    };
}

pub const IMAGE_TABLE: &[CategoryImages] = &[
    CategoryImages {
        category: "Metal Pens",
        subcategories: &[
            (
                "Executive",
                &[
                    unsplash!("1583485088034-697b5bc1b13a"),
                    unsplash!("1585336261022-680e295ce3fe"),
                ],
            ),
            (
                "Classic",
                &[
                    unsplash!("1568205612837-017257d2310a"),
                    unsplash!("1583485088034-697b5bc1b13a"),
                    unsplash!("1471107340929-a87cd0f5b5f3"),
                ],
            ),
            (
                "Premium",
                &[
                    unsplash!("1531088009183-5ff5b7c95f91"),
                    unsplash!("1576103200868-2dd453dbcd9c"),
                    unsplash!("1583485088034-697b5bc1b13a"),
                ],
            ),
        ],
        default: &[
            unsplash!("1583485088034-697b5bc1b13a"),
            unsplash!("1471107340929-a87cd0f5b5f3"),
            unsplash!("1568205612837-017257d2310a"),
        ],
    },
    CategoryImages {
        category: "Kitchen World",
        subcategories: &[
            (
                "Pressure Cooker",
                &[
                    unsplash!("1610557892470-55d9e80c0bce"),
                    unsplash!("1588068843273-4329bdbe4573"),
                ],
            ),
            (
                "Non-Stick",
                &[
                    unsplash!("1556911073-38141963c9e0"),
                    unsplash!("1556911220-e15b29be8c8f"),
                ],
            ),
            (
                "Hard Anodized",
                &[
                    unsplash!("1590794056226-79ef3a8147e1"),
                    unsplash!("1596189181426-7f63a1737f0d"),
                ],
            ),
            (
                "Cookware Set",
                &[
                    unsplash!("1584269600464-37b1b58a9fe7"),
                    unsplash!("1610701596061-2ecf227e85b2"),
                ],
            ),
            (
                "Idli Pot",
                &[
                    unsplash!("1589301760014-d929f3979dbc"),
                    unsplash!("1567337710282-00832b415979"),
                ],
            ),
        ],
        default: &[
            unsplash!("1556909114-f6e7ad7d3136"),
            unsplash!("1556911220-e15b29be8c8f"),
            unsplash!("1590794056226-79ef3a8147e1"),
        ],
    },
    CategoryImages {
        category: "Household Products",
        subcategories: &[
            (
                "Dustbin",
                &[
                    unsplash!("1610557892470-55d9e80c0bce"),
                    unsplash!("1561037404-61cd46aa615b"),
                ],
            ),
            (
                "Bucket",
                &[
                    unsplash!("1585515320310-259814833e62"),
                    unsplash!("1600695998647-e111ff1885eb"),
                ],
            ),
            (
                "Mug",
                &[
                    unsplash!("1577937927133-66ef06acdf62"),
                    unsplash!("1574177556859-1362f72ed6f9"),
                ],
            ),
            (
                "Water Bottle",
                &[
                    unsplash!("1602143407151-7111542de6e8"),
                    unsplash!("1523362628745-0c100150b504"),
                ],
            ),
            (
                "Bathroom Set",
                &[
                    unsplash!("1631871297972-3dbe4f8a2162"),
                    unsplash!("1573771807433-2e5f2bafde9d"),
                ],
            ),
        ],
        default: &[
            unsplash!("1584255014406-2a68ea38e48c"),
            unsplash!("1585515320310-259814833e62"),
            unsplash!("1631871297972-3dbe4f8a2162"),
        ],
    },
    CategoryImages {
        category: "Industrial Plastic Crates",
        subcategories: &[
            (
                "Plastic Crate",
                &[
                    unsplash!("1605600659873-d808a13e4d2a"),
                    unsplash!("1597106776019-b4ecc878c202"),
                ],
            ),
            (
                "Storage Bin",
                &[
                    unsplash!("1589802829985-817e51171b92"),
                    unsplash!("1589391886645-d51941baf7fb"),
                ],
            ),
            (
                "Vented Crate",
                &[
                    unsplash!("1597106776019-b4ecc878c202"),
                    unsplash!("1605600659873-d808a13e4d2a"),
                ],
            ),
            (
                "Industrial Container",
                &[
                    unsplash!("1517320069935-987eaa76bc23"),
                    unsplash!("1605600659873-d808a13e4d2a"),
                ],
            ),
        ],
        default: &[
            unsplash!("1605600659873-d808a13e4d2a"),
            unsplash!("1589802829985-817e51171b92"),
            unsplash!("1597106776019-b4ecc878c202"),
        ],
    },
    CategoryImages {
        category: OTHER_PRODUCTS,
        subcategories: &[
            (
                "Premium Cookware",
                &[
                    unsplash!("1584269600464-37b1b58a9fe7"),
                    unsplash!("1592154016568-9a38dbd21308"),
                ],
            ),
            (
                "Hotel Amenities",
                &[
                    unsplash!("1566073771259-6a8506099945"),
                    unsplash!("1563911302283-d2bc129e7570"),
                ],
            ),
        ],
        default: &[
            unsplash!("1553413077-190dd305871c"),
            unsplash!("1557801200-2f9769722036"),
        ],
    },
];

/// Keyword → subcategory-entry table, tried in order after exact and
/// name-containment matches. An entry only applies when the category's
/// table actually has that subcategory.
pub const SUBCATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Pressure Cooker", &["pressure", "cooker", "steam"]),
    ("Non-Stick", &["non-stick", "nonstick", "non stick", "teflon", "coating"]),
    ("Hard Anodized", &["hard anodized", "anodized", "hard-anodized"]),
    ("Cookware Set", &["cookware set", "set", "pots and pans", "cooking set"]),
    ("Bucket", &["bucket", "pail", "container"]),
    ("Mug", &["mug", "cup", "tumbler", "drink"]),
    ("Water Bottle", &["bottle", "drink", "beverage"]),
    ("Dustbin", &["dustbin", "trash", "garbage", "waste", "bin"]),
    ("Storage Bin", &["storage", "bin", "container", "box"]),
    ("Plastic Crate", &["crate", "container"]),
];

/// 32-bit polynomial rolling hash (`h * 31 + unit`) over UTF-16 code
/// units, absolute value. Matches the hash the public site has always
/// used, so image choices survive the port.
pub fn hash_key(key: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in key.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    hash.unsigned_abs()
}

/// Cache key for `kind` over `parts`. Each part is length-prefixed, so
/// names containing separators cannot collide.
pub fn cache_key(kind: &str, parts: &[&str]) -> String {
    let mut key = String::from(kind);
    for part in parts {
        key.push_str(&format!(":{}:{}", part.len(), part));
    }
    key
}

/// Key → URL memo owned by an [`ImageResolver`].
pub trait ImageCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn insert(&self, key: String, url: String);
}

/// In-process cache. Entries live as long as the cache; nothing is evicted.
#[derive(Debug, Default)]
pub struct MemoryImageCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageCache for MemoryImageCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn insert(&self, key: String, url: String) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, url);
        }
    }
}

/// Maps catalog entities to display URLs.
#[derive(Debug)]
pub struct ImageResolver<C: ImageCache = MemoryImageCache> {
    table: &'static [CategoryImages],
    fallback: String,
    cache: C,
}

impl Default for ImageResolver<MemoryImageCache> {
    fn default() -> Self {
        Self::new(MemoryImageCache::new())
    }
}

impl<C: ImageCache> ImageResolver<C> {
    pub fn new(cache: C) -> Self {
        Self {
            table: IMAGE_TABLE,
            fallback: FALLBACK_IMAGE.to_string(),
            cache,
        }
    }

    /// Replaces the global fallback image.
    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallback = url.into();
        self
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Every URL the given category's entities may resolve to, excluding
    /// the global fallback.
    pub fn candidate_pool(&self, category: &str) -> Vec<&'static str> {
        self.entry(category)
            .map(|e| e.all_urls().collect())
            .unwrap_or_default()
    }

    pub fn category_banner(&self, category: &str) -> String {
        self.cached(cache_key("category", &[category]), || {
            let pool = self.entry(category).map(|e| e.default).unwrap_or_default();
            self.pick(pool, category)
        })
    }

    pub fn subcategory_image(&self, category: &str, subcategory: &str) -> String {
        self.cached(cache_key("subcategory", &[category, subcategory]), || {
            let Some(entry) = self.entry(category) else {
                return self.fallback.clone();
            };
            let pool = entry
                .subcategory(subcategory)
                .or_else(|| match_by_text(entry, &subcategory.to_lowercase()))
                .unwrap_or(entry.default);
            self.pick(pool, subcategory)
        })
    }

    pub fn product_image(&self, product: &Product) -> String {
        let stable_key = if product.id.is_empty() {
            product.name.as_str()
        } else {
            product.id.as_str()
        };
        let key = cache_key(
            "product",
            &[
                stable_key,
                &product.category,
                &product.subcategory,
                product.series.as_deref().unwrap_or(""),
                &product.name,
                &product.description,
            ],
        );
        self.cached(key, || {
            let Some(entry) = self.entry(&product.category) else {
                return self.fallback.clone();
            };
            let searchable = format!(
                "{} {} {} {}",
                product.name,
                product.description,
                product.subcategory,
                product.series.as_deref().unwrap_or("")
            )
            .to_lowercase();
            let pool = entry
                .subcategory(&product.subcategory)
                .or_else(|| product.series.as_deref().and_then(|s| entry.subcategory(s)))
                .or_else(|| match_by_text(entry, &searchable))
                .unwrap_or(entry.default);
            self.pick(pool, stable_key)
        })
    }

    fn entry(&self, category: &str) -> Option<&'static CategoryImages> {
        let table = self.table;
        table
            .iter()
            .find(|e| e.category == category)
            .or_else(|| table.iter().find(|e| e.category == OTHER_PRODUCTS))
    }

    fn pick(&self, pool: &[&str], stable_key: &str) -> String {
        if pool.is_empty() {
            return self.fallback.clone();
        }
        let index = hash_key(stable_key) as usize % pool.len();
        pool[index].to_string()
    }

    fn cached(&self, key: String, compute: impl FnOnce() -> String) -> String {
        if let Some(url) = self.cache.get(&key) {
            return url;
        }
        let url = compute();
        self.cache.insert(key, url.clone());
        url
    }
}

/// Subcategory entry whose name, or one of whose keywords, appears in `text`.
fn match_by_text(entry: &CategoryImages, text: &str) -> Option<&'static [&'static str]> {
    if let Some((_, urls)) = entry
        .subcategories
        .iter()
        .find(|(key, _)| text.contains(&key.to_lowercase()))
    {
        return Some(*urls);
    }
    SUBCATEGORY_KEYWORDS
        .iter()
        .filter(|(_, terms)| terms.iter().any(|t| text.contains(t)))
        .find_map(|(key, _)| entry.subcategory(key))
}
