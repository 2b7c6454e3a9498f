//! Three-layer drill-down state kept in step with the URL.
//!
//! ```text
//! category ──enter_category──▶ subcategory ──enter_subcategory──▶ product
//!    ▲                              │  ▲                             │
//!    └────────────go_back───────────┘  └───────────go_back───────────┘
//! ```
//!
//! At the product layer `enter_product` selects a product for the detail
//! view without changing layer; `go_back` first clears that selection.
//!
//! URLs follow `/products[/{category}[/{subcategory}[/{product}]]]`,
//! each segment the [`slug`] of the entity name. Products whose names slug
//! alike within one subcategory get the slug of their id appended, see
//! [`product_segment`].

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::models::{Catalog, Category, Product, Subcategory};
use crate::search::{ResultKind, SearchResult};
use crate::slug::{matches, slug};

/// Root segment of every catalog URL.
pub const ROOT: &str = "/products";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    #[default]
    Category,
    Subcategory,
    Product,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Layer::Category => "category",
            Layer::Subcategory => "subcategory",
            Layer::Product => "product",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub layer: Layer,
    pub selected_category: Option<String>,
    pub selected_subcategory: Option<String>,
    /// Product id.
    pub selected_product: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("no category named {0:?}")]
    UnknownCategory(String),
    #[error("category {category:?} has no subcategory named {name:?}")]
    UnknownSubcategory { category: String, name: String },
    #[error("no product {0:?} in the selected subcategory")]
    UnknownProduct(String),
    #[error("cannot {action} from the {layer} layer")]
    InvalidTransition { action: &'static str, layer: Layer },
    #[error("not a catalog path: {0:?}")]
    InvalidPath(String),
}

/// Entities visible at the current layer.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum View<'a> {
    Categories {
        categories: &'a [Category],
    },
    Subcategories {
        category: &'a Category,
    },
    Products {
        category: &'a str,
        subcategory: &'a Subcategory,
    },
    Product {
        category: &'a str,
        subcategory: &'a str,
        product: &'a Product,
    },
}

/// Navigation over one loaded catalog. State changes only through the
/// methods below; a failed transition leaves it untouched.
#[derive(Debug, Clone)]
pub struct Navigator {
    catalog: Arc<Catalog>,
    state: NavigationState,
}

impl Navigator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            state: NavigationState::default(),
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Selects a category from any layer.
    pub fn enter_category(&mut self, name: &str) -> Result<&NavigationState, NavigationError> {
        let category = self.category(name)?.name.clone();
        self.state = NavigationState {
            layer: Layer::Subcategory,
            selected_category: Some(category),
            selected_subcategory: None,
            selected_product: None,
        };
        Ok(&self.state)
    }

    /// Selects a subcategory of the selected category.
    pub fn enter_subcategory(&mut self, name: &str) -> Result<&NavigationState, NavigationError> {
        if self.state.layer == Layer::Category {
            return Err(NavigationError::InvalidTransition {
                action: "enter a subcategory",
                layer: self.state.layer,
            });
        }
        let subcategory = find_subcategory(self.selected_category()?, name)?.name.clone();
        self.state.layer = Layer::Product;
        self.state.selected_subcategory = Some(subcategory);
        self.state.selected_product = None;
        Ok(&self.state)
    }

    /// Selects a product of the selected subcategory by id.
    pub fn enter_product(&mut self, id: &str) -> Result<&NavigationState, NavigationError> {
        if self.state.layer != Layer::Product {
            return Err(NavigationError::InvalidTransition {
                action: "enter a product",
                layer: self.state.layer,
            });
        }
        let product = self
            .selected_subcategory()?
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.id.clone())
            .ok_or_else(|| NavigationError::UnknownProduct(id.to_string()))?;
        self.state.selected_product = Some(product);
        Ok(&self.state)
    }

    /// Steps one level up. A no-op at the category layer.
    pub fn go_back(&mut self) -> &NavigationState {
        let state = &mut self.state;
        match state.layer {
            Layer::Product if state.selected_product.is_some() => {
                state.selected_product = None;
            }
            Layer::Product => {
                state.layer = Layer::Subcategory;
                state.selected_subcategory = None;
            }
            Layer::Subcategory => {
                *state = NavigationState::default();
            }
            Layer::Category => {}
        }
        &self.state
    }

    /// Resolves slugs as deep as the catalog allows and stops silently at
    /// the first segment that does not match.
    pub fn restore_from_url(
        &mut self,
        category: Option<&str>,
        subcategory: Option<&str>,
        product: Option<&str>,
    ) -> &NavigationState {
        let mut state = NavigationState::default();

        let found_category = category.and_then(|segment| {
            self.catalog
                .categories
                .iter()
                .find(|c| matches(&c.name, segment))
        });
        if let Some(c) = found_category {
            state.layer = Layer::Subcategory;
            state.selected_category = Some(c.name.clone());

            let found_sub = subcategory.and_then(|segment| {
                c.subcategories.iter().find(|s| matches(&s.name, segment))
            });
            if let Some(s) = found_sub {
                state.layer = Layer::Product;
                state.selected_subcategory = Some(s.name.clone());

                let found_product = product.and_then(|segment| {
                    s.products
                        .iter()
                        .find(|p| product_segment(s, p) == segment)
                        .or_else(|| s.products.iter().find(|p| matches(&p.name, segment)))
                });
                if let Some(p) = found_product {
                    state.selected_product = Some(p.id.clone());
                }
            }
        }

        self.state = state;
        &self.state
    }

    /// Parses a `/products/...` path and restores from its segments.
    pub fn restore_from_path(&mut self, path: &str) -> Result<&NavigationState, NavigationError> {
        let path_only = path.split(['?', '#']).next().unwrap_or_default();
        let mut segments = path_only.split('/').filter(|s| !s.is_empty());
        if segments.next() != Some(&ROOT[1..]) {
            return Err(NavigationError::InvalidPath(path.to_string()));
        }
        let category = segments.next();
        let subcategory = segments.next();
        let product = segments.next();
        Ok(self.restore_from_url(category, subcategory, product))
    }

    /// Drills into the entity behind a search result, from any layer.
    pub fn select_result(
        &mut self,
        result: &SearchResult,
    ) -> Result<&NavigationState, NavigationError> {
        let category = result.category.as_deref().unwrap_or(&result.name);
        let mut next = self.clone();
        next.enter_category(category)?;
        match result.kind {
            ResultKind::Category => {}
            ResultKind::Subcategory => {
                let subcategory = result.subcategory.as_deref().unwrap_or(&result.name);
                next.enter_subcategory(subcategory)?;
            }
            ResultKind::Product => {
                let subcategory = result
                    .subcategory
                    .as_deref()
                    .ok_or_else(|| NavigationError::UnknownProduct(result.id.clone()))?;
                next.enter_subcategory(subcategory)?;
                next.enter_product(&result.id)?;
            }
        }
        self.state = next.state;
        Ok(&self.state)
    }

    /// The URL for the current state.
    pub fn path(&self) -> String {
        let mut path = ROOT.to_string();
        if let Some(category) = &self.state.selected_category {
            path.push('/');
            path.push_str(&slug(category));
        }
        if let Some(subcategory) = &self.state.selected_subcategory {
            path.push('/');
            path.push_str(&slug(subcategory));
        }
        if let (Ok(subcategory), Some(product)) = (self.selected_subcategory(), self.selected_product()) {
            path.push('/');
            path.push_str(&product_segment(subcategory, product));
        }
        path
    }

    pub fn view(&self) -> View<'_> {
        let category = self.selected_category().ok();
        let subcategory = self.selected_subcategory().ok();
        match (self.state.layer, category, subcategory, self.selected_product()) {
            (Layer::Product, Some(c), Some(s), Some(p)) => View::Product {
                category: &c.name,
                subcategory: &s.name,
                product: p,
            },
            (Layer::Product, Some(c), Some(s), None) => View::Products {
                category: &c.name,
                subcategory: s,
            },
            (Layer::Subcategory, Some(c), _, _) => View::Subcategories { category: c },
            _ => View::Categories {
                categories: &self.catalog.categories,
            },
        }
    }

    fn category(&self, name: &str) -> Result<&Category, NavigationError> {
        self.catalog
            .find_category(name)
            .ok_or_else(|| NavigationError::UnknownCategory(name.to_string()))
    }

    fn selected_category(&self) -> Result<&Category, NavigationError> {
        let name = self.state.selected_category.as_deref().unwrap_or_default();
        self.category(name)
    }

    fn selected_subcategory(&self) -> Result<&Subcategory, NavigationError> {
        let category = self.selected_category()?;
        let name = self.state.selected_subcategory.as_deref().unwrap_or_default();
        find_subcategory(category, name)
    }

    fn selected_product(&self) -> Option<&Product> {
        let id = self.state.selected_product.as_deref()?;
        self.selected_subcategory()
            .ok()?
            .products
            .iter()
            .find(|p| p.id == id)
    }
}

/// URL segment for `product` within `subcategory`: the slug of its name,
/// followed by the slug of its id when another product there slugs alike.
pub fn product_segment(subcategory: &Subcategory, product: &Product) -> String {
    let name = slug(&product.name);
    let shared = subcategory
        .products
        .iter()
        .any(|p| p.id != product.id && slug(&p.name) == name);
    if shared {
        format!("{}-{}", name, slug(&product.id))
    } else {
        name
    }
}

fn find_subcategory<'c>(category: &'c Category, name: &str) -> Result<&'c Subcategory, NavigationError> {
    category
        .find_subcategory(name)
        .ok_or_else(|| NavigationError::UnknownSubcategory {
            category: category.name.clone(),
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::search;

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "Metal Pens".to_string(),
            subcategory: "Astral Series".to_string(),
            ..Default::default()
        }
    }

    fn navigator() -> Navigator {
        let catalog = Catalog {
            categories: vec![
                Category {
                    name: "Metal Pens".to_string(),
                    banner: String::new(),
                    subcategories: vec![
                        Subcategory {
                            name: "Astral Series".to_string(),
                            image: String::new(),
                            products: vec![
                                product("ME-AS-001", "Astral Pen 1"),
                                product("ME-AS-002", "Astral Pen 2"),
                            ],
                        },
                        Subcategory {
                            name: "Empty Series".to_string(),
                            image: String::new(),
                            products: vec![],
                        },
                    ],
                },
                Category {
                    name: "Kitchen World".to_string(),
                    banner: String::new(),
                    subcategories: vec![],
                },
            ],
        };
        Navigator::new(Arc::new(catalog))
    }

    #[test]
    fn test_initial_state() {
        let nav = navigator();
        assert_eq!(nav.state(), &NavigationState::default());
        assert_eq!(nav.path(), "/products");
        assert!(matches!(nav.view(), View::Categories { categories } if categories.len() == 2));
    }

    #[test]
    fn test_enter_then_back() {
        let mut nav = navigator();
        nav.enter_category("Metal Pens").unwrap();
        nav.enter_subcategory("Astral Series").unwrap();
        assert_eq!(nav.path(), "/products/metal-pens/astral-series");

        nav.go_back();
        assert_eq!(
            nav.state(),
            &NavigationState {
                layer: Layer::Subcategory,
                selected_category: Some("Metal Pens".to_string()),
                selected_subcategory: None,
                selected_product: None,
            }
        );
        assert_eq!(nav.path(), "/products/metal-pens");
    }

    #[test]
    fn test_product_detail_and_back() {
        let mut nav = navigator();
        nav.enter_category("Metal Pens").unwrap();
        nav.enter_subcategory("Astral Series").unwrap();
        nav.enter_product("ME-AS-002").unwrap();
        assert_eq!(nav.state().layer, Layer::Product);
        assert_eq!(nav.path(), "/products/metal-pens/astral-series/astral-pen-2");
        assert!(matches!(nav.view(), View::Product { product, .. } if product.id == "ME-AS-002"));

        nav.go_back();
        assert_eq!(nav.state().layer, Layer::Product);
        assert_eq!(nav.state().selected_product, None);
        nav.go_back();
        nav.go_back();
        assert_eq!(nav.state(), &NavigationState::default());
        nav.go_back();
        assert_eq!(nav.state(), &NavigationState::default());
    }

    #[test]
    fn test_invalid_transitions_leave_state() {
        let mut nav = navigator();
        assert_eq!(
            nav.enter_subcategory("Astral Series"),
            Err(NavigationError::InvalidTransition {
                action: "enter a subcategory",
                layer: Layer::Category,
            })
        );
        assert!(matches!(
            nav.enter_category("Garden"),
            Err(NavigationError::UnknownCategory(_))
        ));
        nav.enter_category("Metal Pens").unwrap();
        let before = nav.state().clone();
        assert!(nav.enter_subcategory("Vertex").is_err());
        assert!(nav.enter_product("ME-AS-001").is_err());
        assert_eq!(nav.state(), &before);
    }

    #[test]
    fn test_restore_stops_at_deepest_match() {
        let mut nav = navigator();
        let state = nav
            .restore_from_url(Some("metal-pens"), Some("nonexistent-sub"), None)
            .clone();
        assert_eq!(state.layer, Layer::Subcategory);
        assert_eq!(state.selected_category.as_deref(), Some("Metal Pens"));
        assert_eq!(state.selected_subcategory, None);
    }

    #[test]
    fn test_restore_full_path() {
        let mut nav = navigator();
        nav.restore_from_path("/products/metal-pens/astral-series/astral-pen-1/")
            .unwrap();
        assert_eq!(nav.state().selected_product.as_deref(), Some("ME-AS-001"));
        assert_eq!(nav.path(), "/products/metal-pens/astral-series/astral-pen-1");

        nav.restore_from_path("/products/unknown").unwrap();
        assert_eq!(nav.state(), &NavigationState::default());

        assert!(matches!(
            nav.restore_from_path("/about"),
            Err(NavigationError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_path_round_trips_through_restore() {
        let mut nav = navigator();
        nav.enter_category("Metal Pens").unwrap();
        nav.enter_subcategory("Astral Series").unwrap();
        nav.enter_product("ME-AS-001").unwrap();
        let path = nav.path();
        let expected = nav.state().clone();

        let mut fresh = navigator();
        fresh.restore_from_path(&path).unwrap();
        assert_eq!(fresh.state(), &expected);
    }

    #[test]
    fn test_products_with_same_name_get_distinct_paths() {
        let kadai = |id: &str| Product {
            id: id.to_string(),
            name: "Kadai".to_string(),
            category: "Kitchen World".to_string(),
            subcategory: "Cookware".to_string(),
            ..Default::default()
        };
        let tawa = Product {
            name: "Tawa".to_string(),
            ..kadai("KI-CO-003")
        };
        let catalog = Arc::new(Catalog {
            categories: vec![Category {
                name: "Kitchen World".to_string(),
                banner: String::new(),
                subcategories: vec![Subcategory {
                    name: "Cookware".to_string(),
                    image: String::new(),
                    products: vec![kadai("KI-CO-001"), kadai("KI-CO-002"), tawa],
                }],
            }],
        });

        let mut nav = Navigator::new(catalog.clone());
        nav.enter_category("Kitchen World").unwrap();
        nav.enter_subcategory("Cookware").unwrap();

        let mut paths = Vec::new();
        for id in ["KI-CO-001", "KI-CO-002", "KI-CO-003"] {
            nav.enter_product(id).unwrap();
            let path = nav.path();
            let mut restored = Navigator::new(catalog.clone());
            restored.restore_from_path(&path).unwrap();
            assert_eq!(restored.state().selected_product.as_deref(), Some(id));
            paths.push(path);
        }
        assert_eq!(
            paths,
            [
                "/products/kitchen-world/cookware/kadai-ki-co-001",
                "/products/kitchen-world/cookware/kadai-ki-co-002",
                "/products/kitchen-world/cookware/tawa",
            ]
        );

        // A bare name slug still lands on the first product with that name.
        let mut restored = Navigator::new(catalog);
        restored.restore_from_path("/products/kitchen-world/cookware/kadai").unwrap();
        assert_eq!(restored.state().selected_product.as_deref(), Some("KI-CO-001"));
    }

    #[test]
    fn test_empty_subcategory_is_a_valid_view() {
        let mut nav = navigator();
        nav.enter_category("Metal Pens").unwrap();
        nav.enter_subcategory("Empty Series").unwrap();
        match nav.view() {
            View::Products { subcategory, .. } => assert!(subcategory.products.is_empty()),
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn test_select_search_results() {
        let mut nav = navigator();
        let catalog = nav.catalog().clone();

        let product = search(&catalog, "astral pen 2", 10).remove(0);
        nav.select_result(&product).unwrap();
        assert_eq!(nav.path(), "/products/metal-pens/astral-series/astral-pen-2");

        let sub = search(&catalog, "astral series", 10).remove(0);
        assert_eq!(sub.kind, ResultKind::Subcategory);
        nav.select_result(&sub).unwrap();
        assert_eq!(nav.path(), "/products/metal-pens/astral-series");

        let cat = search(&catalog, "kitchen", 10).remove(0);
        nav.select_result(&cat).unwrap();
        assert_eq!(nav.state().layer, Layer::Subcategory);
        assert_eq!(nav.path(), "/products/kitchen-world");
    }
}
