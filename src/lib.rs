//! # Shivaya Catalog
//!
//! Loads the Shivaya Solutions product catalog from static JSON sources,
//! and serves it for browsing and search from the command line or over a
//! JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐
//! │   Sources    │──▶│    Loader    │──▶│    Catalog    │
//! │ file/dir/http│   │ normalize +  │   │ category →    │
//! └──────────────┘   │ classify +   │   │ subcategory → │
//!                    │ ids + images │   │ product       │
//!                    └──────────────┘   └───────┬───────┘
//!                                               │
//!                         ┌─────────────────────┤
//!                         ▼                     ▼
//!                    ┌──────────┐         ┌──────────┐
//!                    │   CLI    │         │   HTTP   │
//!                    │(shivaya) │         │  (JSON)  │
//!                    └──────────┘         └──────────┘
//! ```
//!
//! The I/O-free parts (data model, normalization, classification, image
//! policy, navigation, search, debouncing) live in `shivaya-catalog-core`.
//!
//! ## Quick Start
//!
//! ```bash
//! shivaya sources                     # check configured sources
//! shivaya load                        # load and summarize the catalog
//! shivaya search "pressure cooker"
//! shivaya browse /products/metal-pens
//! shivaya serve                       # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`sources`] | File, directory and HTTP source fetchers |
//! | [`loader`] | Concurrent, failure-tolerant catalog loading |
//! | [`search`] | CLI search and the debounced search task |
//! | [`browse`] | URL-driven browsing |
//! | [`export`] | JSON export |
//! | [`contact`] | Contact-form relay client |
//! | [`server`] | JSON HTTP server |
//! | [`logging`] | tracing subscriber setup |

pub mod browse;
pub mod config;
pub mod contact;
pub mod export;
pub mod loader;
pub mod logging;
pub mod search;
pub mod server;
pub mod sources;

