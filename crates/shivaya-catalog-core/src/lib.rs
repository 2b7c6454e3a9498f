//! # Shivaya Catalog Core
//!
//! I/O-free logic for the Shivaya Solutions product catalog: the data
//! model, record normalization, category inference, id assignment and
//! grouping, the image resolution policy, URL slugs, the three-layer
//! navigation state machine, ranked search, and a clock-injected
//! debouncer.
//!
//! This crate contains no tokio, reqwest, or filesystem access. Fetching
//! source files and serving the catalog live in the `shivaya-catalog`
//! application crate.

pub mod catalog;
pub mod classify;
pub mod debounce;
pub mod images;
pub mod models;
pub mod navigation;
pub mod normalize;
pub mod search;
pub mod slug;
