//! Concurrent catalog loading with per-source failure tolerance.
//!
//! All sources are fetched at once and joined all-settled: one failing
//! source never cancels or fails the others. Results are folded in
//! source order, so the catalog does not depend on which fetch finished
//! first.
//!
//! A load fails as a whole only when no source responded. That case is
//! reported through [`CatalogLoad::error`] next to an empty catalog,
//! which keeps it distinguishable from a legitimately empty catalog.

use futures::future::join_all;
use serde::Serialize;
use shivaya_catalog_core::catalog::build_catalog;
use shivaya_catalog_core::classify::{CategoryRule, DEFAULT_RULES};
use shivaya_catalog_core::images::ImageResolver;
use shivaya_catalog_core::models::Catalog;
use shivaya_catalog_core::normalize::{normalize_source, BrandRewrite, NormalizedRecord};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::sources::{build_fetchers, SourceFetcher};

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogLoadError {
    #[error("no catalog sources configured")]
    NoSources,
    #[error("all {0} catalog sources failed to load")]
    AllSourcesFailed(usize),
}

/// Outcome for one source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub kind: String,
    pub location: String,
    /// True when the source responded and at least one of its documents parsed.
    pub ok: bool,
    pub documents: usize,
    pub records: usize,
    /// Records dropped for lacking a name.
    pub dropped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    pub sources: Vec<SourceReport>,
    pub error: Option<CatalogLoadError>,
}

/// Inputs to the fold that do not come from the sources themselves.
pub struct LoadOptions<'a> {
    pub rules: &'a [CategoryRule],
    pub rewrite: BrandRewrite,
    pub resolver: &'a ImageResolver,
}

pub async fn load_catalog(config: &Config, resolver: &ImageResolver) -> anyhow::Result<CatalogLoad> {
    let fetchers = build_fetchers(config)?;
    let rewrite = BrandRewrite::new(&config.branding.house_brand, &config.branding.replace)?;
    let options = LoadOptions {
        rules: DEFAULT_RULES,
        rewrite,
        resolver,
    };
    Ok(load_from_fetchers(&fetchers, &options).await)
}

pub async fn load_from_fetchers(
    fetchers: &[Box<dyn SourceFetcher>],
    options: &LoadOptions<'_>,
) -> CatalogLoad {
    if fetchers.is_empty() {
        warn!("no catalog sources configured");
        return CatalogLoad {
            catalog: Catalog::default(),
            sources: Vec::new(),
            error: Some(CatalogLoadError::NoSources),
        };
    }

    let settled = join_all(fetchers.iter().map(|f| f.fetch())).await;

    let mut records: Vec<NormalizedRecord> = Vec::new();
    let mut reports = Vec::with_capacity(fetchers.len());

    for (fetcher, result) in fetchers.iter().zip(settled) {
        let mut report = SourceReport {
            name: fetcher.name().to_string(),
            kind: fetcher.kind().to_string(),
            location: fetcher.location(),
            ok: false,
            documents: 0,
            records: 0,
            dropped: 0,
            errors: Vec::new(),
        };

        let documents = match result {
            Ok(documents) => documents,
            Err(e) => {
                let message = format!("{:#}", e);
                warn!(source = %report.name, error = %message, "source fetch failed");
                report.errors.push(message);
                reports.push(report);
                continue;
            }
        };

        report.documents = documents.len();
        let mut parsed = 0;
        for document in documents {
            let body = match &document.body {
                Ok(body) => body,
                Err(e) => {
                    warn!(source = %report.name, origin = %document.origin, error = %e, "unreadable document");
                    report.errors.push(format!("{}: {}", document.origin, e));
                    continue;
                }
            };
            let value: serde_json::Value = match serde_json::from_str(body) {
                Ok(value) => value,
                Err(e) => {
                    warn!(source = %report.name, origin = %document.origin, error = %e, "invalid JSON");
                    report.errors.push(format!("{}: {}", document.origin, e));
                    continue;
                }
            };
            match normalize_source(&value, fetcher.label(), &options.rewrite) {
                Ok(source) => {
                    parsed += 1;
                    report.records += source.records.len();
                    report.dropped += source.dropped;
                    if source.dropped > 0 {
                        debug!(
                            source = %report.name,
                            origin = %document.origin,
                            dropped = source.dropped,
                            "dropped records without a name"
                        );
                    }
                    records.extend(source.records);
                }
                Err(e) => {
                    warn!(source = %report.name, origin = %document.origin, error = %e, "unsupported document");
                    report.errors.push(format!("{}: {}", document.origin, e));
                }
            }
        }
        report.ok = report.documents == 0 || parsed > 0;
        reports.push(report);
    }

    let responded = reports.iter().filter(|r| r.ok).count();
    let error = (responded == 0).then_some(CatalogLoadError::AllSourcesFailed(reports.len()));

    let catalog = build_catalog(records, options.rules, options.resolver);
    info!(
        sources = reports.len(),
        failed = reports.len() - responded,
        categories = catalog.categories.len(),
        products = catalog.product_count(),
        "catalog loaded"
    );

    CatalogLoad {
        catalog,
        sources: reports,
        error,
    }
}

/// `shivaya load`: loads and prints a summary.
pub async fn run_load(config: &Config) -> anyhow::Result<()> {
    let resolver = ImageResolver::default();
    let load = load_catalog(config, &resolver).await?;

    println!("{:<16} {:<6} {:<6} {:>8} {:>8}", "SOURCE", "KIND", "OK", "RECORDS", "DROPPED");
    for report in &load.sources {
        println!(
            "{:<16} {:<6} {:<6} {:>8} {:>8}",
            report.name, report.kind, report.ok, report.records, report.dropped
        );
        for error in &report.errors {
            println!("  error: {}", error);
        }
    }
    println!();

    for category in &load.catalog.categories {
        println!(
            "{} ({} subcategories, {} products)",
            category.name,
            category.subcategories.len(),
            category.product_count()
        );
        for subcategory in &category.subcategories {
            println!("  {} ({})", subcategory.name, subcategory.products.len());
        }
    }

    println!();
    println!("categories: {}", load.catalog.categories.len());
    println!("products: {}", load.catalog.product_count());

    if let Some(error) = load.error {
        anyhow::bail!(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{DirSource, FetchedDocument, FileSource, HttpSource};
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StaticSource {
        name: &'static str,
        body: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl SourceFetcher for StaticSource {
        fn name(&self) -> &str {
            self.name
        }
        fn kind(&self) -> &str {
            "static"
        }
        fn location(&self) -> String {
            format!("static://{}", self.name)
        }
        async fn fetch(&self) -> anyhow::Result<Vec<FetchedDocument>> {
            match self.body {
                Ok(body) => Ok(vec![FetchedDocument::new(self.location(), body)]),
                Err(message) => anyhow::bail!("HTTP 500: {}", message),
            }
        }
    }

    fn source(name: &'static str, body: Result<&'static str, &'static str>) -> Box<dyn SourceFetcher> {
        Box::new(StaticSource { name, body })
    }

    async fn load(fetchers: Vec<Box<dyn SourceFetcher>>) -> CatalogLoad {
        let resolver = ImageResolver::default();
        let options = LoadOptions {
            rules: DEFAULT_RULES,
            rewrite: BrandRewrite::disabled(),
            resolver: &resolver,
        };
        load_from_fetchers(&fetchers, &options).await
    }

    const KITCHEN: &str = r#"[
        {"name": "Kadai", "category": "Kitchen World", "subcategory": "Cookware"},
        {"name": "Tawa", "category": "Kitchen World", "subcategory": "Cookware"},
        {"name": "Pressure Cooker", "category": "Kitchen World", "subcategory": "Cookers"}
    ]"#;

    #[tokio::test]
    async fn test_partial_failure_is_not_an_error() {
        let load = load(vec![
            source("kitchen", Ok(KITCHEN)),
            source("broken", Err("server error")),
        ])
        .await;

        assert_eq!(load.error, None);
        assert_eq!(load.catalog.categories.len(), 1);
        let kitchen = load.catalog.find_category("Kitchen World").unwrap();
        assert_eq!(kitchen.product_count(), 3);
        assert!(load.sources[0].ok);
        assert!(!load.sources[1].ok);
        assert!(load.sources[1].errors[0].contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_all_sources_failed() {
        let load = load(vec![
            source("a", Err("down")),
            source("b", Ok("{not json")),
        ])
        .await;
        assert_eq!(load.error, Some(CatalogLoadError::AllSourcesFailed(2)));
        assert!(load.catalog.is_empty());
    }

    #[tokio::test]
    async fn test_empty_source_is_not_a_failure() {
        let load = load(vec![source("empty", Ok("[]"))]).await;
        assert_eq!(load.error, None);
        assert!(load.catalog.is_empty());
    }

    #[tokio::test]
    async fn test_no_sources() {
        let load = load(Vec::new()).await;
        assert_eq!(load.error, Some(CatalogLoadError::NoSources));
    }

    #[tokio::test]
    async fn test_source_order_is_preserved() {
        let load = load(vec![
            source("pens", Ok(r#"[{"name": "Astral Pen", "category": "Metal Pens"}]"#)),
            source("kitchen", Ok(KITCHEN)),
            source("pens-2", Ok(r#"[{"name": "Vertex Pen", "category": "Metal Pens"}]"#)),
        ])
        .await;
        let names: Vec<&str> = load.catalog.products().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            ["Astral Pen", "Vertex Pen", "Kadai", "Tawa", "Pressure Cooker"]
        );
    }

    #[tokio::test]
    async fn test_dropped_records_are_counted() {
        let load = load(vec![source(
            "mixed",
            Ok(r#"[{"name": "Bucket"}, {"description": "nameless"}, 42]"#),
        )])
        .await;
        assert_eq!(load.sources[0].records, 1);
        assert_eq!(load.sources[0].dropped, 2);
    }

    #[tokio::test]
    async fn test_unreadable_file_in_dir_source_is_skipped() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("a.json"),
            r#"[{"name": "Kadai", "category": "Kitchen World"}]"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join("b.json"), [0xff, 0xfe, 0x00]).unwrap();

        let fetchers: Vec<Box<dyn SourceFetcher>> = vec![Box::new(DirSource::new(
            "data",
            tmp.path(),
            vec!["*.json".to_string()],
            None,
        ))];
        let load = load(fetchers).await;

        assert_eq!(load.error, None);
        assert_eq!(load.catalog.product_count(), 1);
        let report = &load.sources[0];
        assert!(report.ok);
        assert_eq!(report.documents, 2);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("b.json"));
    }

    #[tokio::test]
    async fn test_http_error_next_to_file_source() {
        let app = axum::Router::new().route(
            "/products.json",
            axum::routing::get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kitchen.json");
        std::fs::write(&path, KITCHEN).unwrap();

        let url = format!("http://{}/products.json", addr);
        let fetchers: Vec<Box<dyn SourceFetcher>> = vec![
            Box::new(FileSource::new("kitchen", &path, None)),
            Box::new(HttpSource::new("remote", url, None, Duration::from_secs(5)).unwrap()),
        ];
        let load = load(fetchers).await;

        assert_eq!(load.error, None);
        let kitchen = load.catalog.find_category("Kitchen World").unwrap();
        assert_eq!(kitchen.product_count(), 3);
        assert!(load.sources[0].ok);
        assert!(!load.sources[1].ok);
        assert!(load.sources[1].errors[0].contains("HTTP 500"));
    }
}
