//! JSON HTTP server for the catalog.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Status, version, catalog counts and load error |
//! | `GET`  | `/api/catalog` | The full catalog |
//! | `GET`  | `/api/search?q=&limit=` | Ranked search results |
//! | `GET`  | `/products[/...]` | Navigation state and view restored from the path |
//! | `POST` | `/api/reload` | Reload the catalog from its sources |
//! | `POST` | `/api/contact` | Relay a contact-form submission |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "limit must be >= 1" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `catalog_unavailable` (502), `relay_error` (502),
//! `contact_disabled` (503), `internal` (500).
//!
//! A reload where every source fails keeps serving the previous catalog.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the static front
//! end can be hosted elsewhere.

use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shivaya_catalog_core::images::ImageResolver;
use shivaya_catalog_core::models::Catalog;
use shivaya_catalog_core::navigation::{NavigationError, NavigationState, Navigator};
use shivaya_catalog_core::search::{search, SearchResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::contact::{ContactError, ContactRelay, ContactSubmission};
use crate::loader::{load_catalog, CatalogLoad, CatalogLoadError, SourceReport};

/// The catalog currently being served, with the outcome of the load that produced it.
struct Loaded {
    catalog: Arc<Catalog>,
    sources: Vec<SourceReport>,
    error: Option<CatalogLoadError>,
}

impl From<CatalogLoad> for Loaded {
    fn from(load: CatalogLoad) -> Self {
        Self {
            catalog: Arc::new(load.catalog),
            sources: load.sources,
            error: load.error,
        }
    }
}

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    resolver: Arc<ImageResolver>,
    loaded: Arc<RwLock<Loaded>>,
    contact: Option<Arc<ContactRelay>>,
}

impl AppState {
    async fn catalog(&self) -> Arc<Catalog> {
        self.loaded.read().await.catalog.clone()
    }
}

/// Loads the catalog and serves it on `[server].bind` until the process
/// is terminated. A failed initial load is served as an empty catalog
/// with the error reported on `/health`.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let resolver = Arc::new(ImageResolver::default());
    let load = load_catalog(config, &resolver).await?;
    if let Some(error) = &load.error {
        warn!(error = %error, "serving without a catalog; POST /api/reload to retry");
    }

    let contact = match &config.contact {
        Some(contact) => Some(Arc::new(ContactRelay::new(contact)?)),
        None => None,
    };

    let state = AppState {
        config: Arc::new(config.clone()),
        resolver,
        loaded: Arc::new(RwLock::new(load.into())),
        contact,
    };

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "catalog server listening");
    println!("Catalog server listening on http://{}", bind_addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/catalog", get(handle_catalog))
        .route("/api/search", get(handle_search))
        .route("/api/reload", post(handle_reload))
        .route("/api/contact", post(handle_contact))
        .route("/products", get(handle_products))
        .route("/products/{*rest}", get(handle_products))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn error(status: StatusCode, code: &'static str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code,
        message: message.into(),
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    error(StatusCode::BAD_REQUEST, "bad_request", message)
}

fn internal(message: impl Into<String>) -> AppError {
    error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

impl From<NavigationError> for AppError {
    fn from(err: NavigationError) -> Self {
        error(StatusCode::NOT_FOUND, "not_found", err.to_string())
    }
}

impl From<ContactError> for AppError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::Invalid(_) => bad_request(err.to_string()),
            ContactError::Request(_) | ContactError::Rejected(_) => {
                error(StatusCode::BAD_GATEWAY, "relay_error", err.to_string())
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    categories: usize,
    products: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog_error: Option<CatalogLoadError>,
    sources: Vec<SourceReport>,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let loaded = state.loaded.read().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        categories: loaded.catalog.categories.len(),
        products: loaded.catalog.product_count(),
        catalog_error: loaded.error,
        sources: loaded.sources.clone(),
    })
}

// ============ GET /api/catalog ============

async fn handle_catalog(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let catalog = state.catalog().await;
    let body = serde_json::to_value(catalog.as_ref()).map_err(|e| internal(e.to_string()))?;
    Ok(Json(body))
}

// ============ GET /api/search ============

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<SearchResult>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let limit = params.limit.unwrap_or(state.config.search.max_results);
    if limit == 0 {
        return Err(bad_request("limit must be >= 1"));
    }
    let catalog = state.catalog().await;
    let results = search(&catalog, &params.q, limit);
    Ok(Json(SearchResponse {
        query: params.q,
        results,
    }))
}

// ============ GET /products[/...] ============

#[derive(Serialize)]
struct ProductsResponse {
    /// Canonical path for the resolved state; shorter than the request when
    /// a segment did not match.
    path: String,
    state: NavigationState,
    view: serde_json::Value,
}

async fn handle_products(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<ProductsResponse>, AppError> {
    let mut navigator = Navigator::new(state.catalog().await);
    navigator.restore_from_path(uri.path())?;
    let view = serde_json::to_value(navigator.view()).map_err(|e| internal(e.to_string()))?;
    Ok(Json(ProductsResponse {
        path: navigator.path(),
        state: navigator.state().clone(),
        view,
    }))
}

// ============ POST /api/reload ============

#[derive(Serialize)]
struct ReloadResponse {
    categories: usize,
    products: usize,
    sources: Vec<SourceReport>,
}

async fn handle_reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    let load = load_catalog(&state.config, &state.resolver)
        .await
        .map_err(|e| internal(format!("{:#}", e)))?;

    if let Some(err) = load.error {
        warn!(error = %err, "reload failed; keeping previous catalog");
        let mut loaded = state.loaded.write().await;
        loaded.sources = load.sources;
        return Err(error(
            StatusCode::BAD_GATEWAY,
            "catalog_unavailable",
            err.to_string(),
        ));
    }

    let response = ReloadResponse {
        categories: load.catalog.categories.len(),
        products: load.catalog.product_count(),
        sources: load.sources.clone(),
    };
    *state.loaded.write().await = load.into();
    info!(products = response.products, "catalog reloaded");
    Ok(Json(response))
}

// ============ POST /api/contact ============

async fn handle_contact(
    State(state): State<AppState>,
    Json(submission): Json<ContactSubmission>,
) -> Result<Json<serde_json::Value>, AppError> {
    let relay = state.contact.as_ref().ok_or_else(|| {
        error(
            StatusCode::SERVICE_UNAVAILABLE,
            "contact_disabled",
            "contact relay is not configured",
        )
    })?;
    relay.submit(&submission).await?;
    Ok(Json(serde_json::json!({ "status": "sent" })))
}
