//! adx-converts library
//!
//! Serves the catalog of ADX converts and redirects per-file requests to
//! Google Drive download URLs, resolved from each convert's Drive folder.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod catalog;
pub mod gdrive;
pub mod pagination;
pub mod resolver;

use catalog::Catalog;
use resolver::{AssetResolver, FileRole};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Song catalog, immutable after startup
    pub catalog: Arc<Catalog>,
    /// Folder-backed file resolver (owns the folder cache)
    pub resolver: Arc<AssetResolver>,
}

impl AppState {
    /// Create new application state
    pub fn new(catalog: Catalog, resolver: AssetResolver) -> Self {
        Self {
            catalog: Arc::new(catalog),
            resolver: Arc::new(resolver),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let mut converts = Router::new().route("/adx/converts/list", get(api::list_converts));

    for role in FileRole::ALL {
        converts = converts.route(
            &format!("/adx/converts/:id/{}", role.as_str()),
            get(
                move |State(state): State<AppState>, Path(folder_id): Path<String>| {
                    api::resolve_file(state, folder_id, role)
                },
            ),
        );
    }

    Router::new()
        .merge(converts)
        .merge(api::health_routes())
        .route("/buildinfo", get(api::get_build_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
