//! Convert catalog and file redirect endpoints
//!
//! - `GET /adx/converts/list?search=&page=`
//! - `GET /adx/converts/:id/{track|chart|image|video}`

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::catalog::ConvertSong;
use crate::pagination::{paginate, parse_page, PageError};
use crate::resolver::{FileRole, ResolveError};
use crate::AppState;

/// Query parameters for the list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Whitespace-separated search terms
    pub search: Option<String>,
    /// 0-indexed page, validated by `parse_page`
    pub page: Option<String>,
}

/// GET /adx/converts/list
///
/// Returns the catalog, optionally filtered by `search` and paginated
/// 25 songs per `page`.
pub async fn list_converts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ConvertSong>>, ApiError> {
    let page = parse_page(query.page.as_deref())?;
    let matches = state.catalog.search(query.search.as_deref());

    Ok(Json(
        paginate(&matches, page).iter().map(|&song| song.clone()).collect(),
    ))
}

/// GET /adx/converts/:id/{role}
///
/// Redirects (302) to the direct download URL of the role's file in the
/// convert's Drive folder. Routed once per role, see [`crate::build_router`].
pub async fn resolve_file(
    state: AppState,
    folder_id: String,
    role: FileRole,
) -> Result<Response, ApiError> {
    let url = state.resolver.resolve(&folder_id, role).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

/// Convert endpoint errors
#[derive(Debug)]
pub enum ApiError {
    Page(PageError),
    Resolve(ResolveError),
}

impl From<PageError> for ApiError {
    fn from(e: PageError) -> Self {
        ApiError::Page(e)
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        ApiError::Resolve(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Page(_) => StatusCode::BAD_REQUEST,
            ApiError::Resolve(ResolveError::MalformedId(_)) => StatusCode::BAD_REQUEST,
            ApiError::Resolve(ResolveError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Resolve(ResolveError::Folder(e)) => {
                warn!("Folder lookup failed: {}", e);
                StatusCode::BAD_GATEWAY
            }
        };

        let message = match self {
            ApiError::Page(e) => e.to_string(),
            ApiError::Resolve(ResolveError::MalformedId(_)) => {
                "id is missing or is malformed".to_string()
            }
            ApiError::Resolve(e) => e.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
