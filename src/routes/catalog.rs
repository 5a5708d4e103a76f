use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    services::engine::RecommendEngine,
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct CatalogInfo {
    pub movies: usize,
    pub loaded_at: DateTime<Utc>,
    /// True when the catalog had no feature text and similarity degraded to
    /// the identity matrix
    pub degenerate_similarity: bool,
}

impl From<&RecommendEngine> for CatalogInfo {
    fn from(engine: &RecommendEngine) -> Self {
        Self {
            movies: engine.catalog().len(),
            loaded_at: engine.loaded_at(),
            degenerate_similarity: engine.index().is_degenerate(),
        }
    }
}

/// Handler for catalog status
pub async fn info(State(state): State<AppState>) -> Json<CatalogInfo> {
    let engine = state.engine().await;
    Json(CatalogInfo::from(engine.as_ref()))
}

/// Handler for an explicit catalog reload.
///
/// Builds a fresh engine off the request path and swaps it in atomically;
/// requests already running keep the engine they started with.
pub async fn reload(State(state): State<AppState>) -> AppResult<Json<CatalogInfo>> {
    let path = state.config.catalog_path.clone();

    tracing::info!(path = %path, "Catalog reload requested");

    let engine = tokio::task::spawn_blocking(move || RecommendEngine::load(&path))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let info = CatalogInfo::from(&engine);
    state.swap_engine(engine).await;

    tracing::info!(movies = info.movies, "Catalog reloaded");

    Ok(Json(info))
}
