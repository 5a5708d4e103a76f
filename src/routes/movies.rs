use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

use super::{AppState, MovieSummary};

/// Default neighbour count for the similar-movies endpoint
const DEFAULT_SIMILAR_COUNT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    title: String,
    k: Option<usize>,
}

/// Handler for catalog title search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    if params.q.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "query must not be empty".to_string(),
        ));
    }

    let engine = state.engine().await;
    let matches = engine
        .catalog()
        .search(&params.q)
        .into_iter()
        .map(MovieSummary::from)
        .collect();

    Ok(Json(matches))
}

/// Handler for "movies similar to X" lookups against the similarity index
pub async fn similar(
    State(state): State<AppState>,
    Query(params): Query<SimilarQuery>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    let k = params.k.unwrap_or(DEFAULT_SIMILAR_COUNT);
    if k == 0 {
        return Err(AppError::InvalidInput("k must be at least 1".to_string()));
    }

    let engine = state.engine().await;
    let similar = engine
        .similar_to_title(&params.title, k)?
        .into_iter()
        .map(MovieSummary::from)
        .collect();

    Ok(Json(similar))
}
