use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub mod catalog;
pub mod movies;
pub mod recommendations;

use crate::{
    config::Config,
    middleware::request_id::request_id_middleware,
    models::MovieRecord,
    services::{engine::RecommendEngine, extractor::PreferenceExtractor},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// The recommendation engine. Swapped wholesale on catalog reload;
    /// handlers clone the inner `Arc` once and serve the whole request from
    /// that consistent snapshot.
    engine: Arc<RwLock<Arc<RecommendEngine>>>,
    pub extractor: Arc<dyn PreferenceExtractor>,
    /// Titles already recommended, partitioned by caller session key
    sessions: Arc<RwLock<HashMap<String, BTreeSet<String>>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        engine: RecommendEngine,
        extractor: Arc<dyn PreferenceExtractor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(RwLock::new(Arc::new(engine))),
            extractor,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Snapshot of the current engine
    pub async fn engine(&self) -> Arc<RecommendEngine> {
        self.engine.read().await.clone()
    }

    /// Atomically replaces the engine. In-flight requests keep the old one.
    pub async fn swap_engine(&self, engine: RecommendEngine) {
        *self.engine.write().await = Arc::new(engine);
    }

    /// Lowercased titles already shown to this session
    pub async fn session_shown(&self, session_id: &str) -> BTreeSet<String> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn record_shown<'a>(
        &self,
        session_id: &str,
        titles: impl Iterator<Item = &'a str>,
    ) {
        let mut sessions = self.sessions.write().await;
        let shown = sessions.entry(session_id.to_string()).or_default();
        shown.extend(titles.map(|t| t.to_lowercase()));
    }
}

/// Serializable projection of a catalog movie for API responses
#[derive(Debug, Serialize)]
pub struct MovieSummary {
    pub title: String,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub actors: Vec<String>,
    pub mood_tags: BTreeSet<String>,
    pub quality_score: f64,
}

impl From<&MovieRecord> for MovieSummary {
    fn from(movie: &MovieRecord) -> Self {
        Self {
            title: movie.title.clone(),
            year: movie.year,
            genres: movie.genres.clone(),
            directors: movie.directors.clone(),
            actors: movie.actors.clone(),
            mood_tags: movie.mood_tags.clone(),
            quality_score: movie.quality_score,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route(
            "/recommendations/text",
            post(recommendations::recommend_from_text),
        )
        .route("/movies/search", get(movies::search))
        .route("/movies/similar", get(movies::similar))
        .route("/catalog", get(catalog::info))
        .route("/catalog/reload", post(catalog::reload))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
