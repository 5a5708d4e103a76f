use std::sync::Arc;

use moodflix_api::{
    config::Config,
    routes::{create_router, AppState},
    services::{engine::RecommendEngine, extractor::KeywordExtractor},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    // Build the catalog and similarity index up front; a server without a
    // valid catalog must not start.
    let engine = RecommendEngine::load(&config.catalog_path)?;
    tracing::info!(
        movies = engine.catalog().len(),
        "Recommendation engine ready"
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, engine, Arc::new(KeywordExtractor));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
