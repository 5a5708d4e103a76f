use axum::{extract::State, Extension, Json};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::PreferencePacket,
    services::{fallback::MatchTier, selector::TieBreaking},
};

use super::{AppState, MovieSummary};

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub preferences: PreferencePacket,
    /// How many movies to return; the configured default when omitted
    pub count: Option<usize>,
    /// Conversation key for multi-turn requests; previously returned titles
    /// are not repeated for the same session
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextRecommendationRequest {
    pub text: String,
    /// Label from the external emotion detector, if the caller ran one
    pub emotion: Option<String>,
    #[serde(default)]
    pub emotion_confidence: f64,
    pub count: Option<usize>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendedMovie {
    #[serde(flatten)]
    pub movie: MovieSummary,
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<RecommendedMovie>,
    pub tier: MatchTier,
    /// The packet the text endpoint derived, echoed for transparency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferencePacket>,
}

/// Handler for structured recommendation requests
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    respond(
        &state,
        &request_id,
        request.preferences,
        request.count,
        request.session_id,
        false,
    )
    .await
}

/// Handler for free-text requests: extract preferences, then recommend
pub async fn recommend_from_text(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<TextRecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    if request.text.trim().is_empty() {
        return Err(AppError::InvalidInput("text must not be empty".to_string()));
    }

    let mut preferences = state.extractor.extract(&request.text).await?;
    // Emotion comes from the external detector, not the text; any label is
    // used for steering regardless of its confidence.
    preferences.emotion = request.emotion;
    preferences.emotion_confidence = request.emotion_confidence.clamp(0.0, 1.0);

    respond(
        &state,
        &request_id,
        preferences,
        request.count,
        request.session_id,
        true,
    )
    .await
}

async fn respond(
    state: &AppState,
    request_id: &RequestId,
    preferences: PreferencePacket,
    count: Option<usize>,
    session_id: Option<String>,
    echo_preferences: bool,
) -> AppResult<Json<RecommendationResponse>> {
    let limit = count.unwrap_or(state.config.result_count);
    if limit == 0 {
        return Err(AppError::InvalidInput(
            "count must be at least 1".to_string(),
        ));
    }

    let shown = match session_id.as_deref() {
        Some(id) => state.session_shown(id).await,
        None => BTreeSet::new(),
    };

    let mut tie_breaking = if state.config.shuffle_ties {
        TieBreaking::Shuffled(StdRng::from_os_rng())
    } else {
        TieBreaking::Stable
    };

    let engine = state.engine().await;
    let result = engine.recommend(&preferences, limit, &shown, &mut tie_breaking);

    tracing::info!(
        request_id = %request_id,
        requested = limit,
        returned = result.picks.len(),
        tier = ?result.tier,
        session = session_id.as_deref().unwrap_or("-"),
        "Recommendations served"
    );

    if let Some(id) = session_id.as_deref() {
        state
            .record_shown(id, result.picks.iter().map(|c| c.movie.title.as_str()))
            .await;
    }

    let recommendations = result
        .picks
        .iter()
        .map(|candidate| RecommendedMovie {
            movie: MovieSummary::from(candidate.movie),
            score: candidate.score,
            reasons: candidate.reasons.clone(),
        })
        .collect();

    Ok(Json(RecommendationResponse {
        recommendations,
        tier: result.tier,
        preferences: echo_preferences.then_some(preferences),
    }))
}
