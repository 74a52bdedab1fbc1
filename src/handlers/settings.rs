use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::ApiError;
use crate::domain::ReviewStrategy;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StrategyRequest {
    pub strategy: String,
}

/// GET /api/users/{user_id}/strategy
pub async fn get_strategy(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    let strategy = state.profiles.get_review_strategy(&user_id)?;
    Ok(Json(serde_json::json!({ "strategy": strategy })).into_response())
}

/// Unknown strategy names fall back to the default rather than failing.
///
/// PUT /api/users/{user_id}/strategy
pub async fn put_strategy(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<StrategyRequest>,
) -> Result<Response, ApiError> {
    let strategy = ReviewStrategy::parse_lenient(Some(request.strategy.as_str()));
    state.profiles.set_review_strategy(&user_id, strategy)?;
    tracing::info!("Review strategy for {} set to {}", user_id, strategy.as_str());
    Ok(Json(serde_json::json!({ "strategy": strategy })).into_response())
}

/// GET /api/users/{user_id}/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    let profile = state.profiles.get_profile(&user_id)?;
    Ok(Json(profile).into_response())
}
