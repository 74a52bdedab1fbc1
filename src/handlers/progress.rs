use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::{not_found, ApiError, LimitQuery};
use crate::config;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub word_id: String,
    pub correct: bool,
}

/// Record one answer and return the updated review state.
///
/// POST /api/users/{user_id}/answers
pub async fn record_answer(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<AnswerRequest>,
) -> Result<Response, ApiError> {
    if request.word_id.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "word_id must not be empty"
            })),
        )
            .into_response());
    }

    let record = state.with_learner(&user_id, |learner| {
        learner.record_answer(&request.word_id, request.correct, Utc::now())
    })?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

/// GET /api/users/{user_id}/due?limit=N
pub async fn due_words(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> impl IntoResponse {
    let limit = query.or(config::DEFAULT_DUE_LIMIT);
    Json(state.tracker.review_queue(&user_id, Utc::now(), limit))
}

/// GET /api/users/{user_id}/words/{word_id}
pub async fn word_progress(
    State(state): State<AppState>,
    Path((user_id, word_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    match state.tracker.word_progress(&user_id, &word_id)? {
        Some(record) => Ok(Json(record).into_response()),
        None => Ok(not_found("Word progress")),
    }
}

/// GET /api/users/{user_id}/summary
pub async fn progress_summary(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    let summary = state.tracker.progress_summary(&user_id, Utc::now())?;
    let learned_percentage = summary.learned_percentage();
    Ok(Json(serde_json::json!({
        "summary": summary,
        "learned_percentage": learned_percentage,
    }))
    .into_response())
}
