use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::{ApiError, LimitQuery};
use crate::config;
use crate::domain::SessionType;
use crate::error::StudyError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub session_type: SessionType,
}

/// Start a session, replacing any session the learner left running.
///
/// POST /api/users/{user_id}/sessions
pub async fn start_session(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Response, ApiError> {
    let session_id = state.with_learner(&user_id, |learner| {
        learner.start_session(request.session_type, Utc::now())
    })?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "session_id": session_id })),
    )
        .into_response())
}

/// GET /api/users/{user_id}/sessions/current
pub async fn current_session(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    let stats = state
        .learners
        .with_existing(&user_id, |learner| learner.session_stats())
        .unwrap_or(Err(StudyError::NoActiveSession))?;
    Ok(Json(stats).into_response())
}

/// Close the running session. Returns the closed record, or null when idle.
///
/// POST /api/users/{user_id}/sessions/end
pub async fn end_session(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    let closed = state
        .learners
        .with_existing(&user_id, |learner| learner.end_session(Utc::now()))
        .unwrap_or(Ok(None))?;
    Ok(Json(closed).into_response())
}

/// GET /api/users/{user_id}/sessions?limit=N
pub async fn recent_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Response, ApiError> {
    let limit = query.or(config::DEFAULT_SESSIONS_LIMIT);
    let sessions = state.sessions.list_by_user(&user_id, limit)?;
    Ok(Json(serde_json::json!({ "sessions": sessions })).into_response())
}
