//! JSON API consumed by the flashcard front end.
//!
//! Learners are identified by the `user_id` path segment.

pub mod progress;
pub mod sessions;
pub mod settings;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::error::{StoreError, StudyError};
use crate::state::AppState;

pub use progress::{due_words, progress_summary, record_answer, word_progress};
pub use sessions::{current_session, end_session, recent_sessions, start_session};
pub use settings::{get_profile, get_strategy, put_strategy};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users/{user_id}/answers", post(record_answer))
        .route("/api/users/{user_id}/due", get(due_words))
        .route("/api/users/{user_id}/words/{word_id}", get(word_progress))
        .route("/api/users/{user_id}/summary", get(progress_summary))
        .route(
            "/api/users/{user_id}/sessions",
            get(recent_sessions).post(start_session),
        )
        .route("/api/users/{user_id}/sessions/current", get(current_session))
        .route("/api/users/{user_id}/sessions/end", post(end_session))
        .route("/api/users/{user_id}/strategy", get(get_strategy).put(put_strategy))
        .route("/api/users/{user_id}/profile", get(get_profile))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `?limit=` query parameter
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    pub fn or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default)
    }
}

/// Error response with a JSON body
pub struct ApiError(StudyError);

impl From<StudyError> for ApiError {
    fn from(e: StudyError) -> Self {
        ApiError(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError(StudyError::Store(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StudyError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            StudyError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            StudyError::NoActiveSession => StatusCode::NOT_FOUND,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.0.user_message()
            })),
        )
            .into_response()
    }
}

pub fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": format!("{} not found", what)
        })),
    )
        .into_response()
}
