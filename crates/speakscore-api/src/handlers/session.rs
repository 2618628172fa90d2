//! Session lifecycle handlers

use crate::types::{error_response, ApiState};
use axum::extract::State;
use axum::response::{IntoResponse, Json};
use speakscore_types::{
    SessionFinishRequest, SessionFinishResponse, SessionStartRequest, SessionStartResponse,
};
use tracing::info;

/// Start a new interview session
pub async fn start_session(
    State(state): State<ApiState>,
    Json(request): Json<SessionStartRequest>,
) -> Json<SessionStartResponse> {
    let session = state
        .sessions
        .start(request.mode, request.duration_minutes, request.participant)
        .await;

    let assistant_greeting = session
        .turns
        .first()
        .map(|t| t.text.clone())
        .unwrap_or_default();

    Json(SessionStartResponse {
        session_id: session.id,
        started_at: session.started_at,
        assistant_greeting,
        mode: session.mode,
    })
}

/// Finish a session and return its summary
pub async fn finish_session(
    State(state): State<ApiState>,
    Json(request): Json<SessionFinishRequest>,
) -> impl IntoResponse {
    match state.sessions.finish(&request.session_id).await {
        Ok(summary) => {
            info!(session_id = %summary.session_id, "Session finish requested");
            Json(SessionFinishResponse {
                session_id: summary.session_id,
                summary: summary.summary,
                word_count: summary.word_count,
                duration_seconds: summary.duration_seconds,
            })
            .into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}
