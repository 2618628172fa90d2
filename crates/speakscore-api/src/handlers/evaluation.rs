//! Dual-standard evaluation handler

use crate::types::{error_response, ApiState};
use axum::extract::State;
use axum::response::{IntoResponse, Json};
use chrono::Utc;
use speakscore_core::CoreError;
use speakscore_types::{DualEvaluationResponse, EvaluationRequest, SessionInfo};
use tracing::info;
use uuid::Uuid;

/// Score a transcript against both standards. The input is either a stored
/// session id or an inline transcript with optional metadata.
pub async fn evaluate(
    State(state): State<ApiState>,
    Json(request): Json<EvaluationRequest>,
) -> impl IntoResponse {
    match run_evaluation(&state, request).await {
        Ok(response) => {
            info!(session_id = %response.session_id, cefr = %response.cefr_level, "Evaluation complete");
            Json(response).into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}

async fn run_evaluation(
    state: &ApiState,
    request: EvaluationRequest,
) -> Result<DualEvaluationResponse, CoreError> {
    if let Some(session_id) = request.session_id.as_deref() {
        let session = state.sessions.get(session_id).await?;
        return state.evaluator.evaluate_session(&session).await;
    }

    let transcript = request.transcript.unwrap_or_default();
    if transcript.is_empty() {
        return Err(CoreError::InvalidRequest(
            "either session_id or a non-empty transcript is required".to_string(),
        ));
    }

    let metadata = request.metadata.unwrap_or_default();
    let now = Utc::now();
    let info = SessionInfo {
        id: format!("transcript-{}", Uuid::new_v4()),
        started_at: metadata.started_at.unwrap_or(now),
        ended_at: metadata.ended_at.unwrap_or(now),
        duration_sec: metadata.duration_sec.unwrap_or(0),
        turns: metadata.turns.unwrap_or(transcript.len() as u32 / 2),
    };
    state
        .evaluator
        .evaluate_transcript(&transcript, info, metadata)
        .await
}
