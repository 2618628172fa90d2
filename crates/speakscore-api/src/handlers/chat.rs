//! Interview chat handler

use crate::types::{error_response, ApiState};
use axum::extract::State;
use axum::response::{IntoResponse, Json};
use speakscore_types::ChatRequest;

/// One conversational exchange: the candidate's message in, the
/// interviewer's follow-up out.
pub async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    match state
        .dialogue
        .respond(&request.session_id, &request.user_message)
        .await
    {
        Ok(response) => Json(response).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
