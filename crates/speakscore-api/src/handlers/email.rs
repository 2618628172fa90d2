//! Email delivery handler

use crate::types::{error_response, ApiState};
use axum::extract::State;
use axum::response::{IntoResponse, Json};
use speakscore_types::EmailRequest;

/// Send a report email through the configured SMTP provider
pub async fn send_email(
    State(state): State<ApiState>,
    Json(request): Json<EmailRequest>,
) -> impl IntoResponse {
    match state.mailer.send(&request).await {
        Ok(receipt) => Json(receipt).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
