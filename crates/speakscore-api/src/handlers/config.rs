//! Runtime configuration handlers
//!
//! Updates go through the shared settings handle and are persisted to the
//! env file, so they apply immediately and survive a restart.

use crate::types::{error_response, ApiState};
use axum::extract::State;
use axum::response::{IntoResponse, Json};
use speakscore_core::settings;
use speakscore_types::{
    EmailConfigStatus, EmailConfigUpdateRequest, OracleKeyRequest, OracleKeyStatus,
};

/// Set the oracle API key at runtime
pub async fn set_oracle_key(
    State(state): State<ApiState>,
    Json(request): Json<OracleKeyRequest>,
) -> impl IntoResponse {
    match settings::set_oracle_key(&state.settings, &request.api_key).await {
        Ok(()) => Json(OracleKeyStatus { configured: true }).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

/// Report whether an oracle key is configured, never the key itself
pub async fn oracle_key_status(State(state): State<ApiState>) -> Json<OracleKeyStatus> {
    let guard = state.settings.read().await;
    Json(OracleKeyStatus {
        configured: guard.oracle.is_configured(),
    })
}

/// Apply a partial email settings update and echo the resulting status
pub async fn update_email_config(
    State(state): State<ApiState>,
    Json(request): Json<EmailConfigUpdateRequest>,
) -> impl IntoResponse {
    match settings::update_email_settings(&state.settings, &request).await {
        Ok(()) => email_config_status(State(state)).await.into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

/// Current email configuration with credentials stripped
pub async fn email_config_status(State(state): State<ApiState>) -> Json<EmailConfigStatus> {
    let guard = state.settings.read().await;
    Json(EmailConfigStatus {
        configured: guard.email.is_configured(),
        missing_fields: guard.email.missing_fields(),
        settings: guard.email.public(),
        target_email: guard.target_email.clone(),
    })
}
