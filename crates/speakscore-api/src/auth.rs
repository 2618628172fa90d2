//! Bearer-token guard for the API routes
//!
//! Every `/api/*` route except the tokenized report link requires the
//! shared secret. The report link is its own credential.

use crate::types::{ApiState, ErrorResponse};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use tracing::warn;

pub async fn require_bearer(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = {
        let guard = state.settings.read().await;
        guard.secret_token.clone()
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => next.run(request).await,
        _ => {
            warn!(path = %request.uri().path(), "Rejected request with missing or bad token");
            let body = ErrorResponse {
                error: StatusCode::UNAUTHORIZED.as_str().to_string(),
                message: "missing or invalid bearer token".to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            };
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }
}
