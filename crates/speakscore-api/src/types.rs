use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use speakscore_core::{
    CoreError, DialogueDriver, EmailDispatcher, Evaluator, InMemorySessionStore, ReportService,
    SessionService, Settings, SharedSettings,
};
use std::sync::Arc;

/// API state: every service shares the settings handle and the session
/// store, wired once at startup.
#[derive(Clone)]
pub struct ApiState {
    pub sessions: SessionService,
    pub dialogue: DialogueDriver,
    pub evaluator: Evaluator,
    pub reports: Arc<ReportService>,
    pub mailer: EmailDispatcher,
    pub settings: SharedSettings,
}

impl ApiState {
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        let settings = settings.shared();
        let sessions = SessionService::new(InMemorySessionStore::shared());
        Ok(Self {
            dialogue: DialogueDriver::new(sessions.clone(), settings.clone()),
            evaluator: Evaluator::new(settings.clone()),
            reports: Arc::new(ReportService::new()?),
            mailer: EmailDispatcher::new(settings.clone()),
            sessions,
            settings,
        })
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
}

/// Error response type
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

/// Map a core error onto its HTTP-equivalent status
pub fn error_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::AlreadyFinished(_) => StatusCode::CONFLICT,
        CoreError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        CoreError::UpstreamModel(_) | CoreError::Delivery(_) => StatusCode::BAD_GATEWAY,
        CoreError::EvaluationUnavailable(_) | CoreError::Misconfigured { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        CoreError::LinkExpired => StatusCode::GONE,
        CoreError::Render(_) | CoreError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body in the shared { error, message, timestamp } shape
pub fn error_response(err: &CoreError) -> (StatusCode, Json<ErrorResponse>) {
    let status = error_status(err);
    let response = ErrorResponse {
        error: status.as_str().to_string(),
        message: err.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    (status, Json(response))
}
