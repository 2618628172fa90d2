use speakscore_oracle::OracleError;
use thiserror::Error;

/// Error taxonomy for the assessment pipeline. Each variant maps to one
/// HTTP-equivalent outcome; no variant is ever retried automatically.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("session {0} not found")]
    NotFound(String),
    #[error("session {0} is already finished")]
    AlreadyFinished(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("upstream model error: {0}")]
    UpstreamModel(String),
    #[error("evaluation unavailable: {0}")]
    EvaluationUnavailable(String),
    #[error("service is not configured: missing {}", .missing.join(", "))]
    Misconfigured { missing: Vec<String> },
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("report link expired")]
    LinkExpired,
    #[error("failed to render report: {0}")]
    Render(String),
    #[error("configuration update failed: {0}")]
    Config(String),
}

impl From<OracleError> for CoreError {
    fn from(err: OracleError) -> Self {
        CoreError::UpstreamModel(err.to_string())
    }
}
