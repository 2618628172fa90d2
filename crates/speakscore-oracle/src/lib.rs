//! HTTP client for the external scoring oracle
//!
//! The oracle is any chat-completions compatible API. It serves two roles:
//! generating interviewer follow-ups during the dialogue loop, and scoring a
//! finished transcript against one rubric per call.

pub mod client;
pub mod completion;
pub mod prompt;

pub use client::{OracleClient, OracleClientBuilder};
pub use completion::{ChatMessage, CompletionRequest, CompletionResponse};

use thiserror::Error;

/// Default base URL for chat-completions compatible APIs
pub const DEFAULT_ORACLE_BASE_URL: &str = "https://api.openai.com/v1";

/// Default sampling temperature for both chat and scoring calls
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to contact oracle API: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("oracle API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected oracle payload format: {0}")]
    MalformedPayload(String),
    #[error("oracle response was not valid JSON: {0}")]
    InvalidJson(String),
}
