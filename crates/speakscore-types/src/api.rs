//! Request and response payloads for the HTTP interface

use crate::{
    DualEvaluationResponse, InteractionMode, Participant, Turn,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_duration_minutes() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStartRequest {
    #[serde(default)]
    pub mode: InteractionMode,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub participant: Option<Participant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStartResponse {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub assistant_greeting: String,
    pub mode: InteractionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub user_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub assistant_message: String,
    pub turns_completed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFinishRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFinishResponse {
    pub session_id: String,
    pub summary: String,
    pub word_count: usize,
    pub duration_seconds: i64,
}

/// Transcript-level metadata the client may attach when evaluating an
/// inline transcript instead of a stored session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub duration_sec: Option<i64>,
    #[serde(default)]
    pub turns: Option<u32>,
    #[serde(default)]
    pub word_count: Option<usize>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Evaluation input: a stored session id, or an inline transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript: Option<Vec<Turn>>,
    #[serde(default)]
    pub metadata: Option<TranscriptMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub evaluation: DualEvaluationResponse,
    #[serde(default)]
    pub session_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub report_url: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    /// Base64-encoded file bytes
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub attachments: Option<Vec<EmailAttachment>>,
    #[serde(default)]
    pub links: Option<Vec<String>>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub status: String,
    pub message_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleKeyStatus {
    pub configured: bool,
}

/// Email settings with credentials stripped, safe to echo to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettingsPublic {
    pub provider: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub default_sender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfigStatus {
    pub configured: bool,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    pub settings: EmailSettingsPublic,
    pub target_email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfigUpdateRequest {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default)]
    pub default_sender: Option<String>,
    #[serde(default)]
    pub target_email: Option<String>,
}
