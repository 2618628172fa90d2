//! Wire types for the chat-completions API

use serde::{Deserialize, Serialize};
use speakscore_types::{Turn, TurnRole};

/// One message in a chat-completions request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        match turn.role {
            TurnRole::User => Self::user(&turn.text),
            TurnRole::Assistant => Self::assistant(&turn.text),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// First choice's content, or an error description of what was missing
    pub fn content(&self) -> Result<&str, &'static str> {
        self.choices
            .first()
            .ok_or("response contained no choices")?
            .message
            .content
            .as_deref()
            .ok_or("first choice had no message content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_conversion_preserves_roles() {
        let user = Turn::new(TurnRole::User, "hello");
        let assistant = Turn::new(TurnRole::Assistant, "hi");
        assert_eq!(ChatMessage::from(&user).role, "user");
        assert_eq!(ChatMessage::from(&assistant).role, "assistant");
    }

    #[test]
    fn completion_response_surfaces_missing_content() {
        let empty: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(empty.content().is_err());

        let ok: CompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "fine"}, "finish_reason": "stop"}]}"#,
        )
        .unwrap();
        assert_eq!(ok.content().unwrap(), "fine");
    }

    #[test]
    fn request_omits_unset_optional_fields() {
        let request = CompletionRequest {
            model: "gpt-5".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: None,
            response_format: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("response_format").is_none());
    }
}
