//! Oracle API client implementation

use crate::completion::{ChatMessage, CompletionRequest, CompletionResponse, ResponseFormat};
use crate::{OracleError, DEFAULT_ORACLE_BASE_URL, DEFAULT_TEMPERATURE};
use tracing::debug;

/// Oracle client builder
pub struct OracleClientBuilder<'a> {
    api_key: &'a str,
    base_url: Option<&'a str>,
    model: Option<&'a str>,
    temperature: Option<f64>,
    http_client: reqwest::Client,
}

impl<'a> OracleClientBuilder<'a> {
    pub fn new(api_key: &'a str) -> Self {
        Self {
            api_key,
            base_url: None,
            model: None,
            temperature: None,
            http_client: reqwest::Client::new(),
        }
    }

    /// Point the client at a non-default chat-completions endpoint
    pub fn base_url(mut self, base_url: &'a str) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn model(mut self, model: &'a str) -> Self {
        self.model = Some(model);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn custom_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    pub fn build(self) -> OracleClient {
        OracleClient {
            base_url: self
                .base_url
                .unwrap_or(DEFAULT_ORACLE_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: self.api_key.to_string(),
            model: self.model.unwrap_or("gpt-5").to_string(),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            http_client: self.http_client,
        }
    }
}

/// Client for a chat-completions compatible scoring oracle
#[derive(Clone)]
pub struct OracleClient {
    pub base_url: String,
    api_key: String,
    pub model: String,
    pub temperature: f64,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OracleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"***")
            .finish()
    }
}

impl OracleClient {
    pub fn builder(api_key: &str) -> OracleClientBuilder<'_> {
        OracleClientBuilder::new(api_key)
    }

    /// Free-form dialogue completion: returns the assistant's reply text.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, OracleError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            response_format: None,
        };
        let response = self.post_completion(&request).await?;
        response
            .content()
            .map(str::to_string)
            .map_err(|e| OracleError::MalformedPayload(e.to_string()))
    }

    /// Scoring completion: forces JSON output and parses the content.
    pub async fn score(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<serde_json::Value, OracleError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            response_format: Some(ResponseFormat::json_object()),
        };
        let response = self.post_completion(&request).await?;
        let content = response
            .content()
            .map_err(|e| OracleError::MalformedPayload(e.to_string()))?;

        let parsed: serde_json::Value =
            serde_json::from_str(content).map_err(|e| OracleError::InvalidJson(e.to_string()))?;
        if !parsed.is_object() {
            return Err(OracleError::InvalidJson(
                "oracle response must be a JSON object".to_string(),
            ));
        }
        Ok(parsed)
    }

    async fn post_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, url = %url, "Sending oracle completion request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(OracleError::Api { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::MalformedPayload(e.to_string()))
    }
}
