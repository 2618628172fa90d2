//! Runtime configuration
//!
//! Settings load from environment variables (a `.env` file is read by the
//! binary via dotenvy before this runs). The oracle key and email settings
//! can be updated over the API at runtime; updates are written back to the
//! `.env` file so they survive a restart.

use crate::error::CoreError;
use speakscore_oracle::{OracleClient, DEFAULT_ORACLE_BASE_URL};
use speakscore_types::{EmailConfigUpdateRequest, EmailSettingsPublic};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub type SharedSettings = Arc<RwLock<Settings>>;

/// Oracle connection settings
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f64>,
}

impl OracleSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Build a client, or `None` when no key is configured
    pub fn client(&self) -> Option<OracleClient> {
        let api_key = self.api_key.as_deref().filter(|k| !k.is_empty())?;
        let mut builder = OracleClient::builder(api_key)
            .base_url(&self.base_url)
            .model(&self.model);
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        Some(builder.build())
    }
}

/// SMTP provider settings
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub provider: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub default_sender: Option<String>,
}

impl EmailSettings {
    /// Names of the settings the smtp provider still needs. Non-smtp
    /// providers are delegated wholesale, so nothing is required here.
    pub fn missing_fields(&self) -> Vec<String> {
        if !self.provider.eq_ignore_ascii_case("smtp") {
            return Vec::new();
        }
        let mut missing = Vec::new();
        if self.smtp_host.as_deref().unwrap_or("").is_empty() {
            missing.push("smtp_host".to_string());
        }
        if self.smtp_username.as_deref().unwrap_or("").is_empty() {
            missing.push("smtp_username".to_string());
        }
        if self.smtp_password.as_deref().unwrap_or("").is_empty() {
            missing.push("smtp_password".to_string());
        }
        if self.default_sender.as_deref().unwrap_or("").is_empty() {
            missing.push("default_sender".to_string());
        }
        if self.smtp_port == 0 {
            missing.push("smtp_port".to_string());
        }
        missing
    }

    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Credential-free view safe to return from the config endpoint
    pub fn public(&self) -> EmailSettingsPublic {
        EmailSettingsPublic {
            provider: self.provider.clone(),
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port,
            smtp_username: self.smtp_username.clone(),
            default_sender: self.default_sender.clone(),
        }
    }
}

/// Full application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_base_url: String,
    pub secret_token: String,
    pub report_language: String,
    pub target_email: Option<String>,
    pub oracle: OracleSettings,
    pub email: EmailSettings,
    /// File runtime updates are persisted into
    pub env_file: PathBuf,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl Settings {
    pub fn from_env() -> Self {
        let smtp_port = env_opt("SMTP_PORT")
            .and_then(|raw| match raw.parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => {
                    warn!("SMTP_PORT is not a valid port number, falling back to 587");
                    None
                }
            })
            .unwrap_or(587);
        let temperature = env_opt("ORACLE_TEMPERATURE").and_then(|raw| match raw.parse::<f64>() {
            Ok(t) => Some(t),
            Err(_) => {
                warn!("ORACLE_TEMPERATURE is not numeric, ignoring");
                None
            }
        });
        let target_email = env_opt("TARGET_EMAIL");

        Self {
            app_base_url: env_opt("APP_BASE_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            secret_token: env_opt("APP_SECRET_TOKEN").unwrap_or_else(|| "dev-secret".to_string()),
            report_language: env_opt("REPORT_LANGUAGE").unwrap_or_else(|| "en".to_string()),
            oracle: OracleSettings {
                api_key: env_opt("ORACLE_API_KEY"),
                base_url: env_opt("ORACLE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_ORACLE_BASE_URL.to_string()),
                model: env_opt("ORACLE_MODEL").unwrap_or_else(|| "gpt-5".to_string()),
                temperature,
            },
            email: EmailSettings {
                provider: env_opt("EMAIL_PROVIDER").unwrap_or_else(|| "smtp".to_string()),
                smtp_host: env_opt("SMTP_HOST"),
                smtp_port,
                smtp_username: env_opt("SMTP_USERNAME"),
                smtp_password: env_opt("SMTP_PASSWORD"),
                default_sender: env_opt("EMAIL_DEFAULT_SENDER").or_else(|| target_email.clone()),
            },
            target_email,
            env_file: PathBuf::from(env_opt("ENV_FILE").unwrap_or_else(|| ".env".to_string())),
        }
    }

    pub fn shared(self) -> SharedSettings {
        Arc::new(RwLock::new(self))
    }
}

/// Set the oracle API key at runtime and persist it
pub async fn set_oracle_key(settings: &SharedSettings, api_key: &str) -> Result<(), CoreError> {
    if api_key.trim().is_empty() {
        return Err(CoreError::InvalidRequest("api_key must not be empty".to_string()));
    }
    let mut guard = settings.write().await;
    guard.oracle.api_key = Some(api_key.to_string());
    persist_env_var(&guard.env_file, "ORACLE_API_KEY", api_key)?;
    info!("Oracle API key updated");
    Ok(())
}

/// Apply a partial email settings update and persist the touched fields
pub async fn update_email_settings(
    settings: &SharedSettings,
    patch: &EmailConfigUpdateRequest,
) -> Result<(), CoreError> {
    let mut guard = settings.write().await;
    let env_file = guard.env_file.clone();

    let mut persist = |key: &str, value: &str| persist_env_var(&env_file, key, value);

    if let Some(provider) = non_empty(&patch.provider) {
        guard.email.provider = provider.clone();
        persist("EMAIL_PROVIDER", &provider)?;
    }
    if let Some(host) = non_empty(&patch.smtp_host) {
        guard.email.smtp_host = Some(host.clone());
        persist("SMTP_HOST", &host)?;
    }
    if let Some(port) = patch.smtp_port {
        guard.email.smtp_port = port;
        persist("SMTP_PORT", &port.to_string())?;
    }
    if let Some(username) = non_empty(&patch.smtp_username) {
        guard.email.smtp_username = Some(username.clone());
        persist("SMTP_USERNAME", &username)?;
    }
    if let Some(password) = non_empty(&patch.smtp_password) {
        guard.email.smtp_password = Some(password.clone());
        persist("SMTP_PASSWORD", &password)?;
    }
    if let Some(sender) = non_empty(&patch.default_sender) {
        guard.email.default_sender = Some(sender.clone());
        persist("EMAIL_DEFAULT_SENDER", &sender)?;
    }
    if let Some(target) = non_empty(&patch.target_email) {
        guard.target_email = Some(target.clone());
        persist("TARGET_EMAIL", &target)?;
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Upsert `KEY=value` into the env file, keeping comments and unrelated
/// lines intact.
fn persist_env_var(path: &Path, key: &str, value: &str) -> Result<(), CoreError> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(CoreError::Config(err.to_string())),
    };

    let mut lines: Vec<String> = Vec::new();
    let mut updated = false;
    for line in existing.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            lines.push(line.to_string());
            continue;
        }
        let (current_key, _) = line.split_once('=').unwrap_or((line, ""));
        if current_key.trim() == key && !updated {
            lines.push(format!("{key}={value}"));
            updated = true;
        } else {
            lines.push(line.to_string());
        }
    }
    if !updated {
        lines.push(format!("{key}={value}"));
    }

    std::fs::write(path, lines.join("\n") + "\n").map_err(|e| CoreError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_settings() -> EmailSettings {
        EmailSettings {
            provider: "smtp".to_string(),
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_port: 587,
            smtp_username: Some("mailer".to_string()),
            smtp_password: Some("hunter2".to_string()),
            default_sender: Some("reports@example.com".to_string()),
        }
    }

    #[test]
    fn missing_fields_lists_each_gap() {
        let mut settings = smtp_settings();
        assert!(settings.is_configured());

        settings.smtp_host = None;
        settings.smtp_password = Some(String::new());
        let missing = settings.missing_fields();
        assert_eq!(missing, vec!["smtp_host", "smtp_password"]);
    }

    #[test]
    fn non_smtp_provider_requires_nothing() {
        let mut settings = smtp_settings();
        settings.provider = "sendgrid".to_string();
        settings.smtp_host = None;
        assert!(settings.missing_fields().is_empty());
    }

    #[test]
    fn public_view_drops_the_password() {
        let public = smtp_settings().public();
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("smtp.example.com"));
    }

    #[test]
    fn persist_env_var_upserts_and_preserves_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# comment\nSMTP_HOST=old.example.com\nOTHER=1\n").unwrap();

        persist_env_var(&path, "SMTP_HOST", "new.example.com").unwrap();
        persist_env_var(&path, "SMTP_PORT", "465").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# comment"));
        assert!(content.contains("SMTP_HOST=new.example.com"));
        assert!(!content.contains("old.example.com"));
        assert!(content.contains("OTHER=1"));
        assert!(content.contains("SMTP_PORT=465"));
    }

    #[tokio::test]
    async fn update_email_settings_applies_partial_patch() {
        let dir = tempfile::tempdir().unwrap();
        let mut base = Settings::from_env();
        base.env_file = dir.path().join(".env");
        base.email = smtp_settings();
        let shared = base.shared();

        let patch = EmailConfigUpdateRequest {
            smtp_host: Some("mail.corp.example".to_string()),
            smtp_port: Some(465),
            ..Default::default()
        };
        update_email_settings(&shared, &patch).await.unwrap();

        let guard = shared.read().await;
        assert_eq!(guard.email.smtp_host.as_deref(), Some("mail.corp.example"));
        assert_eq!(guard.email.smtp_port, 465);
        // untouched fields survive
        assert_eq!(guard.email.smtp_username.as_deref(), Some("mailer"));
    }
}
