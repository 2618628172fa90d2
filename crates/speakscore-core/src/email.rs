//! Email dispatcher
//!
//! Single synchronous SMTP attempt per request, no queue, no retry.
//! Configuration is validated before anything touches the network so a
//! misconfigured provider surfaces as "fix your settings" rather than
//! "provider is down".

use crate::error::CoreError;
use crate::settings::{EmailSettings, SharedSettings};
use base64::Engine;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use speakscore_types::{EmailReceipt, EmailRequest};
use tracing::{info, warn};
use uuid::Uuid;

/// Subject convention used by report emails
pub fn assessment_subject(name: &str) -> String {
    format!("{name} - Assessment")
}

#[derive(Clone)]
pub struct EmailDispatcher {
    settings: SharedSettings,
}

impl EmailDispatcher {
    pub fn new(settings: SharedSettings) -> Self {
        Self { settings }
    }

    /// Validate configuration, build the message, send it once.
    pub async fn send(&self, request: &EmailRequest) -> Result<EmailReceipt, CoreError> {
        let email = {
            let guard = self.settings.read().await;
            guard.email.clone()
        };

        if !email.provider.eq_ignore_ascii_case("smtp") {
            return Err(CoreError::Misconfigured {
                missing: vec![format!(
                    "supported email provider (got '{}')",
                    email.provider
                )],
            });
        }
        let missing = email.missing_fields();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Email send refused: configuration incomplete");
            return Err(CoreError::Misconfigured { missing });
        }

        let (message, message_id) = build_message(&email, request)?;

        // Unwraps are safe here: missing_fields() verified these above.
        let host = email.smtp_host.as_deref().unwrap_or_default();
        let username = email.smtp_username.clone().unwrap_or_default();
        let password = email.smtp_password.clone().unwrap_or_default();

        // Port 465 expects an implicit TLS wrapper; everything else STARTTLS.
        let relay = if email.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| CoreError::Delivery(e.to_string()))?;

        let mailer = relay
            .port(email.smtp_port)
            .credentials(Credentials::new(username, password))
            .build();

        mailer.send(message).await.map_err(|e| {
            warn!(error = %e, "SMTP send failed");
            CoreError::Delivery(e.to_string())
        })?;

        info!(to = %request.to, "Email sent");
        Ok(EmailReceipt {
            status: "sent".to_string(),
            message_id,
        })
    }
}

/// Assemble the MIME message: plain body, HTML alternative with report
/// links, and base64-decoded attachments. Pure, so it is testable without
/// a transport.
pub fn build_message(
    settings: &EmailSettings,
    request: &EmailRequest,
) -> Result<(Message, String), CoreError> {
    let sender: Mailbox = settings
        .default_sender
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| CoreError::Misconfigured {
            missing: vec!["default_sender".to_string()],
        })?;
    let recipient: Mailbox = request
        .to
        .parse()
        .map_err(|_| CoreError::InvalidRequest(format!("invalid recipient '{}'", request.to)))?;

    let host = settings.smtp_host.as_deref().unwrap_or("localhost");
    let message_id = format!("<{}@{}>", Uuid::new_v4(), host);

    let mut alternative = MultiPart::alternative().singlepart(SinglePart::plain(request.body.clone()));
    if let Some(links) = request.links.as_deref().filter(|l| !l.is_empty()) {
        let list_items: String = links
            .iter()
            .map(|link| format!("<li><a href=\"{link}\">{link}</a></li>"))
            .collect();
        let html_body = format!("<p>{}</p><ul>{list_items}</ul>", request.body);
        alternative = alternative.singlepart(SinglePart::html(html_body));
    }

    let mut mixed = MultiPart::mixed().multipart(alternative);
    if let Some(attachments) = &request.attachments {
        for attachment in attachments {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&attachment.data)
                .map_err(|_| {
                    CoreError::InvalidRequest(format!(
                        "invalid attachment provided: {}",
                        attachment.filename
                    ))
                })?;
            let content_type = ContentType::parse(&attachment.content_type)
                .unwrap_or(ContentType::TEXT_PLAIN);
            mixed = mixed.singlepart(
                Attachment::new(attachment.filename.clone()).body(bytes, content_type),
            );
        }
    }

    let message = Message::builder()
        .from(sender)
        .to(recipient)
        .subject(&request.subject)
        .message_id(Some(message_id.clone()))
        .multipart(mixed)
        .map_err(|e| CoreError::InvalidRequest(e.to_string()))?;

    Ok((message, message_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use speakscore_types::EmailAttachment;

    fn configured_email() -> EmailSettings {
        EmailSettings {
            provider: "smtp".to_string(),
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_port: 587,
            smtp_username: Some("mailer".to_string()),
            smtp_password: Some("hunter2".to_string()),
            default_sender: Some("reports@example.com".to_string()),
        }
    }

    fn request() -> EmailRequest {
        EmailRequest {
            to: "learner@example.com".to_string(),
            subject: assessment_subject("Ada Lovelace"),
            body: "Your assessment report is attached.".to_string(),
            attachments: None,
            links: None,
            session_id: None,
        }
    }

    #[test]
    fn subject_convention() {
        assert_eq!(assessment_subject("Ada"), "Ada - Assessment");
    }

    #[tokio::test]
    async fn missing_host_is_misconfigured_without_network() {
        let mut base = Settings::from_env();
        base.email = configured_email();
        base.email.smtp_host = None;
        let dispatcher = EmailDispatcher::new(base.shared());

        let err = dispatcher.send(&request()).await.unwrap_err();
        match err {
            CoreError::Misconfigured { missing } => {
                assert!(missing.contains(&"smtp_host".to_string()))
            }
            other => panic!("expected Misconfigured, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsupported_provider_is_misconfigured() {
        let mut base = Settings::from_env();
        base.email = configured_email();
        base.email.provider = "sendgrid".to_string();
        let dispatcher = EmailDispatcher::new(base.shared());

        let err = dispatcher.send(&request()).await.unwrap_err();
        assert!(matches!(err, CoreError::Misconfigured { .. }));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let err = build_message(
            &configured_email(),
            &EmailRequest {
                to: "not-an-address".to_string(),
                ..request()
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
    }

    #[test]
    fn invalid_base64_attachment_is_rejected() {
        let mut req = request();
        req.attachments = Some(vec![EmailAttachment {
            filename: "report.html".to_string(),
            content_type: "text/html".to_string(),
            data: "!!!not-base64!!!".to_string(),
        }]);

        let err = build_message(&configured_email(), &req).unwrap_err();
        match err {
            CoreError::InvalidRequest(message) => assert!(message.contains("report.html")),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn message_builds_with_links_and_attachments() {
        let mut req = request();
        req.links = Some(vec!["http://localhost:5173/api/reports/abc".to_string()]);
        req.attachments = Some(vec![EmailAttachment {
            filename: "report.html".to_string(),
            content_type: "text/html".to_string(),
            data: base64::engine::general_purpose::STANDARD.encode("<html></html>"),
        }]);

        let (message, message_id) = build_message(&configured_email(), &req).unwrap();
        assert!(message_id.starts_with('<'));
        assert!(message_id.contains("smtp.example.com"));

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Ada Lovelace - Assessment"));
        assert!(raw.contains("report.html"));
    }
}
