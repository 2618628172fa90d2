//! HTML report rendering and short-lived link storage
//!
//! Rendered reports are held in process memory behind a UUID token with a
//! 15-minute TTL. Fetching an expired or unknown token fails with a "link
//! expired" error, never a stale report.

use crate::error::CoreError;
use handlebars::Handlebars;
use serde_json::json;
use speakscore_types::{
    default_standards, DualEvaluationResponse, StandardDefinition, StandardEvaluation,
    IELTS_STANDARD_ID, TOEFL_STANDARD_ID,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// How long a generated report link stays valid
pub const REPORT_LINK_TTL: Duration = Duration::from_secs(15 * 60);

const REPORT_TEMPLATE: &str = include_str!("templates/report.hbs");

/// A rendered report plus the token-scoped URL it is served from
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub token: String,
    pub report_url: String,
    pub html: String,
}

#[derive(Debug)]
struct StoredReport {
    html: String,
    created_at: Instant,
}

impl StoredReport {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Renders evaluation reports and serves them behind short-lived tokens
pub struct ReportService {
    handlebars: Handlebars<'static>,
    standards: Vec<StandardDefinition>,
    reports: Mutex<HashMap<String, StoredReport>>,
    ttl: Duration,
}

impl ReportService {
    pub fn new() -> Result<Self, CoreError> {
        Self::with_ttl(REPORT_LINK_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Result<Self, CoreError> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string("report", REPORT_TEMPLATE)
            .map_err(|e| CoreError::Render(e.to_string()))?;
        Ok(Self {
            handlebars,
            standards: default_standards(),
            reports: Mutex::new(HashMap::new()),
            ttl,
        })
    }

    /// Render the report and store it behind a fresh token
    pub async fn render_and_store(
        &self,
        evaluation: &DualEvaluationResponse,
        session_metadata: Option<&serde_json::Value>,
        base_url: &str,
        language: &str,
    ) -> Result<RenderedReport, CoreError> {
        let html = self.render(evaluation, session_metadata, language)?;
        let token = Uuid::new_v4().to_string();
        let report_url = format!("{}/api/reports/{token}", base_url.trim_end_matches('/'));

        let mut reports = self.reports.lock().await;
        let ttl = self.ttl;
        reports.retain(|_, report| !report.is_expired(ttl));
        reports.insert(
            token.clone(),
            StoredReport {
                html: html.clone(),
                created_at: Instant::now(),
            },
        );
        info!(token = %token, session_id = %evaluation.session_id, "Report stored");

        Ok(RenderedReport {
            token,
            report_url,
            html,
        })
    }

    /// Serve a stored report; expired and unknown tokens are both "expired"
    /// to the caller. Both store and fetch prune dead entries, so reports
    /// that are generated but never opened do not pile up.
    pub async fn fetch(&self, token: &str) -> Result<String, CoreError> {
        let mut reports = self.reports.lock().await;
        let ttl = self.ttl;
        reports.retain(|_, report| !report.is_expired(ttl));
        reports
            .get(token)
            .map(|r| r.html.clone())
            .ok_or(CoreError::LinkExpired)
    }

    /// Pure templating step
    pub fn render(
        &self,
        evaluation: &DualEvaluationResponse,
        session_metadata: Option<&serde_json::Value>,
        language: &str,
    ) -> Result<String, CoreError> {
        let context = self.build_context(evaluation, session_metadata, language);
        debug!(session_id = %evaluation.session_id, "Rendering report");
        self.handlebars
            .render("report", &context)
            .map_err(|e| CoreError::Render(e.to_string()))
    }

    fn build_context(
        &self,
        evaluation: &DualEvaluationResponse,
        session_metadata: Option<&serde_json::Value>,
        language: &str,
    ) -> serde_json::Value {
        let toefl = evaluation.standard(TOEFL_STANDARD_ID);
        let ielts = evaluation.standard(IELTS_STANDARD_ID);

        let badges = vec![
            badge_text(toefl, "TOEFL"),
            badge_text(ielts, "IELTS"),
            format!("Consensus CEFR: {}", evaluation.crosswalk.consensus_cefr),
        ];

        let standards: Vec<serde_json::Value> = evaluation
            .standards
            .iter()
            .map(|s| self.standard_context(s))
            .collect();

        let participant_line = participant_line(evaluation, session_metadata);
        let session_summary = session_metadata
            .and_then(|m| m.get("summary"))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        json!({
            "language": language,
            "badges": badges,
            "participant_line": participant_line,
            "session_summary": session_summary,
            "consensus_cefr": evaluation.crosswalk.consensus_cefr,
            "crosswalk_notes": evaluation.crosswalk.notes,
            "strengths_line": evaluation.crosswalk.strengths.join(", "),
            "focus_line": evaluation.crosswalk.focus.join(", "),
            "warnings": evaluation.warnings.clone().unwrap_or_default(),
            "standards": standards,
            "session_id": evaluation.session.id,
            "started_at": evaluation.session.started_at.to_rfc3339(),
            "ended_at": evaluation.session.ended_at.to_rfc3339(),
            "duration_sec": evaluation.session.duration_sec,
            "turns": evaluation.session.turns,
            "generated_display": format!(
                "{} (UTC)",
                evaluation.generated_at.format("%Y-%m-%d %H:%M:%S")
            ),
        })
    }

    fn standard_context(&self, standard: &StandardEvaluation) -> serde_json::Value {
        if !standard.is_ok() {
            return json!({
                "label": standard.label,
                "failed": true,
                "error": standard.error.as_deref().unwrap_or("Unknown error"),
            });
        }

        // Rows follow the rubric's criterion order, not map order.
        let definition = self.standards.iter().find(|d| d.id == standard.standard_id);
        let ordered_ids: Vec<&str> = match definition {
            Some(def) => def.criteria.iter().map(|c| c.id.as_str()).collect(),
            None => standard.criteria.keys().map(String::as_str).collect(),
        };
        let scale_max = definition.map(|d| d.scale.max);

        let criteria: Vec<serde_json::Value> = ordered_ids
            .iter()
            .filter_map(|id| standard.criteria.get(*id).map(|assessment| (id, assessment)))
            .map(|(id, assessment)| {
                let label = standard
                    .criterion_labels
                    .get(*id)
                    .cloned()
                    .unwrap_or_else(|| id.to_string());
                let score_display = match scale_max {
                    Some(max) => format!("{:.2} / {max}", assessment.score),
                    None => format!("{:.2}", assessment.score),
                };
                json!({
                    "label": label,
                    "score_display": score_display,
                    "comment": assessment.comment,
                })
            })
            .collect();

        json!({
            "label": standard.label,
            "failed": false,
            "overall_display": overall_display(standard),
            "cefr": standard.cefr.as_deref().unwrap_or("—"),
            "criteria": criteria,
            "common_errors": standard.common_errors,
            "recommendations": standard.recommendations,
            "evidence_quotes": standard.evidence_quotes,
        })
    }
}

fn overall_display(standard: &StandardEvaluation) -> String {
    match (standard.standard_id.as_str(), standard.overall) {
        (TOEFL_STANDARD_ID, Some(overall)) => format!("{overall:.2} / 4"),
        (IELTS_STANDARD_ID, Some(overall)) => format!("Band {overall:.1}"),
        (_, Some(overall)) => format!("{overall:.2}"),
        (_, None) => "—".to_string(),
    }
}

fn badge_text(standard: Option<&StandardEvaluation>, name: &str) -> String {
    match standard {
        Some(s) if s.is_ok() => {
            let cefr = s.cefr.as_deref().unwrap_or("—");
            match (s.standard_id.as_str(), s.overall) {
                (TOEFL_STANDARD_ID, Some(overall)) => format!("TOEFL {overall:.2}/4 (~{cefr})"),
                (IELTS_STANDARD_ID, Some(overall)) => format!("IELTS {overall:.1}/9 (~{cefr})"),
                (_, Some(overall)) => format!("{name} {overall:.2} (~{cefr})"),
                (_, None) => format!("{name} unavailable"),
            }
        }
        _ => format!("{name} unavailable"),
    }
}

/// Attribution sentence for the report header; prefers participant details
/// and a report timestamp passed in the session metadata.
fn participant_line(
    evaluation: &DualEvaluationResponse,
    session_metadata: Option<&serde_json::Value>,
) -> String {
    let participant = session_metadata.and_then(|m| m.get("participant"));
    let name = participant
        .and_then(|p| p.get("full_name"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let email = participant
        .and_then(|p| p.get("email"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let timestamp = session_metadata
        .and_then(|m| m.get("report_generated_at"))
        .and_then(|v| v.as_str())
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or(evaluation.generated_at);
    let formatted = timestamp.format("%d.%m.%Y %H:%M");

    match (name, email) {
        (Some(name), Some(email)) => format!(
            "This report belongs to the assessment completed by {name} ({email}) on {formatted} (UTC)."
        ),
        (Some(name), None) => {
            format!("This report belongs to the assessment completed by {name} on {formatted} (UTC).")
        }
        (None, Some(email)) => {
            format!("This report belongs to the assessment completed by {email} on {formatted} (UTC).")
        }
        (None, None) => format!("This report was generated on {formatted} (UTC)."),
    }
}
