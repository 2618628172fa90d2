//! Dual-standard transcript evaluator
//!
//! For each configured standard the oracle is called once with that
//! standard's rubric embedded; its JSON reply is decoded and validated
//! without coercion. A standard that fails to parse or validate keeps its
//! slot in the response as `failed` with a warning; the evaluation as a
//! whole only errors when every standard failed.

use crate::crosswalk::{reconcile, CrosswalkPolicy};
use crate::error::CoreError;
use crate::settings::SharedSettings;
use chrono::Utc;
use serde::Deserialize;
use speakscore_oracle::prompt::evaluation_messages;
use speakscore_oracle::OracleClient;
use speakscore_types::{
    default_standards, CommonError, CriterionAssessment, DualEvaluationResponse,
    EvaluationStatus, Session, SessionInfo, StandardDefinition, StandardEvaluation,
    TranscriptMetadata, Turn,
};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Shape the oracle must return for one standard's scoring call
#[derive(Debug, Deserialize)]
pub struct ParsedEvaluation {
    pub criteria: BTreeMap<String, CriterionAssessment>,
    #[serde(default)]
    pub common_errors: Vec<CommonError>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub evidence_quotes: Vec<String>,
}

#[derive(Clone)]
pub struct Evaluator {
    settings: SharedSettings,
    standards: Vec<StandardDefinition>,
    policy: CrosswalkPolicy,
}

impl Evaluator {
    pub fn new(settings: SharedSettings) -> Self {
        Self {
            settings,
            standards: default_standards(),
            policy: CrosswalkPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CrosswalkPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Evaluate a stored session's transcript
    pub async fn evaluate_session(
        &self,
        session: &Session,
    ) -> Result<DualEvaluationResponse, CoreError> {
        let info = SessionInfo {
            id: session.id.clone(),
            started_at: session.started_at,
            ended_at: session.ended_at.unwrap_or_else(Utc::now),
            duration_sec: session.duration_seconds(),
            turns: session.turns_completed,
        };
        let metadata = TranscriptMetadata {
            lang: None,
            duration_sec: Some(info.duration_sec),
            turns: Some(info.turns),
            word_count: Some(session.word_count()),
            started_at: Some(info.started_at),
            ended_at: Some(info.ended_at),
        };
        self.evaluate_transcript(&session.turns, info, metadata).await
    }

    /// Evaluate an inline transcript (no stored session)
    pub async fn evaluate_transcript(
        &self,
        transcript: &[Turn],
        info: SessionInfo,
        metadata: TranscriptMetadata,
    ) -> Result<DualEvaluationResponse, CoreError> {
        if transcript.is_empty() {
            return Err(CoreError::InvalidRequest(
                "transcript must contain at least one turn".to_string(),
            ));
        }

        let client = {
            let guard = self.settings.read().await;
            guard.oracle.client()
        }
        .ok_or_else(|| {
            CoreError::EvaluationUnavailable("oracle API key is not configured".to_string())
        })?;

        let mut standards = Vec::with_capacity(self.standards.len());
        let mut warnings = Vec::new();

        for standard in &self.standards {
            match self
                .score_standard(&client, standard, transcript, &metadata)
                .await
            {
                Ok(evaluation) => {
                    info!(
                        standard = %standard.id,
                        overall = ?evaluation.overall,
                        cefr = ?evaluation.cefr,
                        "Standard evaluation complete"
                    );
                    standards.push(evaluation);
                }
                Err(message) => {
                    warn!(standard = %standard.id, error = %message, "Standard evaluation failed");
                    warnings.push(format!("{} evaluation failed: {message}", standard.label));
                    standards.push(StandardEvaluation::failed(
                        &standard.id,
                        &standard.label,
                        message,
                    ));
                }
            }
        }

        if standards.iter().all(|s| !s.is_ok()) {
            return Err(CoreError::EvaluationUnavailable(warnings.join("; ")));
        }

        let crosswalk = reconcile(&standards, &self.standards, &self.policy);
        let cefr_level = crosswalk.consensus_cefr.clone();
        let session_id = info.id.clone();

        Ok(DualEvaluationResponse {
            session: info,
            standards,
            crosswalk,
            warnings: if warnings.is_empty() {
                None
            } else {
                Some(warnings)
            },
            session_id,
            cefr_level,
            generated_at: Utc::now(),
        })
    }

    /// One oracle round trip for one standard. The error branch carries the
    /// raw message into the failed entry; nothing is coerced.
    async fn score_standard(
        &self,
        client: &OracleClient,
        standard: &StandardDefinition,
        transcript: &[Turn],
        metadata: &TranscriptMetadata,
    ) -> Result<StandardEvaluation, String> {
        let messages = evaluation_messages(standard, transcript, metadata);
        let value = client.score(messages).await.map_err(|e| e.to_string())?;
        let parsed = parse_standard_response(standard, value)?;
        Ok(build_standard_evaluation(standard, parsed))
    }
}

/// Decode and validate one standard's oracle reply: every configured
/// criterion must be present and every score inside the scale bounds.
pub fn parse_standard_response(
    standard: &StandardDefinition,
    value: serde_json::Value,
) -> Result<ParsedEvaluation, String> {
    let parsed: ParsedEvaluation =
        serde_json::from_value(value).map_err(|e| format!("invalid evaluation payload: {e}"))?;

    for criterion in &standard.criteria {
        let assessment = parsed
            .criteria
            .get(&criterion.id)
            .ok_or_else(|| format!("missing criterion '{}'", criterion.id))?;
        if !standard.scale.contains(assessment.score) {
            return Err(format!(
                "score {} for criterion '{}' is outside [{}, {}]",
                assessment.score, criterion.id, standard.scale.min, standard.scale.max
            ));
        }
    }
    Ok(parsed)
}

/// Weighted overall over the configured criteria; weights are normalized by
/// their sum and need not add up to 1.
pub fn weighted_overall(
    standard: &StandardDefinition,
    criteria: &BTreeMap<String, CriterionAssessment>,
) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for criterion in &standard.criteria {
        if let Some(assessment) = criteria.get(&criterion.id) {
            weighted_sum += assessment.score * criterion.weight;
            weight_total += criterion.weight;
        }
    }
    if weight_total == 0.0 {
        return standard.scale.min;
    }
    weighted_sum / weight_total
}

/// Assemble the immutable per-standard result from a validated parse
pub fn build_standard_evaluation(
    standard: &StandardDefinition,
    parsed: ParsedEvaluation,
) -> StandardEvaluation {
    // Keep only configured criteria; extras the model invented are dropped.
    let criteria: BTreeMap<String, CriterionAssessment> = parsed
        .criteria
        .into_iter()
        .filter(|(id, _)| standard.criterion(id).is_some())
        .collect();
    let criterion_labels: BTreeMap<String, String> = standard
        .criteria
        .iter()
        .map(|c| (c.id.clone(), c.label.clone()))
        .collect();

    let overall = weighted_overall(standard, &criteria);
    let cefr = standard.cefr_for(overall);

    StandardEvaluation {
        standard_id: standard.id.clone(),
        label: standard.label.clone(),
        overall: Some(overall),
        cefr: Some(cefr),
        criteria,
        criterion_labels,
        common_errors: parsed.common_errors,
        recommendations: parsed.recommendations,
        evidence_quotes: parsed.evidence_quotes,
        status: EvaluationStatus::Ok,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use serde_json::json;
    use speakscore_types::{ielts_standard, toefl_standard, TurnRole};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn toefl_payload(scores: [f64; 4]) -> serde_json::Value {
        json!({
            "criteria": {
                "delivery": {"score": scores[0], "comment": "steady pacing"},
                "language_use": {"score": scores[1], "comment": "varied structures"},
                "topic_dev": {"score": scores[2], "comment": "concrete examples"},
                "task": {"score": scores[3], "comment": "fully on prompt"}
            },
            "common_errors": [
                {"issue": "subject-verb agreement", "example": "he go", "fix": "use 'he goes'"}
            ],
            "recommendations": ["Practice linking words to improve fluency"],
            "evidence_quotes": ["I solved a big problem at work"]
        })
    }

    #[test]
    fn weighted_overall_stays_within_scale_bounds() {
        let toefl = toefl_standard();
        for scores in [
            [0.0, 0.0, 0.0, 0.0],
            [4.0, 4.0, 4.0, 4.0],
            [1.0, 3.5, 2.0, 0.5],
            [3.9, 0.1, 2.2, 4.0],
        ] {
            let parsed = parse_standard_response(&toefl, toefl_payload(scores)).unwrap();
            let overall = weighted_overall(&toefl, &parsed.criteria);
            assert!(
                toefl.scale.contains(overall),
                "overall {overall} escaped scale for {scores:?}"
            );
        }
    }

    #[test]
    fn weighted_overall_respects_weights() {
        let toefl = toefl_standard();
        let parsed = parse_standard_response(&toefl, toefl_payload([3.0, 3.4, 3.1, 3.2])).unwrap();
        let overall = weighted_overall(&toefl, &parsed.criteria);
        // weights 0.25/0.35/0.25/0.15 over these scores
        let expected = (3.0 * 0.25 + 3.4 * 0.35 + 3.1 * 0.25 + 3.2 * 0.15) / 1.0;
        assert!((overall - expected).abs() < 1e-9);
    }

    #[test]
    fn missing_criterion_fails_validation() {
        let toefl = toefl_standard();
        let mut payload = toefl_payload([3.0, 3.0, 3.0, 3.0]);
        payload["criteria"].as_object_mut().unwrap().remove("task");

        let err = parse_standard_response(&toefl, payload).unwrap_err();
        assert!(err.contains("missing criterion 'task'"));
    }

    #[test]
    fn out_of_range_score_fails_validation() {
        let toefl = toefl_standard();
        let err = parse_standard_response(&toefl, toefl_payload([4.5, 3.0, 3.0, 3.0])).unwrap_err();
        assert!(err.contains("outside"));
    }

    #[test]
    fn build_maps_overall_into_cefr_band() {
        let ielts = ielts_standard();
        let payload = json!({
            "criteria": {
                "fluency_coherence": {"score": 6.5, "comment": "good flow"},
                "lexical": {"score": 6.0, "comment": "adequate range"},
                "grammar": {"score": 6.5, "comment": "mostly accurate"},
                "pron": {"score": 6.5, "comment": "clear"}
            }
        });
        let parsed = parse_standard_response(&ielts, payload).unwrap();
        let evaluation = build_standard_evaluation(&ielts, parsed);

        let overall = evaluation.overall.unwrap();
        assert!((overall - 6.375).abs() < 1e-9);
        assert_eq!(evaluation.cefr.as_deref(), Some("B2"));
        assert_eq!(evaluation.status, EvaluationStatus::Ok);
        assert_eq!(evaluation.criterion_labels.len(), 4);
    }

    /// Chat-completions stub that serves the canned replies in order,
    /// repeating the last one. Lets the evaluator run its real per-standard
    /// loop over HTTP without a live model.
    async fn spawn_oracle_stub(replies: Vec<serde_json::Value>) -> String {
        use axum::extract::State;
        use axum::response::Json;
        use axum::routing::post;
        use axum::Router;

        #[derive(Clone)]
        struct Stub {
            replies: Arc<Vec<serde_json::Value>>,
            calls: Arc<AtomicUsize>,
        }

        async fn completions(State(stub): State<Stub>) -> Json<serde_json::Value> {
            let index = stub
                .calls
                .fetch_add(1, Ordering::SeqCst)
                .min(stub.replies.len() - 1);
            Json(stub.replies[index].clone())
        }

        let stub = Stub {
            replies: Arc::new(replies),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let app = Router::new()
            .route("/chat/completions", post(completions))
            .with_state(stub);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn reply_with(content: &str) -> serde_json::Value {
        json!({
            "choices": [
                {"message": {"content": content}, "finish_reason": "stop"}
            ]
        })
    }

    fn stub_evaluator(base_url: String) -> Evaluator {
        let mut settings = Settings::from_env();
        settings.oracle.api_key = Some("test-key".to_string());
        settings.oracle.base_url = base_url;
        Evaluator::new(settings.shared())
    }

    fn one_turn_transcript() -> (Vec<Turn>, SessionInfo) {
        let transcript = vec![Turn::new(TurnRole::User, "I manage a small support team.")];
        let now = Utc::now();
        let info = SessionInfo {
            id: "sess-stub".to_string(),
            started_at: now,
            ended_at: now,
            duration_sec: 300,
            turns: 1,
        };
        (transcript, info)
    }

    #[tokio::test]
    async fn one_failed_standard_keeps_its_slot_with_a_warning() {
        // First call (toefl) scores cleanly; second call (ielts) returns
        // prose instead of JSON, so that standard fails validation.
        let base = spawn_oracle_stub(vec![
            reply_with(&toefl_payload([3.0, 3.0, 3.0, 3.0]).to_string()),
            reply_with("the rater is temporarily unavailable"),
        ])
        .await;
        let evaluator = stub_evaluator(base);

        let (transcript, info) = one_turn_transcript();
        let response = evaluator
            .evaluate_transcript(&transcript, info, TranscriptMetadata::default())
            .await
            .unwrap();

        assert_eq!(response.standards.len(), 2);
        assert!(response.standards[0].is_ok());
        assert_eq!(response.standards[0].standard_id, "toefl");

        let failed = &response.standards[1];
        assert_eq!(failed.standard_id, "ielts");
        assert!(!failed.is_ok());
        assert!(failed.overall.is_none());
        assert!(failed.error.is_some());

        let warnings = response.warnings.expect("warnings must be present");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("IELTS"));

        // Consensus falls back to the surviving standard's band.
        assert_eq!(response.cefr_level, "B2");
    }

    #[tokio::test]
    async fn evaluation_errors_only_when_every_standard_fails() {
        let base = spawn_oracle_stub(vec![reply_with("not a scoring payload")]).await;
        let evaluator = stub_evaluator(base);

        let (transcript, info) = one_turn_transcript();
        let err = evaluator
            .evaluate_transcript(&transcript, info, TranscriptMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::CoreError::EvaluationUnavailable(_)));
    }

    #[test]
    fn invented_extra_criteria_are_dropped() {
        let toefl = toefl_standard();
        let mut payload = toefl_payload([3.0, 3.0, 3.0, 3.0]);
        payload["criteria"]["fluency"] = json!({"score": 9.0, "comment": "not in rubric"});

        let parsed = parse_standard_response(&toefl, payload).unwrap();
        let evaluation = build_standard_evaluation(&toefl, parsed);
        assert!(!evaluation.criteria.contains_key("fluency"));
        assert!(toefl.scale.contains(evaluation.overall.unwrap()));
    }
}
