//! End-to-end tests over a real listening server, no oracle key configured.

use chrono::Utc;
use speakscore_api::types::ApiState;
use speakscore_core::Settings;
use speakscore_types::{
    CrosswalkSummary, DualEvaluationResponse, EvaluationStatus, SessionInfo, StandardEvaluation,
};
use std::collections::BTreeMap;
use std::net::SocketAddr;

const TEST_TOKEN: &str = "test-secret";

/// Bind an ephemeral port, serve the router, return the base URL.
async fn spawn_server() -> String {
    let mut settings = Settings::from_env();
    settings.secret_token = TEST_TOKEN.to_string();
    settings.oracle.api_key = None;
    settings.app_base_url = "http://localhost:5173".to_string();
    settings.email.provider = "smtp".to_string();
    settings.email.smtp_host = None;
    settings.email.smtp_username = None;
    settings.email.smtp_password = None;

    let state = ApiState::new(settings).unwrap();
    let app = speakscore_api::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

fn authed(request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    request.bearer_auth(TEST_TOKEN)
}

fn sample_evaluation() -> DualEvaluationResponse {
    let mut toefl_criteria = BTreeMap::new();
    toefl_criteria.insert(
        "delivery".to_string(),
        speakscore_types::CriterionAssessment {
            score: 3.0,
            comment: "steady pacing".to_string(),
        },
    );
    let toefl = StandardEvaluation {
        standard_id: "toefl".to_string(),
        label: "TOEFL Speaking (0-4)".to_string(),
        overall: Some(3.2),
        cefr: Some("C1".to_string()),
        criteria: toefl_criteria,
        criterion_labels: BTreeMap::from([("delivery".to_string(), "Delivery".to_string())]),
        common_errors: vec![],
        recommendations: vec!["Practice linking words".to_string()],
        evidence_quotes: vec![],
        status: EvaluationStatus::Ok,
        error: None,
    };
    let now = Utc::now();
    DualEvaluationResponse {
        session: SessionInfo {
            id: "sess-test".to_string(),
            started_at: now,
            ended_at: now,
            duration_sec: 540,
            turns: 8,
        },
        standards: vec![toefl],
        crosswalk: CrosswalkSummary {
            consensus_cefr: "C1".to_string(),
            notes: "Only the TOEFL evaluation is available.".to_string(),
            strengths: vec![],
            focus: vec![],
        },
        warnings: None,
        session_id: "sess-test".to_string(),
        cefr_level: "C1".to_string(),
        generated_at: now,
    }
}

#[tokio::test]
async fn health_needs_no_token() {
    let base = spawn_server().await;
    let response = client().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn api_routes_reject_missing_token() {
    let base = spawn_server().await;
    let response = client()
        .post(format!("{base}/api/session/start"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let wrong = client()
        .post(format!("{base}/api/session/start"))
        .bearer_auth("wrong-token")
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);
}

#[tokio::test]
async fn scripted_interview_flow_start_chat_finish() {
    let base = spawn_server().await;
    let http = client();

    let start: serde_json::Value = authed(http.post(format!("{base}/api/session/start")))
        .json(&serde_json::json!({"mode": "text", "duration_minutes": 10}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = start["session_id"].as_str().unwrap().to_string();
    assert!(!start["assistant_greeting"].as_str().unwrap().is_empty());

    let chat: serde_json::Value = authed(http.post(format!("{base}/api/chat")))
        .json(&serde_json::json!({
            "session_id": session_id,
            "user_message": "I'm a nurse and I work in a large hospital."
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(chat["turns_completed"], 1);
    assert!(!chat["assistant_message"].as_str().unwrap().is_empty());

    let finish = authed(http.post(format!("{base}/api/session/finish")))
        .json(&serde_json::json!({"session_id": session_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(finish.status(), 200);
    let summary: serde_json::Value = finish.json().await.unwrap();
    assert_eq!(summary["word_count"], 10);

    // Finishing twice is a conflict
    let again = authed(http.post(format!("{base}/api/session/finish")))
        .json(&serde_json::json!({"session_id": session_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 409);
}

#[tokio::test]
async fn chat_with_unknown_session_is_404() {
    let base = spawn_server().await;
    let response = authed(client().post(format!("{base}/api/chat")))
        .json(&serde_json::json!({"session_id": "missing", "user_message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn evaluate_without_oracle_key_is_unavailable() {
    let base = spawn_server().await;
    let http = client();

    let start: serde_json::Value = authed(http.post(format!("{base}/api/session/start")))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = start["session_id"].as_str().unwrap();

    authed(http.post(format!("{base}/api/chat")))
        .json(&serde_json::json!({"session_id": session_id, "user_message": "Hello there"}))
        .send()
        .await
        .unwrap();

    let response = authed(http.post(format!("{base}/api/evaluate")))
        .json(&serde_json::json!({"session_id": session_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn evaluate_requires_session_or_transcript() {
    let base = spawn_server().await;
    let response = authed(client().post(format!("{base}/api/evaluate")))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn report_round_trip_and_expired_token() {
    let base = spawn_server().await;
    let http = client();

    let report: serde_json::Value = authed(http.post(format!("{base}/api/report")))
        .json(&serde_json::json!({"evaluation": sample_evaluation()}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let report_url = report["report_url"].as_str().unwrap();
    let token = report_url.rsplit('/').next().unwrap();

    // The report link carries its own credential; no bearer token needed.
    let page = http
        .get(format!("{base}/api/reports/{token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), 200);
    let html = page.text().await.unwrap();
    assert!(html.contains("English Speaking Assessment Report"));
    assert!(html.contains("Consensus CEFR: C1"));

    let gone = http
        .get(format!("{base}/api/reports/not-a-real-token"))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 410);
}

#[tokio::test]
async fn email_without_smtp_config_is_unavailable() {
    let base = spawn_server().await;
    let response = authed(client().post(format!("{base}/api/email")))
        .json(&serde_json::json!({
            "to": "learner@example.com",
            "subject": "Ada - Assessment",
            "body": "Your report is ready."
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn oracle_key_status_reflects_configuration() {
    let base = spawn_server().await;
    let status: serde_json::Value = authed(client().get(format!("{base}/api/config/oracle-key")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["configured"], false);
}

#[tokio::test]
async fn email_config_status_lists_missing_fields() {
    let base = spawn_server().await;
    let status: serde_json::Value = authed(client().get(format!("{base}/api/config/email")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["configured"], false);
    assert!(status["missing_fields"].as_array().unwrap().len() >= 1);
}
