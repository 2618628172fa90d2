//! Report generation and retrieval handlers

use crate::types::{error_response, ApiState};
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Json};
use speakscore_types::{ReportRequest, ReportResponse};

/// Render the HTML report and park it behind a short-lived link
pub async fn generate_report(
    State(state): State<ApiState>,
    Json(request): Json<ReportRequest>,
) -> impl IntoResponse {
    let (base_url, language) = {
        let guard = state.settings.read().await;
        (guard.app_base_url.clone(), guard.report_language.clone())
    };

    match state
        .reports
        .render_and_store(
            &request.evaluation,
            request.session_metadata.as_ref(),
            &base_url,
            &language,
        )
        .await
    {
        Ok(report) => Json(ReportResponse {
            report_url: report.report_url,
            html: report.html,
        })
        .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

/// Serve a stored report by token. The token is the only credential; this
/// route is outside the bearer guard so emailed links work in a browser.
pub async fn get_report(
    State(state): State<ApiState>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    match state.reports.fetch(&token).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
