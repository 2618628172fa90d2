//! HTTP interface for the speakscore assessment service

pub mod auth;
pub mod handlers;
pub mod types;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use types::ApiState;

/// Create API router with all endpoints
pub fn create_router(state: ApiState) -> Router {
    // Everything under the bearer guard except the health probe and the
    // tokenized report link.
    let protected = Router::new()
        .route("/api/session/start", post(handlers::start_session))
        .route("/api/chat", post(handlers::chat))
        .route("/api/session/finish", post(handlers::finish_session))
        .route("/api/evaluate", post(handlers::evaluate))
        .route("/api/report", post(handlers::generate_report))
        .route("/api/email", post(handlers::send_email))
        .route(
            "/api/config/oracle-key",
            post(handlers::set_oracle_key).get(handlers::oracle_key_status),
        )
        .route(
            "/api/config/email",
            post(handlers::update_email_config).get(handlers::email_config_status),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/reports/{token}", get(handlers::get_report))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
