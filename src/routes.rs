//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod auth;
mod changes;
mod planeswalkers;
mod set_changes;
mod submissions;

use crate::auth::auth_middleware;
use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Body of the status update endpoints
#[derive(Debug, Deserialize)]
pub struct StatusUpdate<S> {
    pub status: S,
}

/// `?status=` filter on list endpoints
#[derive(Debug, Deserialize)]
pub struct StatusFilter<S> {
    pub status: Option<S>,
}

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    let cors = build_cors_layer(settings);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware_stack = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    // Everything below requires a valid access token
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        // Planeswalkers
        .route(
            "/api/planeswalkers/me",
            get(planeswalkers::get_profile)
                .put(planeswalkers::update_profile)
                .delete(planeswalkers::remove_profile),
        )
        .route("/api/planeswalkers/{id}/role", put(planeswalkers::update_role))
        .route(
            "/api/planeswalkers/me/cards",
            post(planeswalkers::add_card).get(planeswalkers::list_cards),
        )
        // New card and set submissions
        .route(
            "/api/submissions/cards",
            post(submissions::add_card).get(submissions::list_cards),
        )
        .route("/api/submissions/cards/{id}", get(submissions::get_card))
        .route("/api/submissions/cards/{id}/status", put(submissions::update_card_status))
        .route(
            "/api/submissions/sets",
            post(submissions::add_set).get(submissions::list_sets),
        )
        .route("/api/submissions/sets/{id}", get(submissions::get_set))
        .route("/api/submissions/sets/{id}/status", put(submissions::update_set_status))
        // Card change requests
        .route(
            "/api/cards/{mvid}/changes",
            post(changes::submit).get(changes::list_for_card),
        )
        .route("/api/changes", get(changes::list))
        .route("/api/changes/{id}", get(changes::review))
        .route("/api/changes/{id}/fields/{field}/accept", post(changes::accept_field))
        .route("/api/changes/{id}/status", put(changes::update_status))
        // Set change requests
        .route(
            "/api/sets/{set_id}/changes",
            post(set_changes::submit).get(set_changes::list_for_set),
        )
        .route("/api/set-changes", get(set_changes::list))
        .route("/api/set-changes/{id}", get(set_changes::review))
        .route("/api/set-changes/{id}/fields/{field}/accept", post(set_changes::accept_field))
        .route("/api/set-changes/{id}/status", put(set_changes::update_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .merge(protected)
        .layer(middleware_stack)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Moderation service is running.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
