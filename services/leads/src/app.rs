//! HTTP application wiring.
//!
//! # Purpose
//! Builds the axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and
//! testable; integration tests drive the router directly.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::dispatch::Dispatcher;
use crate::observability;
use axum::Json;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/api/submit-form",
            axum::routing::post(api::submit::submit_form),
        )
        .route(
            "/api/admin/leads",
            axum::routing::get(api::leads::list_leads),
        )
        .route(
            "/api/admin/leads/:id/status",
            axum::routing::post(api::leads::update_status),
        )
        .route(
            "/api/admin/leads/:id/notes",
            axum::routing::post(api::leads::update_notes),
        )
        .route(
            "/api/admin/leads/:id/value",
            axum::routing::post(api::leads::update_value),
        )
        .route(
            "/api/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route("/api/openapi.json", axum::routing::get(openapi_json))
        .layer(trace_layer)
        // The form posts from the marketing site, the admin UI from its own
        // origin; both are read/write through this API only.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
