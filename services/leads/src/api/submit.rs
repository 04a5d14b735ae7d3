//! Public form submission endpoint.
//!
//! # Purpose
//! `POST /api/submit-form` is the only unauthenticated write surface. It
//! validates the body shape, hands the submission to the dispatcher, and
//! preserves the response contract the deployed website expects.
//!
//! # Key behavior
//! Spam gets the same success body as a real submission, minus the lead id.
//! Bots receive no signal that they were filtered.
use crate::api::error::{api_internal, api_validation_error, ApiError};
use crate::api::types::SubmitResponse;
use crate::app::AppState;
use crate::dispatch::SubmitOutcome;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use brigade_core::model::Submission;
use serde_json::Value;

const RECEIVED: &str = "Form submission received";

/// OpenAPI registration for the submit route. The real handler takes a
/// rejection-aware body extractor the path macro cannot describe, so the
/// annotation lives on this stub and [`submit_form`] stays the route
/// handler.
#[utoipa::path(
    post,
    path = "/api/submit-form",
    tag = "leads",
    responses(
        (status = 200, description = "Submission received", body = SubmitResponse),
        (status = 400, description = "Malformed or empty body", body = crate::api::types::ErrorResponse),
        (status = 500, description = "Primary store write failed", body = crate::api::types::ErrorResponse)
    )
)]
#[allow(dead_code)]
pub(crate) fn submit_form_doc() {}

pub(crate) async fn submit_form(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(value) = body.map_err(|_| api_validation_error("Invalid JSON data"))?;
    if value.as_object().map_or(true, |map| map.is_empty()) {
        return Err(api_validation_error("No data provided"));
    }
    let submission: Submission =
        serde_json::from_value(value).map_err(|_| api_validation_error("Invalid JSON data"))?;

    let outcome = state
        .dispatcher
        .submit(&submission)
        .await
        .map_err(|err| api_internal("Error submitting form. Please try again.", &err))?;

    let id = match outcome {
        SubmitOutcome::Rejected { .. } => None,
        SubmitOutcome::Accepted { lead_id, .. } => Some(lead_id),
    };
    Ok(Json(SubmitResponse {
        success: true,
        message: RECEIVED.to_string(),
        id,
    }))
}
