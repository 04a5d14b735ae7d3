//! Admin lead triage endpoints.
//!
//! Listing goes straight to the primary store; edits go through the
//! dispatcher so sink mirroring and conversion reporting happen in one
//! place.
use crate::api::error::{api_internal, api_not_found, api_validation_error, ApiError};
use crate::api::types::{
    LeadListParams, LeadListResponse, NotesUpdateRequest, StatusUpdateRequest,
    StatusUpdateResponse, UpdateAck, ValueUpdateRequest,
};
use crate::app::AppState;
use crate::store::StoreError;
use axum::extract::{Path, Query, State};
use axum::Json;
use brigade_core::model::{LeadQuery, LeadStatus, OrderDir};

fn parse_query(params: LeadListParams) -> Result<LeadQuery, ApiError> {
    let status = if params.status == "all" {
        None
    } else {
        Some(
            params
                .status
                .parse::<LeadStatus>()
                .map_err(|err| api_validation_error(&err))?,
        )
    };
    let order_dir = params
        .order_dir
        .parse::<OrderDir>()
        .map_err(|err| api_validation_error(&err))?;
    let query = LeadQuery {
        status,
        limit: params.limit,
        offset: params.offset,
        order_by: params.order_by,
        order_dir,
    };
    query
        .validate()
        .map_err(|err| api_validation_error(&err))?;
    Ok(query)
}

#[utoipa::path(
    get,
    path = "/api/admin/leads",
    tag = "admin",
    params(LeadListParams),
    responses(
        (status = 200, description = "Filtered lead page", body = LeadListResponse),
        (status = 400, description = "Invalid filter or sort", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_leads(
    Query(params): Query<LeadListParams>,
    State(state): State<AppState>,
) -> Result<Json<LeadListResponse>, ApiError> {
    let query = parse_query(params)?;
    let page = state
        .dispatcher
        .store()
        .query_leads(&query)
        .await
        .map_err(|err| api_internal("failed to list leads", &err))?;
    Ok(Json(LeadListResponse {
        success: true,
        leads: page.leads,
        total_count: page.total_count,
        limit: query.limit,
        offset: query.offset,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/leads/{id}/status",
    tag = "admin",
    params(("id" = String, Path, description = "Lead identifier")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status updated", body = StatusUpdateResponse),
        (status = 400, description = "Invalid status or missing booking value", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Lead not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_status(
    Path(lead_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>, ApiError> {
    let Some(raw_status) = body.status else {
        return Err(api_validation_error("Status required"));
    };
    let status = raw_status
        .parse::<LeadStatus>()
        .map_err(|err| api_validation_error(&err))?;

    // Won is terminal-with-value: the revenue number drives conversion
    // reporting and must arrive with the transition.
    if status == LeadStatus::Won
        && !body.booking_value.map_or(false, |value| value > 0.0)
    {
        return Err(api_validation_error(
            "Booking value required when marking as won",
        ));
    }

    match state
        .dispatcher
        .apply_status(&lead_id, status, body.booking_value)
        .await
    {
        Ok(()) => Ok(Json(StatusUpdateResponse {
            success: true,
            lead_id,
            status: status.to_string(),
            booking_value: body.booking_value,
        })),
        Err(StoreError::NotFound(_)) => Err(api_not_found("lead not found")),
        Err(err) => Err(api_internal("failed to update lead status", &err)),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/leads/{id}/notes",
    tag = "admin",
    params(("id" = String, Path, description = "Lead identifier")),
    request_body = NotesUpdateRequest,
    responses(
        (status = 200, description = "Notes updated", body = UpdateAck),
        (status = 400, description = "Notes missing", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Lead not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_notes(
    Path(lead_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<NotesUpdateRequest>,
) -> Result<Json<UpdateAck>, ApiError> {
    let Some(notes) = body.notes else {
        return Err(api_validation_error("Notes required"));
    };

    match state.dispatcher.apply_notes(&lead_id, notes).await {
        Ok(()) => Ok(Json(UpdateAck {
            success: true,
            lead_id,
        })),
        Err(StoreError::NotFound(_)) => Err(api_not_found("lead not found")),
        Err(err) => Err(api_internal("failed to update lead notes", &err)),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/leads/{id}/value",
    tag = "admin",
    params(("id" = String, Path, description = "Lead identifier")),
    request_body = ValueUpdateRequest,
    responses(
        (status = 200, description = "Booking value updated", body = UpdateAck),
        (status = 400, description = "Booking value missing", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Lead not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_value(
    Path(lead_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ValueUpdateRequest>,
) -> Result<Json<UpdateAck>, ApiError> {
    let Some(value) = body.booking_value else {
        return Err(api_validation_error("Booking value required"));
    };

    match state.dispatcher.apply_value(&lead_id, value).await {
        Ok(()) => Ok(Json(UpdateAck {
            success: true,
            lead_id,
        })),
        Err(StoreError::NotFound(_)) => Err(api_not_found("lead not found")),
        Err(err) => Err(api_internal("failed to update booking value", &err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parsing_defaults_and_rejects() {
        let query = parse_query(LeadListParams::default()).expect("defaults");
        assert!(query.status.is_none());
        assert_eq!(query.limit, 50);
        assert_eq!(query.order_by, "submitted_at");
        assert_eq!(query.order_dir, OrderDir::Desc);

        let query = parse_query(LeadListParams {
            status: "won".to_string(),
            order_dir: "asc".to_string(),
            ..LeadListParams::default()
        })
        .expect("filtered");
        assert_eq!(query.status, Some(LeadStatus::Won));
        assert_eq!(query.order_dir, OrderDir::Asc);

        assert!(parse_query(LeadListParams {
            status: "converted".to_string(),
            ..LeadListParams::default()
        })
        .is_err());
        assert!(parse_query(LeadListParams {
            order_by: "email; DROP TABLE leads".to_string(),
            ..LeadListParams::default()
        })
        .is_err());
    }
}
