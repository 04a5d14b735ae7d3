//! OpenAPI schema aggregation for the leads API.
use crate::api::{
    leads, submit, system,
    types::{
        ErrorResponse, HealthStatus, LeadListResponse, NotesUpdateRequest, StatusUpdateRequest,
        StatusUpdateResponse, SubmitResponse, UpdateAck, ValueUpdateRequest,
    },
};
use brigade_core::model::{Lead, LeadStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "brigade-leads",
        version = "v1",
        description = "Lead capture and fan-out HTTP API"
    ),
    paths(
        submit::submit_form_doc,
        leads::list_leads,
        leads::update_status,
        leads::update_notes,
        leads::update_value,
        system::system_health
    ),
    components(schemas(
        ErrorResponse,
        SubmitResponse,
        Lead,
        LeadStatus,
        LeadListResponse,
        StatusUpdateRequest,
        StatusUpdateResponse,
        NotesUpdateRequest,
        ValueUpdateRequest,
        UpdateAck,
        HealthStatus
    )),
    tags(
        (name = "leads", description = "Public form intake"),
        (name = "admin", description = "Lead triage and conversion reporting"),
        (name = "system", description = "Health and discovery")
    )
)]
pub struct ApiDoc;
