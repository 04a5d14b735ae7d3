//! Request and response bodies for the HTTP API.
//!
//! The form and admin routes predate this service and their JSON shapes are
//! consumed by a deployed website and admin UI, so field names here are
//! load-bearing: `success` flags, camelCase pagination fields, and the
//! legacy message strings all stay as they are.
use brigade_core::model::Lead;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Uniform error body. `code` is stable for programmatic handling;
/// `message` is for humans (and for the legacy form client, which matches
/// on it).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    /// Present only for accepted (non-spam) submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(default)]
pub struct LeadListParams {
    /// Lead status filter; `all` (the default) disables filtering.
    pub status: String,
    pub limit: u32,
    pub offset: u32,
    #[serde(rename = "orderBy")]
    pub order_by: String,
    #[serde(rename = "orderDir")]
    pub order_dir: String,
}

impl Default for LeadListParams {
    fn default() -> Self {
        Self {
            status: "all".to_string(),
            limit: crate::config::DEFAULT_QUERY_LIMIT,
            offset: 0,
            order_by: "submitted_at".to_string(),
            order_dir: "DESC".to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeadListResponse {
    pub success: bool,
    pub leads: Vec<Lead>,
    #[serde(rename = "totalCount")]
    pub total_count: u64,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    pub booking_value: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusUpdateResponse {
    pub success: bool,
    #[serde(rename = "leadId")]
    pub lead_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_value: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotesUpdateRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValueUpdateRequest {
    pub booking_value: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateAck {
    pub success: bool,
    #[serde(rename = "leadId")]
    pub lead_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
}
