//! Health endpoint for probes and monitoring.
use crate::api::error::{api_internal, ApiError};
use crate::api::types::HealthStatus;
use crate::app::AppState;
use axum::extract::State;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Service healthy", body = HealthStatus),
        (status = 500, description = "Primary store unavailable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    let store = state.dispatcher.store();
    if let Err(err) = store.health_check().await {
        return Err(api_internal("storage unavailable", &err));
    }
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        backend: store.backend_name().to_string(),
    }))
}
