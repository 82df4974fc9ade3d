/*
 * Responsibility
 * - POST /api/v1/orchestration/services (要認証)
 * - AuthGate を通過した後にだけ呼ばれる
 */
use axum::{Json, http::StatusCode};

use crate::api::v1::dto::orchestration::{OrchestrationRequest, OrchestrationResponse};
use crate::error::AppError;

pub async fn request_service(
    Json(req): Json<OrchestrationRequest>,
) -> Result<(StatusCode, Json<OrchestrationResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::InvalidRequest(msg.to_string()))?;

    tracing::info!(service_name = %req.service_name, "orchestration request accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(OrchestrationResponse {
            service_name: req.service_name,
            message: "ACCEPTED".to_string(),
        }),
    ))
}
