/*
 * Responsibility
 * - GET  /api/v1/servicemgr/services
 * - POST /api/v1/servicemgr/services/notification/{serviceid}
 * - どちらも AllowList に含まれるため認証なしで到達する (notification はリテラルパスのみ)
 */
use axum::{Json, extract::Path, http::StatusCode};
use serde::Serialize;

use crate::api::v1::dto::orchestration::NotificationRequest;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    pub services: Vec<String>,
}

pub async fn list_services() -> Json<ServiceListResponse> {
    Json(ServiceListResponse {
        services: Vec::new(),
    })
}

pub async fn notify_service(
    Path(service_id): Path<String>,
    Json(req): Json<NotificationRequest>,
) -> Result<StatusCode, AppError> {
    req.validate()
        .map_err(|msg| AppError::InvalidRequest(msg.to_string()))?;

    tracing::info!(service_id = %service_id, status = %req.status, "service notification");
    Ok(StatusCode::NO_CONTENT)
}
