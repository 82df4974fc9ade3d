/*
 * Responsibility
 * - servicemgr / orchestration の request/response DTO
 * - validate() で形式チェックのみ行う
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct NotificationRequest {
    pub status: String,
}

impl NotificationRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.status.trim().is_empty() {
            return Err("status is required");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrchestrationRequest {
    pub service_name: String,
    #[serde(default)]
    pub service_info: Vec<ServiceInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceInfo {
    pub exec_type: String,
    #[serde(default)]
    pub exe_cmd: Vec<String>,
}

impl OrchestrationRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.service_name.trim().is_empty() {
            return Err("ServiceName is required");
        }
        if self.service_info.iter().any(|i| i.exec_type.trim().is_empty()) {
            return Err("ExecType is required");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrchestrationResponse {
    pub service_name: String,
    pub message: String,
}
