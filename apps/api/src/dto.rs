use resoluty_domain::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Success envelope shared by every `/api` endpoint except health.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub ok: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

/// Per-service status reported by the health check.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "health-services.ts")]
pub struct HealthServices {
    pub google_sheets: &'static str,
    pub realtime: &'static str,
}

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "health-response.ts")]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub services: HealthServices,
    pub timestamp: String,
}

/// Incoming payload for `/api/sheets/write` and `/api/sheets/append`.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "sheet-values-request.ts")]
pub struct SheetValuesRequest {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    #[ts(type = "Array<Array<string | number | boolean | null>> | null")]
    pub values: Option<Table>,
}

/// Incoming payload for `/api/sheets/log`.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "log-request.ts")]
pub struct LogRequest {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    #[ts(type = "Record<string, unknown> | null")]
    pub data: Option<Value>,
}

/// Incoming payload for `/api/emit`.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "emit-request.ts")]
pub struct EmitRequest {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    #[ts(type = "unknown")]
    pub data: Option<Value>,
    #[serde(default)]
    pub room: Option<String>,
}

/// Result of publishing a realtime notification.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "emit-response.ts")]
pub struct EmitResponse {
    pub delivered: usize,
}

/// Query for `/api/session/gate`.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "session-gate-query.ts")]
pub struct SessionGateQuery {
    pub path: String,
}

/// Message sent by WebSocket clients.
#[derive(Debug, Deserialize, TS)]
#[serde(tag = "type", rename_all = "kebab-case")]
#[ts(export, export_to = "realtime-client-message.ts")]
pub enum RealtimeClientMessage {
    JoinRoom { room: String },
    LeaveRoom { room: String },
}

/// Message pushed to WebSocket clients.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "realtime-server-message.ts")]
pub struct RealtimeServerMessage {
    pub event: String,
    #[ts(type = "unknown")]
    pub data: Value,
}
