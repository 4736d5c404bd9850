use axum::Json;
use axum::extract::State;
use chrono::{SecondsFormat, Utc};
use resoluty_application::GatewayState;

use crate::dto::{HealthResponse, HealthServices};
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let google_sheets = match state.gateway.state().await {
        GatewayState::Ready => "connected",
        other => other.as_str(),
    };

    Json(HealthResponse {
        status: "ok",
        message: "Backend Dashboard Resoluty rodando!",
        services: HealthServices {
            google_sheets,
            realtime: "active",
        },
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
