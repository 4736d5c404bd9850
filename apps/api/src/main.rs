//! Resoluty dashboard API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod state;

use std::time::Duration;

use resoluty_application::{
    GatewayState, LogRecorder, RealtimeHub, SpreadsheetGateway, StatsService,
};
use resoluty_core::AppError;
use resoluty_domain::{LogDelivery, SessionGate};
use resoluty_infrastructure::GoogleSheetsConnector;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

const HTTP_TIMEOUT_SECONDS: u64 = 15;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let gateway = SpreadsheetGateway::new();
    let connector = GoogleSheetsConnector::new(http_client, config.sheets.clone());
    let gateway_state = gateway.initialize(&connector).await;
    if gateway_state != GatewayState::Ready {
        warn!(
            state = gateway_state.as_str(),
            "running without Google Sheets, logs will be skipped"
        );
    }

    let log_recorder = LogRecorder::new(gateway.clone(), config.log_utc_offset);

    if config.init_sheets_only {
        let report = log_recorder.create_headers().await;
        info!(
            user_actions = ?report.user_actions,
            frontend_events = ?report.frontend_events,
            "log tab header setup finished"
        );

        if report.user_actions != LogDelivery::Sent
            || report.frontend_events != LogDelivery::Sent
        {
            return Err(AppError::Integration(
                "failed to write log tab headers".to_owned(),
            ));
        }

        return Ok(());
    }

    let app_state = AppState {
        stats_service: StatsService::new(gateway.clone()),
        realtime_hub: RealtimeHub::new(config.realtime_channel_capacity)?,
        session_gate: SessionGate::default(),
        log_recorder,
        gateway,
    };

    let app = api_router::build_router(app_state, config.cors_allowed_origin.as_deref())?;
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "resoluty-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
