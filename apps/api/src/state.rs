use resoluty_application::{LogRecorder, RealtimeHub, SpreadsheetGateway, StatsService};
use resoluty_domain::SessionGate;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: SpreadsheetGateway,
    pub log_recorder: LogRecorder,
    pub stats_service: StatsService,
    pub realtime_hub: RealtimeHub,
    pub session_gate: SessionGate,
}
