//! Application services and ports.

#![forbid(unsafe_code)]

mod log_recorder;
mod realtime_hub;
mod sheet_ports;
mod spreadsheet_gateway;
mod stats_service;

#[cfg(test)]
mod test_support;

pub use log_recorder::{HeaderSetupReport, LogRecorder};
pub use realtime_hub::{RealtimeHub, RealtimeNotification, RealtimeSubscription};
pub use sheet_ports::{SpreadsheetBackend, SpreadsheetConnector};
pub use spreadsheet_gateway::{GatewayState, SpreadsheetGateway};
pub use stats_service::{StatsReport, StatsService};
