//! Domain types for the spreadsheet-backed telemetry ledger.

#![forbid(unsafe_code)]

mod log_entry;
mod session_gate;
mod sheet;
mod stats;

pub use log_entry::{
    DEFAULT_USER_ID, DETAILS_MAX_CHARS, FrontendEvent, LogDelivery, LogEntry, LogKind,
    LogTimestamp, UserAction, serialize_details,
};
pub use session_gate::{AUTH_MARKER_COOKIE, GateDecision, SessionGate};
pub use sheet::{
    CellValue, ConnectionReport, ConnectionStatus, RangeAddress, Row, Table, WriteOutcome,
    WriteSummary,
};
pub use stats::{LogCounts, RECENT_WINDOW_HOURS, StatsSnapshot};
