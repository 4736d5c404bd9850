//! Best-effort telemetry recording into the spreadsheet log tabs.
//!
//! Failures are logged and reported through [`LogDelivery`], never returned
//! as errors, so telemetry cannot interrupt the flow that emitted it.

use chrono::{DateTime, FixedOffset, Utc};
use resoluty_core::{AppError, AppResult};
use resoluty_domain::{
    CellValue, FrontendEvent, LogDelivery, LogEntry, LogKind, LogTimestamp, RangeAddress,
    UserAction, WriteOutcome,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::spreadsheet_gateway::SpreadsheetGateway;

/// Per-tab outcome of writing the header rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderSetupReport {
    /// Header write for the user action tab.
    pub user_actions: LogDelivery,
    /// Header write for the frontend event tab.
    pub frontend_events: LogDelivery,
}

/// Application service that formats log entries into rows and appends them.
#[derive(Clone)]
pub struct LogRecorder {
    gateway: SpreadsheetGateway,
    display_offset: FixedOffset,
}

impl LogRecorder {
    /// Creates a recorder rendering local timestamps at `display_offset`.
    #[must_use]
    pub fn new(gateway: SpreadsheetGateway, display_offset: FixedOffset) -> Self {
        Self {
            gateway,
            display_offset,
        }
    }

    /// Records a user action. `user_id` defaults to `frontend-user`.
    pub async fn log_user_action(
        &self,
        action: &str,
        details: Value,
        user_id: Option<String>,
    ) -> LogDelivery {
        match UserAction::new(action, details, user_id) {
            Ok(entry) => self.record(entry.into()).await,
            Err(error) => rejected(LogKind::UserAction, error),
        }
    }

    /// Records a frontend event.
    pub async fn log_frontend_event(&self, event: &str, details: Value) -> LogDelivery {
        match FrontendEvent::new(event, details) {
            Ok(entry) => self.record(entry.into()).await,
            Err(error) => rejected(LogKind::FrontendEvent, error),
        }
    }

    /// Appends `entry` stamped with the current time.
    pub async fn record(&self, entry: LogEntry) -> LogDelivery {
        self.record_at(entry, Utc::now()).await
    }

    async fn record_at(&self, entry: LogEntry, instant: DateTime<Utc>) -> LogDelivery {
        let kind = entry.kind();
        let timestamp = LogTimestamp::at(instant, self.display_offset);
        let row = entry.to_row(&timestamp);

        let outcome = match RangeAddress::new(kind.range()) {
            Ok(range) => self.gateway.append(&range, &vec![row]).await,
            Err(error) => Err(error),
        };

        let delivery = delivery_from(kind, outcome);
        if delivery == LogDelivery::Sent {
            info!(kind = kind.as_str(), name = entry.name(), "log entry recorded");
        }
        delivery
    }

    /// Writes the fixed header row to the first row of each log tab.
    ///
    /// Overwrites, so it is safe to run more than once.
    pub async fn create_headers(&self) -> HeaderSetupReport {
        let user_actions = self.write_headers(LogKind::UserAction).await;
        let frontend_events = self.write_headers(LogKind::FrontendEvent).await;

        if user_actions == LogDelivery::Sent && frontend_events == LogDelivery::Sent {
            info!("log tab headers written");
        }

        HeaderSetupReport {
            user_actions,
            frontend_events,
        }
    }

    async fn write_headers(&self, kind: LogKind) -> LogDelivery {
        let headers = vec![
            kind.headers()
                .iter()
                .map(|label| CellValue::from(*label))
                .collect(),
        ];

        let outcome = match RangeAddress::new(kind.header_range()) {
            Ok(range) => self.gateway.write(&range, &headers).await,
            Err(error) => Err(error),
        };

        delivery_from(kind, outcome)
    }
}

fn delivery_from(kind: LogKind, outcome: AppResult<WriteOutcome>) -> LogDelivery {
    match outcome {
        Ok(WriteOutcome::Applied(_)) => LogDelivery::Sent,
        Ok(WriteOutcome::Skipped) => LogDelivery::Skipped,
        Err(error) => {
            error!(kind = kind.as_str(), error = %error, "failed to record log entry");
            LogDelivery::Failed {
                reason: error.to_string(),
            }
        }
    }
}

fn rejected(kind: LogKind, error: AppError) -> LogDelivery {
    error!(kind = kind.as_str(), error = %error, "rejected malformed log entry");
    LogDelivery::Failed {
        reason: error.to_string(),
    }
}
