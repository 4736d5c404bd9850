use chrono::{DateTime, SecondsFormat, Utc};
use resoluty_core::AppResult;
use resoluty_domain::{LogKind, RangeAddress, StatsSnapshot, Table};
use serde::Serialize;
use tracing::{error, info};

use crate::spreadsheet_gateway::SpreadsheetGateway;

/// Result of a stats request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatsReport {
    /// The gateway is not ready; no reads were attempted.
    Disabled {
        /// Always `disabled`.
        status: &'static str,
        /// Human readable reason.
        message: String,
    },
    /// Counters for both log tabs.
    Ready(StatsSnapshot),
    /// One of the log tab reads failed.
    Failed {
        /// Failure message from the gateway.
        error: String,
        /// Moment the failure was observed, RFC 3339 UTC.
        #[serde(rename = "lastUpdate")]
        last_update: String,
    },
}

/// Application service deriving usage counters from the log tabs.
#[derive(Clone)]
pub struct StatsService {
    gateway: SpreadsheetGateway,
}

impl StatsService {
    /// Creates a new stats service.
    #[must_use]
    pub fn new(gateway: SpreadsheetGateway) -> Self {
        Self { gateway }
    }

    /// Reads both log tabs and counts their rows.
    pub async fn snapshot(&self) -> StatsReport {
        self.snapshot_at(Utc::now()).await
    }

    async fn snapshot_at(&self, now: DateTime<Utc>) -> StatsReport {
        if !self.gateway.is_ready().await {
            return StatsReport::Disabled {
                status: "disabled",
                message: "Google Sheets não configurado".to_owned(),
            };
        }

        let rows = async {
            let user_actions = self.read_log(LogKind::UserAction).await?;
            let frontend_events = self.read_log(LogKind::FrontendEvent).await?;
            AppResult::Ok((user_actions, frontend_events))
        }
        .await;

        match rows {
            Ok((user_actions, frontend_events)) => {
                let snapshot = StatsSnapshot::compute(&user_actions, &frontend_events, now);
                info!(
                    user_actions = snapshot.user_actions.total,
                    frontend_events = snapshot.frontend_events.total,
                    "stats snapshot computed"
                );
                StatsReport::Ready(snapshot)
            }
            Err(error) => {
                error!(error = %error, "failed to compute stats snapshot");
                StatsReport::Failed {
                    error: error.to_string(),
                    last_update: now.to_rfc3339_opts(SecondsFormat::Millis, true),
                }
            }
        }
    }

    async fn read_log(&self, kind: LogKind) -> AppResult<Table> {
        let range = RangeAddress::new(kind.range())?;
        self.gateway.read(&range).await
    }
}
