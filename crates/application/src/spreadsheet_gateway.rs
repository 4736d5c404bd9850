//! Spreadsheet gateway application service.
//!
//! Wraps the remote backend behind a small state machine so that an
//! unconfigured integration degrades to empty reads and skipped writes
//! instead of failing its callers.

use std::sync::Arc;

use resoluty_core::AppResult;
use resoluty_domain::{ConnectionReport, ConnectionStatus, RangeAddress, Table, WriteOutcome};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::sheet_ports::{SpreadsheetBackend, SpreadsheetConnector};

const PROBE_RANGE: &str = "A1:A1";
const NOT_CONFIGURED: &str = "Google Sheets não configurado";

/// Lifecycle of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayState {
    /// `initialize` has not run yet.
    Uninitialized,
    /// Credentials are being loaded.
    Initializing,
    /// A backend is available.
    Ready,
    /// The integration is not configured or its credential was rejected.
    Disabled,
}

impl GatewayState {
    /// Returns a stable transport value for this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Disabled => "disabled",
        }
    }
}

enum GatewaySlot {
    Uninitialized,
    Initializing,
    Ready(Arc<dyn SpreadsheetBackend>),
    Disabled(String),
}

impl GatewaySlot {
    fn state(&self) -> GatewayState {
        match self {
            Self::Uninitialized => GatewayState::Uninitialized,
            Self::Initializing => GatewayState::Initializing,
            Self::Ready(_) => GatewayState::Ready,
            Self::Disabled(_) => GatewayState::Disabled,
        }
    }
}

/// Authenticated read/write/append access to a single remote spreadsheet.
#[derive(Clone)]
pub struct SpreadsheetGateway {
    slot: Arc<RwLock<GatewaySlot>>,
}

impl Default for SpreadsheetGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadsheetGateway {
    /// Creates an uninitialized gateway.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(GatewaySlot::Uninitialized)),
        }
    }

    /// Creates a gateway that is already connected to `backend`.
    #[must_use]
    pub fn ready(backend: Arc<dyn SpreadsheetBackend>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(GatewaySlot::Ready(backend))),
        }
    }

    /// Creates a gateway that stays disabled for the process lifetime.
    #[must_use]
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(GatewaySlot::Disabled(reason.into()))),
        }
    }

    /// Loads credentials through `connector`.
    ///
    /// Never fails: a missing configuration or a rejected credential leaves the
    /// gateway disabled. Calling this again after it settled is a no-op.
    pub async fn initialize(&self, connector: &dyn SpreadsheetConnector) -> GatewayState {
        {
            let mut slot = self.slot.write().await;
            if !matches!(*slot, GatewaySlot::Uninitialized) {
                return slot.state();
            }
            *slot = GatewaySlot::Initializing;
        }

        let settled = match connector.connect().await {
            Ok(Some(backend)) => {
                info!(
                    spreadsheet_id = backend.spreadsheet_id(),
                    "spreadsheet gateway ready"
                );
                GatewaySlot::Ready(backend)
            }
            Ok(None) => {
                warn!("spreadsheet credentials or sheet id not configured, gateway disabled");
                GatewaySlot::Disabled(NOT_CONFIGURED.to_owned())
            }
            Err(error) => {
                warn!(error = %error, "failed to initialize spreadsheet gateway, gateway disabled");
                GatewaySlot::Disabled(error.to_string())
            }
        };

        let mut slot = self.slot.write().await;
        *slot = settled;
        slot.state()
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> GatewayState {
        self.slot.read().await.state()
    }

    /// Returns whether calls reach the remote service.
    pub async fn is_ready(&self) -> bool {
        self.state().await == GatewayState::Ready
    }

    async fn backend(&self) -> Option<Arc<dyn SpreadsheetBackend>> {
        match &*self.slot.read().await {
            GatewaySlot::Ready(backend) => Some(backend.clone()),
            _ => None,
        }
    }

    async fn disabled_reason(&self) -> String {
        match &*self.slot.read().await {
            GatewaySlot::Disabled(reason) => reason.clone(),
            GatewaySlot::Ready(_) => "spreadsheet gateway ready".to_owned(),
            _ => NOT_CONFIGURED.to_owned(),
        }
    }

    /// Reads the values in `range`. Returns an empty table when not ready.
    pub async fn read(&self, range: &RangeAddress) -> AppResult<Table> {
        let Some(backend) = self.backend().await else {
            warn!(range = %range, "spreadsheet gateway not ready, returning empty table");
            return Ok(Table::new());
        };

        backend.get_values(range).await.inspect_err(|error| {
            error!(range = %range, error = %error, "failed to read spreadsheet values");
        })
    }

    /// Overwrites `range` with `values`. Skipped when not ready.
    pub async fn write(&self, range: &RangeAddress, values: &Table) -> AppResult<WriteOutcome> {
        let Some(backend) = self.backend().await else {
            warn!(range = %range, "spreadsheet gateway not ready, skipping write");
            return Ok(WriteOutcome::Skipped);
        };

        let summary = backend
            .update_values(range, values)
            .await
            .inspect_err(|error| {
                error!(range = %range, error = %error, "failed to write spreadsheet values");
            })?;
        info!(range = %range, updated_cells = summary.updated_cells, "spreadsheet values written");

        Ok(WriteOutcome::Applied(summary))
    }

    /// Appends `values` after the last occupied row. Skipped when not ready.
    pub async fn append(&self, range: &RangeAddress, values: &Table) -> AppResult<WriteOutcome> {
        let Some(backend) = self.backend().await else {
            warn!(range = %range, "spreadsheet gateway not ready, skipping append");
            return Ok(WriteOutcome::Skipped);
        };

        let summary = backend
            .append_values(range, values)
            .await
            .inspect_err(|error| {
                error!(range = %range, error = %error, "failed to append spreadsheet values");
            })?;
        info!(range = %range, updated_rows = summary.updated_rows, "spreadsheet values appended");

        Ok(WriteOutcome::Applied(summary))
    }

    /// Probes the remote service with a minimal read.
    pub async fn test_connection(&self) -> ConnectionReport {
        let Some(backend) = self.backend().await else {
            return ConnectionReport {
                status: ConnectionStatus::Disabled,
                message: self.disabled_reason().await,
                sheet_id: None,
            };
        };

        let probe = match RangeAddress::new(PROBE_RANGE) {
            Ok(range) => backend.get_values(&range).await.map(|_| ()),
            Err(error) => Err(error),
        };

        match probe {
            Ok(()) => ConnectionReport {
                status: ConnectionStatus::Connected,
                message: "Google Sheets conectado com sucesso".to_owned(),
                sheet_id: Some(backend.spreadsheet_id().to_owned()),
            },
            Err(error) => {
                error!(error = %error, "spreadsheet connection test failed");
                ConnectionReport {
                    status: ConnectionStatus::Error,
                    message: error.to_string(),
                    sheet_id: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
