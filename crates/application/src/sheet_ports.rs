use std::sync::Arc;

use async_trait::async_trait;
use resoluty_core::AppResult;
use resoluty_domain::{RangeAddress, Table, WriteSummary};

/// Port for the authenticated remote spreadsheet values API.
#[async_trait]
pub trait SpreadsheetBackend: Send + Sync {
    /// Returns the identifier of the spreadsheet every call targets.
    fn spreadsheet_id(&self) -> &str;

    /// Fetches the values stored in `range`.
    async fn get_values(&self, range: &RangeAddress) -> AppResult<Table>;

    /// Overwrites `range` with `values`, interpreting them literally.
    async fn update_values(&self, range: &RangeAddress, values: &Table) -> AppResult<WriteSummary>;

    /// Inserts `values` as new rows after the last occupied row of the range's tab.
    async fn append_values(&self, range: &RangeAddress, values: &Table) -> AppResult<WriteSummary>;
}

/// Port that loads credentials and builds a backend.
#[async_trait]
pub trait SpreadsheetConnector: Send + Sync {
    /// Returns `Ok(None)` when the integration is not configured.
    async fn connect(&self) -> AppResult<Option<Arc<dyn SpreadsheetBackend>>>;
}
