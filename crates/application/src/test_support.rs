use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use resoluty_core::{AppError, AppResult};
use resoluty_domain::{RangeAddress, Table, WriteSummary};

use crate::sheet_ports::{SpreadsheetBackend, SpreadsheetConnector};

/// Backend keyed by the literal range string.
#[derive(Default)]
pub(crate) struct FakeSpreadsheetBackend {
    tables: Mutex<HashMap<String, Table>>,
    failure: Option<String>,
}

impl FakeSpreadsheetBackend {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            failure: Some(message.to_owned()),
        }
    }

    pub(crate) fn seed(&self, range: &str, rows: Table) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.insert(range.to_owned(), rows);
        }
    }

    pub(crate) fn rows(&self, range: &str) -> Table {
        self.tables
            .lock()
            .ok()
            .and_then(|tables| tables.get(range).cloned())
            .unwrap_or_default()
    }

    fn check_failure(&self) -> AppResult<()> {
        match &self.failure {
            Some(message) => Err(AppError::Integration(message.clone())),
            None => Ok(()),
        }
    }

    fn lock_tables(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, Table>>> {
        self.tables
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock fake tables: {error}")))
    }
}

fn summary_for(range: &RangeAddress, values: &Table) -> WriteSummary {
    let rows = values.len() as u64;
    let cells = values.iter().map(|row| row.len() as u64).sum();
    WriteSummary {
        updated_range: Some(range.to_string()),
        updated_rows: rows,
        updated_columns: values.iter().map(|row| row.len() as u64).max().unwrap_or(0),
        updated_cells: cells,
    }
}

#[async_trait]
impl SpreadsheetBackend for FakeSpreadsheetBackend {
    fn spreadsheet_id(&self) -> &str {
        "fake-sheet"
    }

    async fn get_values(&self, range: &RangeAddress) -> AppResult<Table> {
        self.check_failure()?;
        Ok(self
            .lock_tables()?
            .get(range.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn update_values(&self, range: &RangeAddress, values: &Table) -> AppResult<WriteSummary> {
        self.check_failure()?;
        self.lock_tables()?
            .insert(range.as_str().to_owned(), values.clone());
        Ok(summary_for(range, values))
    }

    async fn append_values(&self, range: &RangeAddress, values: &Table) -> AppResult<WriteSummary> {
        self.check_failure()?;
        self.lock_tables()?
            .entry(range.as_str().to_owned())
            .or_default()
            .extend(values.iter().cloned());
        Ok(summary_for(range, values))
    }
}

/// Connector returning a fixed outcome.
pub(crate) enum FakeConnector {
    Connected(Arc<FakeSpreadsheetBackend>),
    Unconfigured,
    Rejected(String),
}

#[async_trait]
impl SpreadsheetConnector for FakeConnector {
    async fn connect(&self) -> AppResult<Option<Arc<dyn SpreadsheetBackend>>> {
        match self {
            Self::Connected(backend) => Ok(Some(backend.clone())),
            Self::Unconfigured => Ok(None),
            Self::Rejected(message) => Err(AppError::Validation(message.clone())),
        }
    }
}
