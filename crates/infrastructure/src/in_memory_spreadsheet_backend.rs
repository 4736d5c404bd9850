use std::collections::HashMap;

use async_trait::async_trait;
use resoluty_application::SpreadsheetBackend;
use resoluty_core::{AppError, AppResult};
use resoluty_domain::{RangeAddress, Row, Table, WriteSummary};
use tokio::sync::RwLock;

const DEFAULT_TAB: &str = "Sheet1";

/// In-memory spreadsheet backend implementation.
///
/// Ranges address whole rows of a tab: the column part of a span is ignored
/// and reads return every row of the tab. Tabs must exist before use.
#[derive(Debug)]
pub struct InMemorySpreadsheetBackend {
    spreadsheet_id: String,
    tabs: RwLock<HashMap<String, Vec<Row>>>,
}

impl InMemorySpreadsheetBackend {
    /// Creates a spreadsheet with the given empty tabs.
    #[must_use]
    pub fn new(spreadsheet_id: impl Into<String>, tabs: &[&str]) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            tabs: RwLock::new(
                tabs.iter()
                    .map(|tab| ((*tab).to_owned(), Vec::new()))
                    .collect(),
            ),
        }
    }

    /// Returns a copy of every row in `tab`.
    pub async fn rows(&self, tab: &str) -> Table {
        self.tabs.read().await.get(tab).cloned().unwrap_or_default()
    }
}

fn tab_name(range: &RangeAddress) -> &str {
    range.tab().unwrap_or(DEFAULT_TAB)
}

fn missing_tab(range: &RangeAddress) -> AppError {
    AppError::Integration(format!("Unable to parse range: {range}"))
}

/// One-based row where the span starts; `A:E` starts at row 1.
fn start_row(span: &str) -> usize {
    let first_cell = span.split(':').next().unwrap_or_default();
    first_cell
        .trim_start_matches(|character: char| character.is_ascii_alphabetic())
        .parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .unwrap_or(1)
}

fn summary(tab: String, first_row: usize, values: &Table) -> WriteSummary {
    let columns = values.iter().map(Vec::len).max().unwrap_or(0);
    let cells = values.iter().map(Vec::len).sum::<usize>();
    let last_row = first_row + values.len().saturating_sub(1);

    WriteSummary {
        updated_range: Some(format!("{tab}!{first_row}:{last_row}")),
        updated_rows: values.len() as u64,
        updated_columns: columns as u64,
        updated_cells: cells as u64,
    }
}

#[async_trait]
impl SpreadsheetBackend for InMemorySpreadsheetBackend {
    fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn get_values(&self, range: &RangeAddress) -> AppResult<Table> {
        let tabs = self.tabs.read().await;
        let rows = tabs.get(tab_name(range)).ok_or_else(|| missing_tab(range))?;

        Ok(rows.clone())
    }

    async fn update_values(&self, range: &RangeAddress, values: &Table) -> AppResult<WriteSummary> {
        let mut tabs = self.tabs.write().await;
        let tab = tab_name(range);
        let rows = tabs.get_mut(tab).ok_or_else(|| missing_tab(range))?;

        let first_row = start_row(range.span());
        for (offset, row) in values.iter().enumerate() {
            let index = first_row - 1 + offset;
            if rows.len() <= index {
                rows.resize_with(index + 1, Vec::new);
            }
            rows[index] = row.clone();
        }

        Ok(summary(tab.to_owned(), first_row, values))
    }

    async fn append_values(&self, range: &RangeAddress, values: &Table) -> AppResult<WriteSummary> {
        let mut tabs = self.tabs.write().await;
        let tab = tab_name(range);
        let rows = tabs.get_mut(tab).ok_or_else(|| missing_tab(range))?;

        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        let first_row = rows.len() + 1;
        rows.extend(values.iter().cloned());

        Ok(summary(tab.to_owned(), first_row, values))
    }
}

#[cfg(test)]
mod tests {
    use resoluty_application::SpreadsheetBackend;
    use resoluty_domain::{CellValue, RangeAddress};

    use super::{InMemorySpreadsheetBackend, start_row};

    fn range(value: &str) -> RangeAddress {
        RangeAddress::new(value).unwrap_or_else(|_| panic!("valid range"))
    }

    #[test]
    fn start_row_reads_first_cell() {
        assert_eq!(start_row("A1:E1"), 1);
        assert_eq!(start_row("B7"), 7);
        assert_eq!(start_row("A:E"), 1);
    }

    #[tokio::test]
    async fn header_write_then_append_lands_below() {
        let backend = InMemorySpreadsheetBackend::new("memory", &["UserActions"]);
        let header = vec![vec![CellValue::from("Data/Hora")]];
        let entry = vec![vec![CellValue::from("19/10/2026, 10:00:00")]];

        let written = backend
            .update_values(&range("UserActions!A1:E1"), &header)
            .await
            .unwrap_or_else(|_| panic!("header write succeeds"));
        assert_eq!(written.updated_range.as_deref(), Some("UserActions!1:1"));
        let appended = backend
            .append_values(&range("UserActions!A:E"), &entry)
            .await
            .unwrap_or_else(|_| panic!("append succeeds"));

        assert_eq!(appended.updated_range.as_deref(), Some("UserActions!2:2"));
        assert_eq!(backend.rows("UserActions").await, vec![header[0].clone(), entry[0].clone()]);
    }

    #[tokio::test]
    async fn unknown_tab_fails_like_remote() {
        let backend = InMemorySpreadsheetBackend::new("memory", &["UserActions"]);

        let result = backend.get_values(&range("Missing!A:A")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn bare_span_targets_default_tab() {
        let backend = InMemorySpreadsheetBackend::new("memory", &["Sheet1"]);

        let result = backend.get_values(&range("A1:A1")).await;

        assert!(result.is_ok_and(|table| table.is_empty()));
    }
}
