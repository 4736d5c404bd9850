use std::fmt::{Display, Formatter};

use resoluty_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Address of a tab and optional cell span, e.g. `UserActions!A:E` or `A1:A1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RangeAddress(String);

impl RangeAddress {
    /// Creates a validated range address.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("range must not be empty".to_owned()));
        }

        if let Some((tab, span)) = trimmed.split_once('!') {
            if unquote_tab(tab).trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "range '{trimmed}' has an empty tab name"
                )));
            }
            if span.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "range '{trimmed}' has an empty cell span"
                )));
            }
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the full address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the tab name, when the address names one.
    #[must_use]
    pub fn tab(&self) -> Option<&str> {
        self.0.split_once('!').map(|(tab, _)| unquote_tab(tab))
    }

    /// Returns the cell span without the tab prefix.
    #[must_use]
    pub fn span(&self) -> &str {
        self.0
            .split_once('!')
            .map_or(self.0.as_str(), |(_, span)| span)
    }
}

impl TryFrom<String> for RangeAddress {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RangeAddress> for String {
    fn from(value: RangeAddress) -> Self {
        value.0
    }
}

impl Display for RangeAddress {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

fn unquote_tab(tab: &str) -> &str {
    tab.strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(tab)
}

/// One display value stored in a spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Blank cell.
    Empty,
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(Number),
    /// Text literal.
    Text(String),
}

impl CellValue {
    /// Returns the text content when the cell holds text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(value) => write!(formatter, "{value}"),
            Self::Number(value) => write!(formatter, "{value}"),
            Self::Text(value) => formatter.write_str(value),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Ordered cell values of one spreadsheet row.
pub type Row = Vec<CellValue>;

/// Block of rows as returned by or sent to the spreadsheet service.
pub type Table = Vec<Row>;

/// Summary reported by the spreadsheet service after a write or append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteSummary {
    /// Range that was actually updated, in A1 notation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_range: Option<String>,
    /// Number of rows touched.
    #[serde(default)]
    pub updated_rows: u64,
    /// Number of columns touched.
    #[serde(default)]
    pub updated_columns: u64,
    /// Number of cells touched.
    #[serde(default)]
    pub updated_cells: u64,
}

/// Outcome of a write or append through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The remote service applied the values.
    Applied(WriteSummary),
    /// The gateway is not configured; nothing was sent.
    Skipped,
}

/// Reachability of the spreadsheet service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No credential or spreadsheet id configured.
    Disabled,
    /// A probe read succeeded.
    Connected,
    /// The probe read failed.
    Error,
}

/// Result of probing the spreadsheet service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    /// Probe status.
    pub status: ConnectionStatus,
    /// Human readable detail.
    pub message: String,
    /// Spreadsheet the probe targeted, when connected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<String>,
}
