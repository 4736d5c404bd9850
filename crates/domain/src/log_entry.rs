//! Telemetry log rows recorded into the spreadsheet log tabs.
//!
//! Each log kind owns a fixed column layout. Rows are append-only from the
//! relay's point of view: they are formatted once and never updated.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use resoluty_core::{AppError, AppResult, NonEmptyString};
use serde::Serialize;
use serde_json::Value;

use crate::sheet::{CellValue, Row};

/// Maximum number of characters kept from serialized details.
pub const DETAILS_MAX_CHARS: usize = 500;

/// User id recorded when the caller does not supply one.
pub const DEFAULT_USER_ID: &str = "frontend-user";

const LOCAL_TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Kinds of telemetry rows, each with its own tab and column schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogKind {
    /// Action performed by a dashboard user.
    UserAction,
    /// Event emitted by the frontend itself.
    FrontendEvent,
}

impl LogKind {
    /// Returns every log kind.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[LogKind] = &[LogKind::UserAction, LogKind::FrontendEvent];

        ALL
    }

    /// Returns the stable transport value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserAction => "user-action",
            Self::FrontendEvent => "frontend-event",
        }
    }

    /// Returns the full range that holds rows of this kind.
    #[must_use]
    pub fn range(&self) -> &'static str {
        match self {
            Self::UserAction => "UserActions!A:E",
            Self::FrontendEvent => "FrontendEvents!A:D",
        }
    }

    /// Returns the range of the header row for this kind's tab.
    #[must_use]
    pub fn header_range(&self) -> &'static str {
        match self {
            Self::UserAction => "UserActions!A1:E1",
            Self::FrontendEvent => "FrontendEvents!A1:D1",
        }
    }

    /// Returns the header labels written to the first row of the tab.
    #[must_use]
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            Self::UserAction => &["Data/Hora", "User ID", "Ação", "Detalhes", "Timestamp"],
            Self::FrontendEvent => &["Data/Hora", "Evento", "Detalhes", "Timestamp"],
        }
    }

    /// Returns the number of columns a well-formed row carries.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.headers().len()
    }

    /// Returns the zero-based column holding the ISO-8601 timestamp.
    #[must_use]
    pub fn timestamp_column(&self) -> usize {
        self.column_count() - 1
    }
}

impl FromStr for LogKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user-action" => Ok(Self::UserAction),
            "frontend-event" => Ok(Self::FrontendEvent),
            _ => Err(AppError::Validation(format!(
                "unsupported log type '{value}'"
            ))),
        }
    }
}

/// The two renderings of the instant a row was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTimestamp {
    local: String,
    iso: String,
}

impl LogTimestamp {
    /// Renders `instant` as a display string at `display_offset` and as
    /// RFC 3339 UTC with millisecond precision.
    #[must_use]
    pub fn at(instant: DateTime<Utc>, display_offset: FixedOffset) -> Self {
        Self {
            local: instant
                .with_timezone(&display_offset)
                .format(LOCAL_TIMESTAMP_FORMAT)
                .to_string(),
            iso: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Returns the display rendering.
    #[must_use]
    pub fn local(&self) -> &str {
        self.local.as_str()
    }

    /// Returns the ISO-8601 rendering.
    #[must_use]
    pub fn iso(&self) -> &str {
        self.iso.as_str()
    }
}

/// A user action awaiting serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAction {
    user_id: NonEmptyString,
    action: NonEmptyString,
    details: Value,
}

impl UserAction {
    /// Creates a user action, falling back to [`DEFAULT_USER_ID`] for a
    /// missing or blank user id.
    pub fn new(action: impl Into<String>, details: Value, user_id: Option<String>) -> AppResult<Self> {
        let action = NonEmptyString::new(action)
            .map_err(|_| AppError::Validation("user action requires 'action'".to_owned()))?;
        let user_id = user_id
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_ID.to_owned());

        Ok(Self {
            user_id: NonEmptyString::new(user_id)?,
            action,
            details,
        })
    }

    /// Returns the acting user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    /// Returns the action name.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }
}

/// A frontend event awaiting serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontendEvent {
    event: NonEmptyString,
    details: Value,
}

impl FrontendEvent {
    /// Creates a frontend event.
    pub fn new(event: impl Into<String>, details: Value) -> AppResult<Self> {
        let event = NonEmptyString::new(event)
            .map_err(|_| AppError::Validation("frontend event requires 'event'".to_owned()))?;

        Ok(Self { event, details })
    }

    /// Returns the event name.
    #[must_use]
    pub fn event(&self) -> &str {
        self.event.as_str()
    }
}

/// A semantic telemetry record.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    /// See [`UserAction`].
    UserAction(UserAction),
    /// See [`FrontendEvent`].
    FrontendEvent(FrontendEvent),
}

impl LogEntry {
    /// Returns the kind of this entry.
    #[must_use]
    pub fn kind(&self) -> LogKind {
        match self {
            Self::UserAction(_) => LogKind::UserAction,
            Self::FrontendEvent(_) => LogKind::FrontendEvent,
        }
    }

    /// Returns the action or event name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::UserAction(entry) => entry.action(),
            Self::FrontendEvent(entry) => entry.event(),
        }
    }

    /// Formats the entry into its kind's fixed column layout.
    #[must_use]
    pub fn to_row(&self, timestamp: &LogTimestamp) -> Row {
        match self {
            Self::UserAction(entry) => vec![
                CellValue::from(timestamp.local()),
                CellValue::from(entry.user_id()),
                CellValue::from(entry.action()),
                CellValue::from(serialize_details(&entry.details)),
                CellValue::from(timestamp.iso()),
            ],
            Self::FrontendEvent(entry) => vec![
                CellValue::from(timestamp.local()),
                CellValue::from(entry.event()),
                CellValue::from(serialize_details(&entry.details)),
                CellValue::from(timestamp.iso()),
            ],
        }
    }
}

impl From<UserAction> for LogEntry {
    fn from(value: UserAction) -> Self {
        Self::UserAction(value)
    }
}

impl From<FrontendEvent> for LogEntry {
    fn from(value: FrontendEvent) -> Self {
        Self::FrontendEvent(value)
    }
}

/// Serializes details as compact JSON capped at [`DETAILS_MAX_CHARS`] characters.
#[must_use]
pub fn serialize_details(details: &Value) -> String {
    let serialized = details.to_string();
    match serialized.char_indices().nth(DETAILS_MAX_CHARS) {
        Some((cut, _)) => serialized[..cut].to_owned(),
        None => serialized,
    }
}

/// Observable outcome of a best-effort log write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LogDelivery {
    /// The row reached the spreadsheet.
    Sent,
    /// The gateway is disabled; nothing was written.
    Skipped,
    /// The write failed and was absorbed.
    Failed {
        /// Failure message from the gateway.
        reason: String,
    },
}
