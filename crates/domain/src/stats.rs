use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::log_entry::LogKind;
use crate::sheet::Row;

/// Width of the sliding window used for the recent-activity counter.
pub const RECENT_WINDOW_HOURS: i64 = 24;

/// Row counters for one log tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogCounts {
    /// Every row returned by the read, well-formed or not.
    pub total: usize,
    /// Well-formed rows stamped strictly after `now - 24h`.
    #[serde(rename = "last24h")]
    pub last_24h: usize,
}

impl LogCounts {
    /// Counts `rows` of `kind` relative to `now`.
    ///
    /// Rows shorter than the kind's column count, and rows whose timestamp
    /// column is not an ISO 8601 date-time, are left out of `last_24h` but
    /// still counted in `total`. Timestamps without an offset are read as UTC.
    #[must_use]
    pub fn from_rows(kind: LogKind, rows: &[Row], now: DateTime<Utc>) -> Self {
        let cutoff = now - Duration::hours(RECENT_WINDOW_HOURS);
        let last_24h = rows
            .iter()
            .filter_map(|row| row_timestamp(kind, row))
            .filter(|stamped_at| *stamped_at > cutoff)
            .count();

        Self {
            total: rows.len(),
            last_24h,
        }
    }
}

fn row_timestamp(kind: LogKind, row: &Row) -> Option<DateTime<Utc>> {
    if row.len() < kind.column_count() {
        return None;
    }

    let raw = row.get(kind.timestamp_column())?.as_text()?.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
        })
        .ok()
}

/// Usage counters for both log tabs, computed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Counters for the user action tab.
    pub user_actions: LogCounts,
    /// Counters for the frontend event tab.
    pub frontend_events: LogCounts,
    /// Moment the snapshot was computed, RFC 3339 UTC.
    pub last_update: String,
}

impl StatsSnapshot {
    /// Builds a snapshot from the rows of both log tabs.
    #[must_use]
    pub fn compute(user_action_rows: &[Row], frontend_event_rows: &[Row], now: DateTime<Utc>) -> Self {
        Self {
            user_actions: LogCounts::from_rows(LogKind::UserAction, user_action_rows, now),
            frontend_events: LogCounts::from_rows(LogKind::FrontendEvent, frontend_event_rows, now),
            last_update: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
