//! Raw query-history rows and their conversion into [`RunRecord`]s.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{RunRecord, RunStatus};

/// Why a query-history row could not become a [`RunRecord`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedRecordError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid timestamp in {field}: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("elapsed time must be non-negative, got {0}")]
    NegativeElapsed(f64),

    #[error("end time {end} is before start time {start}")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// One row of query-history output, as exported by the fetching side.
///
/// Column names follow the warehouse (`START_TIME`, `EXECUTION_STATUS`, ...);
/// lower-case aliases are accepted too. Every column is optional here and
/// checked during conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RawRunRow {
    #[serde(default, alias = "query_id")]
    pub query_id: Option<String>,
    #[serde(default, alias = "start_time")]
    pub start_time: Option<String>,
    #[serde(default, alias = "end_time")]
    pub end_time: Option<String>,
    #[serde(default, alias = "execution_status")]
    pub execution_status: Option<String>,
    /// Milliseconds, as the warehouse reports it.
    #[serde(default, alias = "total_elapsed_time")]
    pub total_elapsed_time: Option<f64>,
    #[serde(default, alias = "database_name")]
    pub database_name: Option<String>,
    #[serde(default, alias = "warehouse_name")]
    pub warehouse_name: Option<String>,
    #[serde(default, alias = "query_text")]
    pub query_text: Option<String>,
}

impl RawRunRow {
    /// Identifier used in log lines for this row.
    pub fn label(&self) -> &str {
        self.query_id.as_deref().unwrap_or("<unknown>")
    }
}

impl TryFrom<&RawRunRow> for RunRecord {
    type Error = MalformedRecordError;

    fn try_from(row: &RawRunRow) -> Result<Self, Self::Error> {
        let start_raw = row
            .start_time
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(MalformedRecordError::MissingField("START_TIME"))?;
        let started_at = parse_timestamp("START_TIME", start_raw)?;

        let ended_at = match row.end_time.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(parse_timestamp("END_TIME", s)?),
            _ => None,
        };

        let status = row
            .execution_status
            .as_deref()
            .map(RunStatus::new)
            .filter(|s| !s.is_empty())
            .ok_or(MalformedRecordError::MissingField("EXECUTION_STATUS"))?;

        let elapsed_seconds = match (ended_at, row.total_elapsed_time) {
            (Some(end), _) => {
                if end < started_at {
                    return Err(MalformedRecordError::EndBeforeStart {
                        start: started_at,
                        end,
                    });
                }
                (end - started_at).num_milliseconds() as f64 / 1000.0
            }
            (None, Some(ms)) => ms / 1000.0,
            (None, None) => return Err(MalformedRecordError::MissingField("END_TIME")),
        };

        Ok(RunRecord::new(
            row.query_id.clone().unwrap_or_default(),
            started_at,
            status,
            elapsed_seconds,
        )?
        .with_ended_at(ended_at)
        .with_database(row.database_name.clone())
        .with_warehouse(row.warehouse_name.clone())
        .with_query_text(row.query_text.clone()))
    }
}

/// Accepts RFC 3339 or the warehouse's `YYYY-MM-DD HH:MM:SS[.fff]` form (UTC).
fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, MalformedRecordError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(MalformedRecordError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}
