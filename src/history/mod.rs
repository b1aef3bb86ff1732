//! Run history: records, filtering, table views and summary metrics.

pub mod filter;
pub mod record;
pub mod summary;
pub mod table;
pub mod view;
pub mod window;

pub use self::filter::{filter_rows, filter_runs, CriteriaError, FilterCriteria, FilterOutcome};
pub use self::record::{MalformedRecordError, RawRunRow};
pub use self::summary::RunSummary;
pub use self::table::{RunRow, SortKey, SortOrder};
pub use self::view::{build_view, RunView, ViewRequest};
pub use self::window::{TimeWindow, WindowError};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::format_whole_seconds;

/// Outcome label of a run, as reported by the warehouse.
///
/// The set of labels is warehouse-defined, so this is an open string rather
/// than a closed enum. Labels are upper-cased on construction so that
/// `"success"` and `"SUCCESS"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RunStatus(String);

impl RunStatus {
    pub fn new(label: &str) -> Self {
        Self(label.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for RunStatus {
    fn from(label: String) -> Self {
        Self::new(&label)
    }
}

impl From<&str> for RunStatus {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.0
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One historic pipeline execution observed in query-history data.
///
/// Fields are read-only after construction. Every constructor, including
/// deserialization, rejects a negative or non-finite elapsed time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RunRecordFields")]
pub struct RunRecord {
    query_id: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    status: RunStatus,
    elapsed_seconds: f64,
    database: Option<String>,
    warehouse: Option<String>,
    query_text: Option<String>,
}

/// Unchecked wire form of [`RunRecord`].
#[derive(Deserialize)]
struct RunRecordFields {
    query_id: String,
    started_at: DateTime<Utc>,
    #[serde(default)]
    ended_at: Option<DateTime<Utc>>,
    status: RunStatus,
    elapsed_seconds: f64,
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    warehouse: Option<String>,
    #[serde(default)]
    query_text: Option<String>,
}

impl TryFrom<RunRecordFields> for RunRecord {
    type Error = MalformedRecordError;

    fn try_from(f: RunRecordFields) -> Result<Self, Self::Error> {
        let mut record = RunRecord::new(f.query_id, f.started_at, f.status, f.elapsed_seconds)?;
        record.ended_at = f.ended_at;
        record.database = f.database;
        record.warehouse = f.warehouse;
        record.query_text = f.query_text;
        Ok(record)
    }
}

impl RunRecord {
    /// Build a record with only the fields the filter needs.
    pub fn new(
        query_id: impl Into<String>,
        started_at: DateTime<Utc>,
        status: impl Into<RunStatus>,
        elapsed_seconds: f64,
    ) -> Result<Self, MalformedRecordError> {
        if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
            return Err(MalformedRecordError::NegativeElapsed(elapsed_seconds));
        }
        Ok(Self {
            query_id: query_id.into(),
            started_at,
            ended_at: None,
            status: status.into(),
            elapsed_seconds,
            database: None,
            warehouse: None,
            query_text: None,
        })
    }

    pub fn with_ended_at(mut self, ended_at: Option<DateTime<Utc>>) -> Self {
        self.ended_at = ended_at;
        self
    }

    pub fn with_database(mut self, database: Option<String>) -> Self {
        self.database = database;
        self
    }

    pub fn with_warehouse(mut self, warehouse: Option<String>) -> Self {
        self.warehouse = warehouse;
        self
    }

    pub fn with_query_text(mut self, query_text: Option<String>) -> Self {
        self.query_text = query_text;
        self
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Always finite and non-negative.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn warehouse(&self) -> Option<&str> {
        self.warehouse.as_deref()
    }

    pub fn query_text(&self) -> Option<&str> {
        self.query_text.as_deref()
    }

    /// The elapsed time as a human-readable string.
    pub fn formatted_elapsed(&self) -> String {
        format_whole_seconds(self.elapsed_seconds.trunc() as u64)
    }

    /// End time when known, start time otherwise. Used for ordering and
    /// day bucketing.
    pub fn reference_time(&self) -> DateTime<Utc> {
        self.ended_at.unwrap_or(self.started_at)
    }
}
