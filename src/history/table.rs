//! Tabular view of run history: search, sort, and display rows.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RunRecord;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column to sort the run table by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    EndTime,
    ExecutionTime,
    Status,
    QueryId,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "end-time" => Ok(Self::EndTime),
            "execution-time" => Ok(Self::ExecutionTime),
            "status" => Ok(Self::Status),
            "query-id" => Ok(Self::QueryId),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("asc"),
            Self::Descending => f.write_str("desc"),
        }
    }
}

/// Case-insensitive substring search over query id, database and query text.
/// An empty query keeps everything.
pub fn search(records: Vec<RunRecord>, query: &str) -> Vec<RunRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records;
    }
    let hit = |field: Option<&str>| field.is_some_and(|v| v.to_lowercase().contains(&needle));
    records
        .into_iter()
        .filter(|r| {
            hit(Some(r.query_id())) || hit(r.database()) || hit(r.query_text())
        })
        .collect()
}

/// Stable sort; ties keep their input order in both directions.
pub fn sort_runs(records: &mut [RunRecord], key: SortKey, order: SortOrder) {
    records.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

fn compare(a: &RunRecord, b: &RunRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::EndTime => a.reference_time().cmp(&b.reference_time()),
        SortKey::ExecutionTime => a.elapsed_seconds().total_cmp(&b.elapsed_seconds()),
        SortKey::Status => a.status().cmp(b.status()),
        SortKey::QueryId => a.query_id().cmp(b.query_id()),
    }
}

/// A display-ready row handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRow {
    pub query_id: String,
    pub end_time: String,
    pub status: String,
    pub database: Option<String>,
    pub warehouse: Option<String>,
    pub elapsed_seconds: f64,
    pub execution_time: String,
}

impl From<&RunRecord> for RunRow {
    fn from(r: &RunRecord) -> Self {
        Self {
            query_id: r.query_id().to_string(),
            end_time: r.reference_time().format(TIME_FORMAT).to_string(),
            status: r.status().to_string(),
            database: r.database().map(String::from),
            warehouse: r.warehouse().map(String::from),
            elapsed_seconds: r.elapsed_seconds(),
            execution_time: r.formatted_elapsed(),
        }
    }
}
