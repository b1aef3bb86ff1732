//! Filter, search and sort in one pass, as a page render needs them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::table::{search, sort_runs};
use super::{filter_rows, FilterCriteria, RawRunRow, RunRecord, RunRow, SortKey, SortOrder};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewRequest {
    pub criteria: FilterCriteria,
    pub search: Option<String>,
    pub sort: SortKey,
    pub order: SortOrder,
}

/// Runs selected for display, plus bookkeeping for the "showing X of Y" line.
#[derive(Debug, Clone, Serialize)]
pub struct RunView {
    #[serde(skip)]
    pub runs: Vec<RunRecord>,
    pub rows: Vec<RunRow>,
    pub loaded: usize,
    pub skipped: usize,
}

impl RunView {
    /// Valid rows that the filters or search left out.
    pub fn runs_outside_filter(&self) -> usize {
        self.loaded.saturating_sub(self.skipped + self.runs.len())
    }
}

pub fn build_view(rows: &[RawRunRow], request: &ViewRequest, now: DateTime<Utc>) -> RunView {
    let outcome = filter_rows(rows, &request.criteria, now);
    let mut runs = match request.search.as_deref() {
        Some(q) => search(outcome.runs, q),
        None => outcome.runs,
    };
    sort_runs(&mut runs, request.sort, request.order);
    let display = runs.iter().map(RunRow::from).collect();
    RunView {
        runs,
        rows: display,
        loaded: rows.len(),
        skipped: outcome.skipped,
    }
}
