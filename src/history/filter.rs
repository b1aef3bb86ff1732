//! Stable, in-memory filtering of run history.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::{RawRunRow, RunRecord, RunStatus, TimeWindow};

/// A constraint combination that can never be satisfied or is not a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriteriaError {
    #[error("{name} must be a finite number of seconds, got {value}")]
    NonFiniteBound { name: &'static str, value: f64 },

    #[error("minimum execution time {min}s is greater than maximum {max}s")]
    ReversedElapsed { min: f64, max: f64 },

    #[error("start date {from} cannot be after end date {to}")]
    ReversedDates { from: NaiveDate, to: NaiveDate },
}

/// The user's current view constraints. Rebuilt for every request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub time_window: TimeWindow,
    /// `None` (or an empty set) keeps every status.
    pub status_filter: Option<BTreeSet<RunStatus>>,
    pub min_elapsed_seconds: Option<f64>,
    pub max_elapsed_seconds: Option<f64>,
    /// Inclusive UTC calendar dates, checked against the run's end time
    /// (start time for unfinished runs).
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl FilterCriteria {
    /// Only the time window constrains the result.
    pub fn unbounded(time_window: TimeWindow) -> Self {
        Self {
            time_window,
            ..Default::default()
        }
    }

    pub fn with_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RunStatus>,
    {
        self.status_filter = Some(statuses.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_elapsed_bounds(
        mut self,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<Self, CriteriaError> {
        self.min_elapsed_seconds = min;
        self.max_elapsed_seconds = max;
        self.validate()?;
        Ok(self)
    }

    pub fn with_date_range(
        mut self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Self, CriteriaError> {
        self.from_date = from;
        self.to_date = to;
        self.validate()?;
        Ok(self)
    }

    /// Reject NaN/infinite bounds and reversed ranges.
    pub fn validate(&self) -> Result<(), CriteriaError> {
        for (name, bound) in [
            ("min_elapsed", self.min_elapsed_seconds),
            ("max_elapsed", self.max_elapsed_seconds),
        ] {
            if let Some(value) = bound {
                if !value.is_finite() {
                    return Err(CriteriaError::NonFiniteBound { name, value });
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_elapsed_seconds, self.max_elapsed_seconds) {
            if min > max {
                return Err(CriteriaError::ReversedElapsed { min, max });
            }
        }
        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            if from > to {
                return Err(CriteriaError::ReversedDates { from, to });
            }
        }
        Ok(())
    }

    /// True when `record` satisfies every active constraint.
    pub fn matches(&self, record: &RunRecord, now: DateTime<Utc>) -> bool {
        let start = self.time_window.start(now);
        if record.started_at() < start || record.started_at() > now {
            return false;
        }

        if let Some(allowed) = &self.status_filter {
            if !allowed.is_empty() && !allowed.contains(record.status()) {
                return false;
            }
        }

        if let Some(min) = self.min_elapsed_seconds {
            if record.elapsed_seconds() < min {
                return false;
            }
        }
        if let Some(max) = self.max_elapsed_seconds {
            if record.elapsed_seconds() > max {
                return false;
            }
        }

        let day = record.reference_time().date_naive();
        if self.from_date.is_some_and(|from| day < from) {
            return false;
        }
        if self.to_date.is_some_and(|to| day > to) {
            return false;
        }

        true
    }
}

/// Keep the records matching `criteria`, in input order.
pub fn filter_runs(records: &[RunRecord], criteria: &FilterCriteria, now: DateTime<Utc>) -> Vec<RunRecord> {
    records
        .iter()
        .filter(|r| criteria.matches(r, now))
        .cloned()
        .collect()
}

/// Result of filtering raw rows: the retained records and how many rows
/// were dropped as malformed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOutcome {
    pub runs: Vec<RunRecord>,
    pub skipped: usize,
}

/// Convert and filter raw query-history rows.
///
/// Rows that fail conversion are logged and counted; the rest of the batch
/// is still processed.
pub fn filter_rows(rows: &[RawRunRow], criteria: &FilterCriteria, now: DateTime<Utc>) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for row in rows {
        match RunRecord::try_from(row) {
            Ok(record) => {
                if criteria.matches(&record, now) {
                    outcome.runs.push(record);
                }
            }
            Err(e) => {
                warn!(query_id = row.label(), error = %e, "skipping malformed history row");
                outcome.skipped += 1;
            }
        }
    }

    debug!(
        total = rows.len(),
        kept = outcome.runs.len(),
        skipped = outcome.skipped,
        window = %criteria.time_window,
        "filtered run history"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap()
    }

    fn run(id: &str, hours_ago: i64, status: &str, elapsed: f64) -> RunRecord {
        RunRecord::new(id, now() - Duration::hours(hours_ago), status, elapsed).unwrap()
    }

    fn ids(runs: &[RunRecord]) -> Vec<&str> {
        runs.iter().map(|r| r.query_id()).collect()
    }

    #[test]
    fn test_no_bounds_is_identity() {
        let records = vec![
            run("a", 1, "SUCCESS", 30.0),
            run("b", 5, "FAILED", 0.0),
            run("c", 20, "RUNNING", 7325.0),
        ];
        let criteria = FilterCriteria::unbounded(TimeWindow::default());
        assert_eq!(filter_runs(&records, &criteria, now()), records);
    }

    #[test]
    fn test_empty_input() {
        let criteria = FilterCriteria::unbounded(TimeWindow::default());
        assert!(filter_runs(&[], &criteria, now()).is_empty());
        let outcome = filter_rows(&[], &criteria, now());
        assert!(outcome.runs.is_empty());
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_max_elapsed_scenario() {
        let records = vec![
            run("a", 1, "SUCCESS", 30.0),
            run("b", 2, "SUCCESS", 3661.0),
            run("c", 3, "SUCCESS", 7325.0),
        ];
        let criteria =
            FilterCriteria::unbounded(TimeWindow::default())
                .with_elapsed_bounds(None, Some(3700.0))
                .unwrap();
        let out = filter_runs(&records, &criteria, now());
        assert_eq!(ids(&out), ["a", "b"]);
        let formatted: Vec<String> = out.iter().map(|r| r.formatted_elapsed()).collect();
        assert_eq!(formatted, ["30sec", "1hr1min1sec"]);
    }

    #[test]
    fn test_elapsed_bounds_inclusive() {
        let records = vec![
            run("a", 1, "SUCCESS", 59.0),
            run("b", 1, "SUCCESS", 60.0),
            run("c", 1, "SUCCESS", 120.0),
            run("d", 1, "SUCCESS", 121.0),
        ];
        let criteria = FilterCriteria::unbounded(TimeWindow::default())
            .with_elapsed_bounds(Some(60.0), Some(120.0))
            .unwrap();
        assert_eq!(ids(&filter_runs(&records, &criteria, now())), ["b", "c"]);

        let only_min =
            FilterCriteria::unbounded(TimeWindow::default())
                .with_elapsed_bounds(Some(100.0), None)
                .unwrap();
        assert_eq!(ids(&filter_runs(&records, &only_min, now())), ["c", "d"]);
    }

    #[test]
    fn test_invalid_elapsed_bounds_rejected() {
        let base = FilterCriteria::unbounded(TimeWindow::default());
        assert_eq!(
            base.clone().with_elapsed_bounds(Some(200.0), Some(100.0)),
            Err(CriteriaError::ReversedElapsed { min: 200.0, max: 100.0 })
        );
        assert!(matches!(
            base.clone().with_elapsed_bounds(None, Some(f64::NAN)),
            Err(CriteriaError::NonFiniteBound { name: "max_elapsed", .. })
        ));
        assert!(matches!(
            base.clone().with_elapsed_bounds(Some(f64::INFINITY), None),
            Err(CriteriaError::NonFiniteBound { name: "min_elapsed", .. })
        ));
        assert!(base.with_elapsed_bounds(Some(60.0), Some(60.0)).is_ok());
    }

    #[test]
    fn test_date_range_inclusive() {
        let day = |d: u32| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        // now() is 2025-03-02 12:00, so 30h ago falls on 03-01 and 1h ago on 03-02
        let records = vec![
            run("first-day", 30, "SUCCESS", 10.0),
            run("second-day", 1, "SUCCESS", 10.0),
        ];
        let window = TimeWindow::parse("2d").unwrap();

        let both = FilterCriteria::unbounded(window)
            .with_date_range(Some(day(1)), Some(day(2)))
            .unwrap();
        assert_eq!(ids(&filter_runs(&records, &both, now())), ["first-day", "second-day"]);

        let only_first = FilterCriteria::unbounded(window)
            .with_date_range(Some(day(1)), Some(day(1)))
            .unwrap();
        assert_eq!(ids(&filter_runs(&records, &only_first, now())), ["first-day"]);

        let from_second = FilterCriteria::unbounded(window)
            .with_date_range(Some(day(2)), None)
            .unwrap();
        assert_eq!(ids(&filter_runs(&records, &from_second, now())), ["second-day"]);
    }

    #[test]
    fn test_date_range_uses_end_time() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        // starts on 03-01 at 23:00, finishes on 03-02
        let started = Utc.with_ymd_and_hms(2025, 3, 1, 23, 0, 0).unwrap();
        let rec = RunRecord::new("overnight", started, "SUCCESS", 7200.0)
            .unwrap()
            .with_ended_at(Some(started + Duration::hours(2)));
        let criteria = FilterCriteria::unbounded(TimeWindow::default())
            .with_date_range(Some(day), Some(day))
            .unwrap();
        assert_eq!(filter_runs(&[rec], &criteria, now()).len(), 1);
    }

    #[test]
    fn test_reversed_date_range_rejected() {
        let from = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let err = FilterCriteria::unbounded(TimeWindow::default())
            .with_date_range(Some(from), Some(to))
            .unwrap_err();
        assert_eq!(err, CriteriaError::ReversedDates { from, to });
        assert!(err.to_string().contains("cannot be after"));
    }

    #[test]
    fn test_time_window_bounds() {
        let records = vec![
            run("inside", 5, "SUCCESS", 1.0),
            run("edge", 6, "SUCCESS", 1.0),
            run("outside", 7, "SUCCESS", 1.0),
            RunRecord::new("future", now() + Duration::minutes(1), "SUCCESS", 1.0).unwrap(),
        ];
        let criteria = FilterCriteria::unbounded(TimeWindow::parse("6h").unwrap());
        assert_eq!(ids(&filter_runs(&records, &criteria, now())), ["inside", "edge"]);
    }

    #[test]
    fn test_status_filter() {
        let records = vec![
            run("a", 1, "SUCCESS", 1.0),
            run("b", 1, "FAILED", 1.0),
            run("c", 1, "CANCELLED", 1.0),
            run("d", 1, "SUCCESS", 1.0),
        ];
        let criteria =
            FilterCriteria::unbounded(TimeWindow::default()).with_statuses(["success", "cancelled"]);
        assert_eq!(ids(&filter_runs(&records, &criteria, now())), ["a", "c", "d"]);

        let empty = FilterCriteria::unbounded(TimeWindow::default())
            .with_statuses(Vec::<RunStatus>::new());
        assert_eq!(filter_runs(&records, &empty, now()).len(), 4);
    }

    #[test]
    fn test_order_preserved() {
        let records: Vec<RunRecord> = (0..20)
            .map(|i| run(&format!("r{i:02}"), (i % 7) as i64, "SUCCESS", (i * 97 % 500) as f64))
            .collect();
        let criteria = FilterCriteria::unbounded(TimeWindow::default())
            .with_elapsed_bounds(Some(50.0), Some(400.0))
            .unwrap();
        let out = filter_runs(&records, &criteria, now());
        let positions: Vec<usize> = out
            .iter()
            .map(|r| records.iter().position(|x| x.query_id() == r.query_id()).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(out.iter().all(|r| r.elapsed_seconds() <= 400.0));
    }

    #[test]
    fn test_filter_rows_skips_malformed() {
        let good = |id: &str| RawRunRow {
            query_id: Some(id.to_string()),
            start_time: Some("2025-03-02T10:00:00Z".to_string()),
            end_time: Some("2025-03-02T10:00:30Z".to_string()),
            execution_status: Some("SUCCESS".to_string()),
            ..Default::default()
        };
        let missing_elapsed = RawRunRow {
            query_id: Some("bad".to_string()),
            start_time: Some("2025-03-02T10:00:00Z".to_string()),
            execution_status: Some("SUCCESS".to_string()),
            ..Default::default()
        };
        let rows = vec![good("a"), missing_elapsed, RawRunRow::default(), good("b")];

        let criteria = FilterCriteria::unbounded(TimeWindow::default());
        let outcome = filter_rows(&rows, &criteria, now());
        assert_eq!(ids(&outcome.runs), ["a", "b"]);
        assert_eq!(outcome.skipped, 2);
    }
}
