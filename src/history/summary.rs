//! Aggregate metrics over a filtered run set.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::{RunRecord, RunStatus, RunView};
use crate::duration::format_whole_seconds;

/// Runs per status on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub status: RunStatus,
    pub count: usize,
}

/// Headline numbers for a set of runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_runs: usize,
    pub avg_elapsed_seconds: f64,
    pub total_elapsed_seconds: f64,
    pub avg_execution_time: String,
    pub total_compute_time: String,
    /// Percentage (0-100) of runs whose status is the success label.
    pub success_rate_pct: f64,
    pub unique_warehouses: usize,
    pub unique_databases: usize,
    pub daily_counts: Vec<DailyCount>,
    /// Valid runs that were loaded but excluded by the filters.
    pub runs_outside_filter: usize,
    /// `total_runs - runs_outside_filter`: positive when the selection holds
    /// most of the loaded runs.
    pub runs_delta: i64,
}

impl RunSummary {
    /// Summarize a rendered view, comparing the selection against the rest
    /// of the loaded history.
    pub fn from_view(view: &RunView, success_status: &RunStatus) -> Self {
        let mut summary = Self::from_runs(&view.runs, success_status);
        summary.runs_outside_filter = view.runs_outside_filter();
        summary.runs_delta = summary.total_runs as i64 - summary.runs_outside_filter as i64;
        summary
    }

    pub fn from_runs(runs: &[RunRecord], success_status: &RunStatus) -> Self {
        let total_runs = runs.len();
        let total_elapsed_seconds: f64 = runs.iter().map(|r| r.elapsed_seconds()).sum();
        let (avg_elapsed_seconds, success_rate_pct) = if total_runs > 0 {
            let successes = runs.iter().filter(|r| r.status() == success_status).count();
            (
                total_elapsed_seconds / total_runs as f64,
                successes as f64 / total_runs as f64 * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        let unique_warehouses = runs
            .iter()
            .filter_map(|r| r.warehouse())
            .collect::<BTreeSet<_>>()
            .len();
        let unique_databases = runs
            .iter()
            .filter_map(|r| r.database())
            .collect::<BTreeSet<_>>()
            .len();

        let mut buckets: BTreeMap<(NaiveDate, &RunStatus), usize> = BTreeMap::new();
        for r in runs {
            *buckets.entry((r.reference_time().date_naive(), r.status())).or_default() += 1;
        }
        let daily_counts = buckets
            .into_iter()
            .map(|((date, status), count)| DailyCount {
                date,
                status: status.clone(),
                count,
            })
            .collect();

        Self {
            total_runs,
            avg_elapsed_seconds,
            total_elapsed_seconds,
            // sums and means of non-negative finite values stay in range
            avg_execution_time: format_whole_seconds(avg_elapsed_seconds as u64),
            total_compute_time: format_whole_seconds(total_elapsed_seconds as u64),
            success_rate_pct,
            unique_warehouses,
            unique_databases,
            daily_counts,
            runs_outside_filter: 0,
            runs_delta: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn rec(day: u32, status: &str, elapsed: f64, wh: &str, db: &str) -> RunRecord {
        RunRecord::new("q", at(day, 10), status, elapsed)
            .unwrap()
            .with_ended_at(Some(at(day, 10) + Duration::seconds(elapsed as i64)))
            .with_warehouse(Some(wh.to_string()))
            .with_database(Some(db.to_string()))
    }

    #[test]
    fn test_empty_summary() {
        let s = RunSummary::from_runs(&[], &RunStatus::new("SUCCESS"));
        assert_eq!(s.total_runs, 0);
        assert_eq!(s.success_rate_pct, 0.0);
        assert_eq!(s.avg_execution_time, "0sec");
        assert_eq!(s.total_compute_time, "0sec");
        assert!(s.daily_counts.is_empty());
        assert_eq!(s.runs_outside_filter, 0);
    }

    #[test]
    fn test_from_view_counts_runs_outside_filter() {
        let view = RunView {
            runs: vec![rec(1, "SUCCESS", 10.0, "WH1", "DB1")],
            rows: Vec::new(),
            loaded: 6,
            skipped: 1,
        };
        let s = RunSummary::from_view(&view, &RunStatus::new("SUCCESS"));
        assert_eq!(s.total_runs, 1);
        assert_eq!(s.runs_outside_filter, 4);
        assert_eq!(s.runs_delta, -3);
    }

    #[test]
    fn test_metrics() {
        let runs = vec![
            rec(1, "SUCCESS", 3600.0, "WH1", "DB1"),
            rec(1, "FAILED", 60.0, "WH1", "DB2"),
            rec(2, "SUCCESS", 1.0, "WH2", "DB1"),
            rec(2, "SUCCESS", 59.0, "WH2", "DB1"),
        ];
        let s = RunSummary::from_runs(&runs, &RunStatus::new("success"));
        assert_eq!(s.total_runs, 4);
        assert_eq!(s.total_elapsed_seconds, 3720.0);
        assert_eq!(s.avg_elapsed_seconds, 930.0);
        assert_eq!(s.total_compute_time, "1hr2min");
        assert_eq!(s.avg_execution_time, "15min30sec");
        assert_eq!(s.success_rate_pct, 75.0);
        assert_eq!(s.unique_warehouses, 2);
        assert_eq!(s.unique_databases, 2);

        let daily: Vec<(u32, &str, usize)> = s
            .daily_counts
            .iter()
            .map(|d| (chrono::Datelike::day(&d.date), d.status.as_str(), d.count))
            .collect();
        assert_eq!(daily, [(1, "FAILED", 1), (1, "SUCCESS", 1), (2, "SUCCESS", 2)]);
    }
}
