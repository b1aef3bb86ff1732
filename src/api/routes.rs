//! API route definitions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::state::AppState;
use crate::history::{
    build_view, CriteriaError, FilterCriteria, RunSummary, SortKey, SortOrder, TimeWindow,
    ViewRequest, WindowError,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/runs", get(list_runs))
        .route("/runs/{name}/artifacts", get(run_artifacts))
        .route("/summary", get(summary))
}

#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error("{0}")]
    BadParam(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

/// Query-string form of the dashboard's filter controls.
#[derive(Debug, Default, Deserialize)]
struct RunParams {
    window: Option<String>,
    /// Comma separated status labels.
    status: Option<String>,
    min_elapsed: Option<f64>,
    max_elapsed: Option<f64>,
    /// Inclusive end-date range, `YYYY-MM-DD`.
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    search: Option<String>,
    sort: Option<String>,
    order: Option<String>,
}

impl RunParams {
    fn into_request(self, default_window: TimeWindow) -> Result<ViewRequest, ApiError> {
        let time_window = match self.window.as_deref() {
            Some(w) => TimeWindow::parse(w)?,
            None => default_window,
        };

        let mut criteria = FilterCriteria::unbounded(time_window)
            .with_elapsed_bounds(self.min_elapsed, self.max_elapsed)?
            .with_date_range(self.from, self.to)?;
        if let Some(statuses) = self.status.as_deref() {
            let labels: Vec<&str> = statuses
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            criteria = criteria.with_statuses(labels);
        }

        let sort = match self.sort.as_deref() {
            Some(s) => s.parse::<SortKey>().map_err(ApiError::BadParam)?,
            None => SortKey::default(),
        };
        let order = match self.order.as_deref() {
            Some(o) => o.parse::<SortOrder>().map_err(ApiError::BadParam)?,
            None => SortOrder::default(),
        };

        Ok(ViewRequest {
            criteria,
            search: self.search,
            sort,
            order,
        })
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn list_runs(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
) -> Result<Json<Value>, ApiError> {
    let request = params.into_request(state.config.dashboard.default_window)?;
    let view = build_view(&state.rows, &request, chrono::Utc::now());
    Ok(Json(json!({
        "data": view.rows,
        "meta": {
            "total": view.rows.len(),
            "loaded": view.loaded,
            "skipped": view.skipped,
            "window": request.criteria.time_window.label(),
            "source": state.config.warehouse.history_table,
        }
    })))
}

async fn run_artifacts(State(state): State<AppState>, Path(name): Path<String>) -> Json<Value> {
    Json(json!({
        "data": state.config.warehouse.artifact_paths(&name),
        "meta": {
            "run_name": name,
            "stage": state.config.warehouse.workdir_stage,
        }
    }))
}

async fn summary(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
) -> Result<Json<Value>, ApiError> {
    let request = params.into_request(state.config.dashboard.default_window)?;
    let view = build_view(&state.rows, &request, chrono::Utc::now());
    let summary = RunSummary::from_view(&view, &state.config.dashboard.success_status());
    Ok(Json(json!({
        "data": summary,
        "meta": {
            "loaded": view.loaded,
            "skipped": view.skipped,
            "window": request.criteria.time_window.label(),
            "source": state.config.warehouse.history_table,
        }
    })))
}
