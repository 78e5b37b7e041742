use crate::infra::{deserialize_optional_date, AppState, FilterInput, ViewerInput};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::extract::Query;
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use taskboard::error::AppError;
use taskboard::workflows::dashboard::report::views::{DashboardInsights, DashboardSummary};
use taskboard::workflows::dashboard::{
    filter_tasks, ColumnLayout, RawRow, TaskDetailView, ViewWindow,
};
use taskboard::workflows::refresh::{DashboardSnapshot, RefreshOutcome};
use taskboard::workflows::sheets::{count_active_staff, SheetImporter};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardReportRequest {
    /// Positional task rows, as a row source would deliver them.
    #[serde(default)]
    pub(crate) rows: Option<Vec<RawRow>>,
    /// CSV export of the task sheet, used when `rows` is absent.
    #[serde(default)]
    pub(crate) tasks_csv: Option<String>,
    #[serde(default)]
    pub(crate) roster_rows: Option<Vec<RawRow>>,
    #[serde(default)]
    pub(crate) roster_csv: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) viewer: ViewerInput,
    #[serde(default)]
    pub(crate) filter: FilterInput,
    #[serde(default)]
    pub(crate) view: ViewWindow,
    #[serde(default)]
    pub(crate) include_tasks: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardReportResponse {
    pub(crate) today: NaiveDate,
    pub(crate) data_source: ReportDataSource,
    pub(crate) summary: DashboardSummary,
    pub(crate) insights: DashboardInsights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) active_staff: Option<usize>,
    pub(crate) view: ViewWindow,
    pub(crate) matching_tasks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tasks: Option<Vec<TaskDetailView>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ReportDataSource {
    Rows,
    Csv,
}

impl ReportDataSource {
    fn label(self) -> &'static str {
        match self {
            Self::Rows => "inline rows",
            Self::Csv => "inline csv",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RefreshRequest {
    #[serde(default)]
    pub(crate) sheet: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) viewer: ViewerInput,
}

pub(crate) fn dashboard_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/dashboard/report", post(dashboard_report_endpoint))
        .route("/api/v1/dashboard/refresh", post(dashboard_refresh_endpoint))
        .route("/api/v1/dashboard/current", get(current_dashboard_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready", "live_source": state.dashboard.is_some() })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn dashboard_report_endpoint(
    Json(payload): Json<DashboardReportRequest>,
) -> Result<Json<DashboardReportResponse>, AppError> {
    let DashboardReportRequest {
        rows,
        tasks_csv,
        roster_rows,
        roster_csv,
        today,
        viewer,
        filter,
        view,
        include_tasks,
    } = payload;

    let viewer = viewer.resolve()?;
    let criteria = filter.criteria()?;

    let (rows, data_source) = match (rows, tasks_csv) {
        (Some(rows), _) => (rows, ReportDataSource::Rows),
        (None, Some(csv)) => {
            let payload = SheetImporter::from_reader(Cursor::new(csv.into_bytes()))?;
            payload.validate_layout(&ColumnLayout::STANDARD)?;
            (payload.rows, ReportDataSource::Csv)
        }
        (None, None) => {
            return Err(AppError::InvalidInput(
                "either rows or tasks_csv is required".to_string(),
            ))
        }
    };

    let active_staff = match (roster_rows, roster_csv) {
        (Some(roster), _) => Some(count_active_staff(&roster)),
        (None, Some(csv)) => {
            let roster = SheetImporter::from_reader(Cursor::new(csv.into_bytes()))?;
            Some(count_active_staff(&roster.rows))
        }
        (None, None) => None,
    };

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let snapshot = DashboardSnapshot::from_rows(
        0,
        data_source.label(),
        today,
        &rows,
        viewer.as_ref(),
        active_staff,
    );

    let matching = filter_tasks(&snapshot.tasks, &criteria, view, today);
    let matching_tasks = matching.len();
    let tasks = include_tasks.then(|| matching.into_iter().map(|task| task.to_view()).collect());

    Ok(Json(DashboardReportResponse {
        today,
        data_source,
        summary: snapshot.summary,
        insights: snapshot.insights,
        active_staff,
        view,
        matching_tasks,
        tasks,
    }))
}

pub(crate) async fn dashboard_refresh_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Response, AppError> {
    let service = state
        .dashboard
        .clone()
        .ok_or(AppError::Unavailable("live row source"))?;

    let viewer = payload.viewer.resolve()?;
    let sheet = payload
        .sheet
        .filter(|sheet| !sheet.trim().is_empty())
        .unwrap_or_else(|| state.default_sheet.clone());
    let today = payload
        .today
        .unwrap_or_else(|| Local::now().date_naive());

    let response = match service.refresh(&sheet, today, viewer.as_ref()).await? {
        RefreshOutcome::Applied(snapshot) => {
            (StatusCode::OK, Json(DashboardSnapshot::clone(&snapshot))).into_response()
        }
        RefreshOutcome::Discarded { generation, latest } => (
            StatusCode::CONFLICT,
            Json(json!({
                "status": "discarded",
                "generation": generation,
                "latest_generation": latest,
            })),
        )
            .into_response(),
    };
    Ok(response)
}

/// Latest snapshot refreshed for the viewer named by `?role=&name=`.
pub(crate) async fn current_dashboard_endpoint(
    Extension(state): Extension<AppState>,
    Query(viewer): Query<ViewerInput>,
) -> Result<Response, AppError> {
    let viewer = viewer.resolve()?;
    let current = state
        .dashboard
        .as_ref()
        .and_then(|service| service.current(viewer.as_ref()));

    let response = match current {
        Some(snapshot) => Json(DashboardSnapshot::clone(&snapshot)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no dashboard snapshot has been applied for this viewer" })),
        )
            .into_response(),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;
    use taskboard::workflows::dashboard::CellValue;
    use taskboard::workflows::refresh::DashboardService;
    use taskboard::workflows::sheets::SheetsClient;
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(handle),
            dashboard: None,
            default_sheet: "DATA".to_string(),
        }
    }

    fn task_row(title: &str, assignee: &str, due: &str, completed: &str) -> RawRow {
        let mut cells = vec![CellValue::Empty; 13];
        cells[4] = CellValue::from_text(assignee);
        cells[6] = CellValue::from_text(title);
        cells[11] = CellValue::from_text(due);
        cells[12] = CellValue::from_text(completed);
        RawRow::new(cells)
    }

    fn request(rows: Vec<RawRow>) -> DashboardReportRequest {
        DashboardReportRequest {
            rows: Some(rows),
            today: NaiveDate::from_ymd_opt(2025, 4, 20),
            ..DashboardReportRequest::default()
        }
    }

    #[tokio::test]
    async fn report_endpoint_aggregates_inline_rows() {
        let rows = vec![
            task_row("Open shop", "Amy", "14/04/2025", "15/04/2025"),
            task_row("Count till", "Amy", "01/01/2020", ""),
            task_row("Call vendor", "Bob", "", ""),
        ];
        let Json(body) = dashboard_report_endpoint(Json(request(rows)))
            .await
            .expect("report builds");

        assert_eq!(body.data_source, ReportDataSource::Rows);
        assert_eq!(body.summary.counters.total, 3);
        assert_eq!(body.summary.counters.overdue, 1);
        assert_eq!(body.summary.completion_rate, 33.3);
        assert_eq!(body.matching_tasks, 3);
        assert!(body.tasks.is_none());
    }

    #[tokio::test]
    async fn report_endpoint_filters_listed_tasks() {
        let rows = vec![
            task_row("Open shop", "Amy", "20/04/2025", ""),
            task_row("Close shop", "Bob", "21/04/2025", ""),
            task_row("Sweep", "Bob", "20/04/2025", "20/04/2025"),
        ];
        let mut payload = request(rows);
        payload.view = ViewWindow::Recent;
        payload.include_tasks = true;

        let Json(body) = dashboard_report_endpoint(Json(payload))
            .await
            .expect("report builds");
        let tasks = body.tasks.expect("tasks returned");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Open shop");
        assert_eq!(tasks[0].status_label, "Pending");
        assert_eq!(body.summary.counters.total, 3);
    }

    #[tokio::test]
    async fn report_endpoint_requires_rows() {
        let err = dashboard_report_endpoint(Json(DashboardReportRequest::default()))
            .await
            .expect_err("no rows");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn narrow_csv_is_rejected_as_bad_request() {
        let payload = DashboardReportRequest {
            tasks_csv: Some("Id,Task\n1,Open shop\n".to_string()),
            ..DashboardReportRequest::default()
        };
        let err = dashboard_report_endpoint(Json(payload))
            .await
            .expect_err("layout mismatch");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn refresh_without_live_source_is_unavailable() {
        let app = dashboard_routes().layer(Extension(state(true)));
        let response = app
            .oneshot(
                Request::post("/api/v1/dashboard/refresh")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"sheet": "Kitchen"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn current_dashboard_is_not_found_before_a_refresh() {
        let app = dashboard_routes().layer(Extension(state(true)));
        let response = app
            .oneshot(
                Request::get("/api/v1/dashboard/current")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    async fn script_endpoint() -> String {
        let rows = json!({
            "success": true,
            "headers": [],
            "tasks": [
                {"colA": "x", "colE": "Amy", "colG": "Open shop", "colL": "20/04/2025"},
                {"colA": "y", "colE": "Bob", "colG": "Close shop", "colL": "21/04/2025"}
            ]
        });
        let router = Router::new().route("/exec", post(move || async move { Json(rows) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind script listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("script server");
        });
        format!("http://{addr}/exec")
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&bytes).expect("json body");
        (status, body)
    }

    fn refresh_as(name: &str) -> Request<Body> {
        let body = json!({
            "sheet": "DATA",
            "today": "2025-04-20",
            "viewer": { "role": "staff", "name": name }
        });
        Request::post("/api/v1/dashboard/refresh")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn current_dashboard_is_kept_per_viewer() {
        let client = SheetsClient::new(script_endpoint().await, "sheet-1", Duration::from_secs(5))
            .expect("client builds");
        let mut app_state = state(true);
        app_state.dashboard = Some(Arc::new(DashboardService::new(client, "MASTER")));
        let app = dashboard_routes().layer(Extension(app_state));

        let (status, _) = send(&app, refresh_as("amy")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, refresh_as("bob")).await;
        assert_eq!(status, StatusCode::OK);

        let current = |query: &str| {
            Request::get(format!("/api/v1/dashboard/current?{query}"))
                .body(Body::empty())
                .expect("request")
        };
        let (status, body) = send(&app, current("role=staff&name=amy")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["tasks"][0]["title"], "Open shop");

        let (_, body) = send(&app, current("role=staff&name=Bob")).await;
        assert_eq!(body["tasks"][0]["title"], "Close shop");

        let (status, _) = send(&app, current("role=admin")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, current("role=staff")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let app = dashboard_routes().layer(Extension(state(false)));
        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = healthcheck().await;
        assert_eq!(response.0["status"], "ok");
    }
}
