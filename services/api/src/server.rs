use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::dashboard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use taskboard::config::AppConfig;
use taskboard::error::AppError;
use taskboard::telemetry;
use taskboard::workflows::refresh::DashboardService;
use taskboard::workflows::sheets::SheetsClient;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let dashboard = SheetsClient::from_config(&config.sheets)?.map(|client| {
        Arc::new(DashboardService::new(
            client,
            config.sheets.roster_sheet.clone(),
        ))
    });
    if dashboard.is_none() {
        warn!("SHEETS_SCRIPT_URL or SHEETS_SHEET_ID unset; live refresh is disabled");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        dashboard,
        default_sheet: config.sheets.task_sheet.clone(),
    };

    let app = dashboard_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "operations dashboard ready");

    axum::serve(listener, app).await?;
    Ok(())
}
