use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryLeaveRepository, InMemoryNotificationPublisher};
use crate::routes::with_leave_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use kvb_pass::config::AppConfig;
use kvb_pass::error::AppError;
use kvb_pass::telemetry;
use kvb_pass::workflows::leave::LeavePassService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryLeaveRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let leave_service = Arc::new(LeavePassService::new(
        repository,
        notifications,
        config.campus,
    ));

    let app = with_leave_routes(leave_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        campus_offset = %config.campus.utc_offset,
        "kvb-pass leave service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
