use crate::cli::ServeArgs;
use crate::infra::{
    load_catalog, seed_profiles, AppState, InMemoryInteractionLog, InMemoryPointsLedger,
    InMemoryProfiles,
};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use donate_swipe::config::AppConfig;
use donate_swipe::engagement::Engagement;
use donate_swipe::error::AppError;
use donate_swipe::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = Arc::new(load_catalog(args.catalog_csv.as_deref(), Utc::now())?);
    info!(requests = catalog.len(), "donation request catalog loaded");

    let engagement = Engagement::new(
        catalog,
        Arc::new(InMemoryProfiles::new(seed_profiles())),
        Arc::new(InMemoryInteractionLog::default()),
        Arc::new(InMemoryPointsLedger::default()),
        &config.feed,
    );

    let app = with_service_routes(engagement.router())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "donate swipe engagement service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
