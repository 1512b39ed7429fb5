use crate::cli::ServeArgs;
use crate::infra::{cors_layer, load_store, AppState};
use crate::routes::with_exchange_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use gyohwan::auth::JwtTokenService;
use gyohwan::config::AppConfig;
use gyohwan::error::AppError;
use gyohwan::exchange::ExchangeService;
use gyohwan::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    if let Some(path) = args.catalog_csv.take() {
        config.seed.catalog_csv = Some(path);
    }
    if let Some(path) = args.roster_csv.take() {
        config.seed.roster_csv = Some(path);
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(load_store(&config.seed, config.policy.modify_quota)?);
    let tokens = Arc::new(JwtTokenService::new(&config.auth)?);
    let exchange_service = Arc::new(ExchangeService::new(store, tokens, config.policy));

    let app = with_exchange_routes(exchange_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(cors_layer(&config.server.cors_origins));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "exchange application service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
