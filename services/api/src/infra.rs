use axum::http::{header, HeaderValue, Method};
use gyohwan::config::SeedConfig;
use gyohwan::error::AppError;
use gyohwan::exchange::{MemoryExchangeStore, University};
use gyohwan::seed::{hydrate_store, CatalogImporter, RosterImporter};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Browser access is limited to the configured front-end origins.
pub(crate) fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Build the store from the configured CSV files; missing files mean an empty store.
pub(crate) fn load_store(
    seed: &SeedConfig,
    modify_quota: u32,
) -> Result<MemoryExchangeStore, AppError> {
    let universities: Vec<University> = match &seed.catalog_csv {
        Some(path) => CatalogImporter::from_path(path)?,
        None => Vec::new(),
    };
    let students = match &seed.roster_csv {
        Some(path) => RosterImporter::from_path(path)?,
        None => Vec::new(),
    };

    if universities.is_empty() {
        warn!("no university catalog configured; every application update will be rejected");
    }

    let store = hydrate_store(universities, students, modify_quota)?;
    let students = store
        .user_count()
        .map_err(|err| AppError::Seed(err.into()))?;
    info!(
        universities = store.university_count(),
        students,
        "seed data loaded"
    );
    Ok(store)
}
