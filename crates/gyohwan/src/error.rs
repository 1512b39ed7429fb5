use crate::auth::TokenError;
use crate::config::ConfigError;
use crate::seed::SeedImportError;
use crate::telemetry::TelemetryError;

/// Failures that stop `gyohwan-api` before or while serving.
///
/// Request-level failures never reach this type; the exchange router maps
/// `ExchangeServiceError` to responses itself.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("token service error: {0}")]
    Token(#[from] TokenError),
    #[error("seed data error: {0}")]
    Seed(#[from] SeedImportError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
