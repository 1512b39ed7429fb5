use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEVELOPMENT_TOKEN_SECRET: &str = "gyohwan-development-secret";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 35;
const DEFAULT_MODIFY_QUOTA: u32 = 4;
const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "https://soma-woad.vercel.app",
    "https://knu.gyohwan.com",
    "http://localhost:3000",
    "http://localhost:8000",
];

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub policy: ExchangePolicy,
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        let cors_origins = match env::var("APP_CORS_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let token_secret = match env::var("APP_TOKEN_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingTokenSecret)
            }
            _ => DEVELOPMENT_TOKEN_SECRET.to_string(),
        };
        let token_ttl_minutes = match env::var("APP_TOKEN_TTL_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| {
                    *minutes > 0 && chrono::Duration::try_minutes(*minutes).is_some()
                })
                .ok_or(ConfigError::InvalidTokenTtl)?,
            Err(_) => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let modify_quota = match env::var("APP_MODIFY_QUOTA") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidModifyQuota)?,
            Err(_) => DEFAULT_MODIFY_QUOTA,
        };
        let detail_requires_application = match env::var("APP_DETAIL_REQUIRES_APPLICATION") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "APP_DETAIL_REQUIRES_APPLICATION",
            })?,
            Err(_) => false,
        };

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                cors_origins,
            },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                token_secret,
                token_ttl_minutes,
            },
            policy: ExchangePolicy {
                modify_quota,
                detail_requires_application,
            },
            seed: SeedConfig {
                catalog_csv: env::var_os("APP_CATALOG_CSV").map(PathBuf::from),
                roster_csv: env::var_os("APP_ROSTER_CSV").map(PathBuf::from),
            },
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Signing material for session tokens.
#[derive(Clone)]
pub struct AuthConfig {
    pub token_secret: String,
    pub token_ttl_minutes: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

/// Business rules that vary between deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangePolicy {
    /// Number of times a new student may replace their application set.
    pub modify_quota: u32,
    /// Only students who applied to a university may open its roster.
    pub detail_requires_application: bool,
}

impl Default for ExchangePolicy {
    fn default() -> Self {
        Self {
            modify_quota: DEFAULT_MODIFY_QUOTA,
            detail_requires_application: false,
        }
    }
}

/// Optional CSV files hydrating the in-memory store at startup.
#[derive(Debug, Clone, Default)]
pub struct SeedConfig {
    pub catalog_csv: Option<PathBuf>,
    pub roster_csv: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingTokenSecret,
    InvalidTokenTtl,
    InvalidModifyQuota,
    InvalidFlag { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingTokenSecret => {
                write!(f, "APP_TOKEN_SECRET must be set in production")
            }
            ConfigError::InvalidTokenTtl => {
                write!(f, "APP_TOKEN_TTL_MINUTES must be a positive number of minutes within range")
            }
            ConfigError::InvalidModifyQuota => {
                write!(f, "APP_MODIFY_QUOTA must be a non-negative integer")
            }
            ConfigError::InvalidFlag { name } => write!(f, "{name} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
