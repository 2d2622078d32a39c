//! Configuration module for invoicing-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct InvoicingConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl InvoicingConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let request_timeout = parsed::<u64>("REQUEST_TIMEOUT_SECS")
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or_else(|| common.request_timeout());

        Ok(Self {
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "invoicing-service".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: parsed("DATABASE_MAX_CONNECTIONS").unwrap_or(10),
                min_connections: parsed("DATABASE_MIN_CONNECTIONS").unwrap_or(2),
            },
            request_timeout,
            common,
        })
    }
}
