//! Environment-driven configuration for construction-service.

use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use service_core::config::Config as CoreConfig;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Shared server settings (host/port), loaded the way every service does.
    pub common: CoreConfig,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let common = CoreConfig::load()?;

        let database_url = env::var("CONSTRUCTION_DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("CONSTRUCTION_DATABASE_URL must be set"))?;
        let max_connections = env::var("CONSTRUCTION_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("CONSTRUCTION_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let log_level = env::var("CONSTRUCTION_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let otlp_endpoint = env::var("CONSTRUCTION_OTLP_ENDPOINT").ok();

        Ok(Self {
            common,
            service_name: "construction-service".to_string(),
            log_level,
            otlp_endpoint,
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                min_connections,
            },
        })
    }
}
