// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

use crate::services::generator::{DEFAULT_HORIZON_DAYS, MAX_INSTANCES_CAP};
use crate::services::GeneratorOptions;

/// Which store backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND")),
        }
    }
}

/// Series generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesConfig {
    /// Days after start to stop at when a rule has no end
    pub horizon_days: u32,
    /// Instances per series (clamped to the hard cap)
    pub max_instances: usize,
    /// Delete the parent again if its instances fail to store
    pub compensate_on_failure: bool,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            max_instances: MAX_INSTANCES_CAP,
            compensate_on_failure: false,
        }
    }
}

impl SeriesConfig {
    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions::new(self.horizon_days, self.max_instances)
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub store_backend: StoreBackend,
    pub series: SeriesConfig,
    /// JWT verification key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            series: SeriesConfig::default(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = SeriesConfig::default();

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "firestore".to_string())
                .parse()?,
            series: SeriesConfig {
                horizon_days: parse_var("SERIES_HORIZON_DAYS", defaults.horizon_days)?,
                max_instances: parse_var::<usize>("SERIES_MAX_INSTANCES", defaults.max_instances)?
                    .min(MAX_INSTANCES_CAP),
                compensate_on_failure: parse_var(
                    "SERIES_COMPENSATE_ON_FAILURE",
                    defaults.compensate_on_failure,
                )?,
            },
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so env mutations do not race across threads
    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("STORE_BACKEND", "memory");
        env::set_var("SERIES_HORIZON_DAYS", "90");
        env::set_var("SERIES_MAX_INSTANCES", "500");
        env::remove_var("SERIES_COMPENSATE_ON_FAILURE");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.series.horizon_days, 90);
        assert_eq!(config.series.max_instances, MAX_INSTANCES_CAP);
        assert!(!config.series.compensate_on_failure);

        env::set_var("SERIES_HORIZON_DAYS", "ninety");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("SERIES_HORIZON_DAYS"))
        ));
        env::remove_var("SERIES_HORIZON_DAYS");
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(
            "firestore".parse::<StoreBackend>().unwrap(),
            StoreBackend::Firestore
        );
        assert!("postgres".parse::<StoreBackend>().is_err());
    }
}
