//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 3000,
        }
    }
}

/// Object store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the filesystem-backed store
    pub root: PathBuf,
    pub bucket: String,
    /// Project prefix inside the bucket (`{base}/raw`, `{base}/processed`, ...)
    pub base_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
            bucket: "datagov".to_string(),
            base_path: "project".to_string(),
        }
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub max_workers: usize,
    pub sensitive_fields: Vec<String>,
    pub imputer_max_iter: usize,
    pub imputer_tol: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            sensitive_fields: Vec::new(),
            imputer_max_iter: 10,
            imputer_tol: 1e-3,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
    pub cors: CorsConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let server = ServerConfig {
            host: parse_or(&lookup, "HOST", defaults.server.host)?,
            port: parse_or(&lookup, "PORT", defaults.server.port)?,
        };

        let store = StoreConfig {
            root: lookup("STORE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.store.root),
            bucket: lookup("STORE_BUCKET").unwrap_or(defaults.store.bucket),
            base_path: lookup("BASE_PATH").unwrap_or(defaults.store.base_path),
        };
        if store.bucket.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "STORE_BUCKET must not be empty".to_string(),
            ));
        }

        let pipeline = PipelineConfig {
            max_workers: parse_or(&lookup, "MAX_WORKERS", defaults.pipeline.max_workers)?,
            sensitive_fields: lookup("SENSITIVE_FIELDS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.pipeline.sensitive_fields),
            imputer_max_iter: parse_or(
                &lookup,
                "IMPUTER_MAX_ITER",
                defaults.pipeline.imputer_max_iter,
            )?,
            imputer_tol: parse_or(&lookup, "IMPUTER_TOL", defaults.pipeline.imputer_tol)?,
        };
        if pipeline.max_workers == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_WORKERS must be at least 1".to_string(),
            ));
        }

        let cors = CorsConfig {
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.cors.allowed_origins),
        };

        Ok(Self {
            server,
            store,
            pipeline,
            cors,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{}={}", key, raw))),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
