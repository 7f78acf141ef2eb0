//! Configuration management for Company Service
//!
//! Settings come from environment variables (a `.env` file is loaded first by
//! the binary). Database pool settings are read separately by `db-pool`.

use anyhow::{bail, Context, Result};
use crypto_core::jwt::{DEFAULT_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES};
use crypto_core::KeyConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub jwt: JwtConfig,
    /// Seed the default companies into an empty store at startup
    pub initial_load: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub private_key_path: Option<PathBuf>,
    pub public_key_path: Option<PathBuf>,
    pub expire_in_minutes: i64,
    /// Mount `POST /api/auth`
    pub auth_endpoint_enabled: bool,
}

impl JwtConfig {
    pub fn key_config(&self) -> KeyConfig {
        KeyConfig {
            private_key_path: self.private_key_path.clone(),
            public_key_path: self.public_key_path.clone(),
        }
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.expire_in_minutes)
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: env::var("COMPANY_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("COMPANY_SERVICE_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid COMPANY_SERVICE_PORT")?,
        };

        let allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(value) => value,
            Err(_) if app.is_production() => {
                bail!("CORS_ALLOWED_ORIGINS must be set in production")
            }
            Err(_) => "http://localhost:3000".to_string(),
        };
        if app.is_production() && allowed_origins.trim() == "*" {
            bail!("CORS_ALLOWED_ORIGINS cannot be '*' in production");
        }

        let expire_in_minutes: i64 = env::var("JWT_EXPIRE_IN_MINUTES")
            .unwrap_or_else(|_| DEFAULT_TOKEN_TTL_MINUTES.to_string())
            .parse()
            .context("Invalid JWT_EXPIRE_IN_MINUTES")?;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&expire_in_minutes) {
            bail!(
                "JWT_EXPIRE_IN_MINUTES must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_MINUTES,
                expire_in_minutes
            );
        }

        Ok(Config {
            app,
            cors: CorsConfig { allowed_origins },
            jwt: JwtConfig {
                private_key_path: path_var("PRIVATE_KEY_PATH"),
                public_key_path: path_var("PUBLIC_KEY_PATH"),
                expire_in_minutes,
                auth_endpoint_enabled: bool_var("AUTH_ENDPOINT_ENABLED", true)?,
            },
            initial_load: bool_var("INITIAL_LOAD", true)?,
        })
    }
}

fn path_var(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn bool_var(key: &str, default: bool) -> Result<bool> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => bail!("Invalid {}: expected a boolean, got '{}'", key, other),
    }
}
