//! Configuration loading and representation.
//!
//! Everything comes from environment variables. Parsing goes through a lookup
//! function so tests never have to touch the process environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";
const DEFAULT_TTL_MINUTES: i64 = 30;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_API_VERSION: &str = "1";
const DEFAULT_PROJECT_NAME: &str = "Stockroom";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct Settings {
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub bind_addr: SocketAddr,
    /// Postgres connection string; `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub api_version: String,
    pub project_name: String,
}

impl core::fmt::Debug for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settings")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("bind_addr", &self.bind_addr)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("api_version", &self.api_version)
            .field("project_name", &self.project_name)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let access_token_ttl = match get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            None => Duration::minutes(DEFAULT_TTL_MINUTES),
            Some(raw) => {
                let minutes: i64 = raw.parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::invalid("ACCESS_TOKEN_EXPIRE_MINUTES", &raw, e.to_string())
                })?;
                if minutes <= 0 {
                    return Err(ConfigError::invalid(
                        "ACCESS_TOKEN_EXPIRE_MINUTES",
                        &raw,
                        "must be a positive number of minutes",
                    ));
                }
                Duration::try_minutes(minutes).ok_or_else(|| {
                    ConfigError::invalid("ACCESS_TOKEN_EXPIRE_MINUTES", &raw, "out of range")
                })?
            }
        };

        let raw_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::invalid("BIND_ADDR", &raw_addr, e.to_string())
        })?;

        let api_version = get("API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        if !api_version.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::invalid(
                "API_VERSION",
                &api_version,
                "must be alphanumeric",
            ));
        }

        Ok(Self {
            jwt_secret,
            access_token_ttl,
            bind_addr,
            database_url: get("DATABASE_URL"),
            api_version,
            project_name: get("PROJECT_NAME").unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
        })
    }

    /// Route prefix for versioned endpoints, e.g. `/api/v1`.
    pub fn api_prefix(&self) -> String {
        format!("/api/v{}", self.api_version)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}
