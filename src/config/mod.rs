use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Errors raised while assembling the configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub garage: GarageConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub admin: Option<AdminSeed>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Location of and credential for the Garage admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarageConfig {
    pub api_url: String,
    /// Bearer token; `None` makes every upstream call fail
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl GarageConfig {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key,
            timeout_secs: 30,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub session_secret: String,
    pub session_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    pub secure_cookies: bool,
}

/// First account created at startup when the user table is empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSeed {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
}

const DEFAULT_GARAGE_API_URL: &str = "http://localhost:3903";
const DEFAULT_DB_NAME: &str = "garage_admin";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match var("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };

        config.with_env_overrides(&var)
    }

    fn with_env_overrides<F>(mut self, var: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Garage admin API
        if let Some(v) = var("GARAGE_API_URL") {
            self.garage.api_url = v.trim_end_matches('/').to_string();
        }
        self.garage.api_key = var("GARAGE_API_KEY").filter(|v| !v.trim().is_empty());
        if let Some(v) = var("GARAGE_TIMEOUT_SECS") {
            self.garage.timeout_secs = v.parse().unwrap_or(self.garage.timeout_secs);
        }

        // Database
        self.database.url = database_url(var)?;
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security
        match var("SESSION_SECRET").filter(|v| !v.is_empty()) {
            Some(secret) => self.security.session_secret = secret,
            None if self.environment == Environment::Development => {
                // Sessions will not survive a restart
                self.security.session_secret =
                    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple());
            }
            None => return Err(ConfigError::Missing("SESSION_SECRET")),
        }
        if let Some(v) = var("SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Some(v) = var("SECURITY_CORS_ORIGINS") {
            if let Some(origins) = cors_origins(&v) {
                self.security.cors_origins = origins;
            }
        }
        if let Some(v) = var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        // Seed account
        self.admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed {
                    email,
                    password,
                    name: var("ADMIN_NAME")
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| "admin".to_string()),
                })
            }
            _ => None,
        };

        Ok(self)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            garage: GarageConfig::new(DEFAULT_GARAGE_API_URL, None),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_expiry_hours: 24 * 7, // 1 week
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                secure_cookies: false,
            },
            admin: None,
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            garage: GarageConfig::new(DEFAULT_GARAGE_API_URL, None),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_expiry_hours: 24,
                cors_origins: Vec::new(),
                secure_cookies: true,
            },
            admin: None,
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            garage: GarageConfig::new(DEFAULT_GARAGE_API_URL, None),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_expiry_hours: 12,
                cors_origins: Vec::new(),
                secure_cookies: true,
            },
            admin: None,
        }
    }
}

/// Comma separated origin list. `*` cannot be combined with credentialed
/// CORS, so it is dropped; `None` when nothing usable is left of a list
/// that named origins, which keeps the preset.
fn cors_origins(raw: &str) -> Option<Vec<String>> {
    let mut dropped = false;
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| {
            if *s == "*" {
                warn!("ignoring wildcard in SECURITY_CORS_ORIGINS, list origins explicitly");
                dropped = true;
                false
            } else {
                true
            }
        })
        .map(str::to_string)
        .collect();

    if origins.is_empty() && dropped {
        None
    } else {
        Some(origins)
    }
}

/// DATABASE_URL wins; otherwise assemble one from the DB_* parts
fn database_url<F>(var: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = var("DATABASE_URL").filter(|v| !v.is_empty()) {
        return Ok(url);
    }

    let host = var("DB_HOST").unwrap_or_else(|| "localhost".to_string());
    let port = match var("DB_PORT") {
        Some(p) => p.parse::<u16>().map_err(|_| ConfigError::Invalid {
            name: "DB_PORT",
            value: p.clone(),
        })?,
        None => 5432,
    };
    let database = var("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string());

    let mut url = url::Url::parse("postgres://localhost").map_err(|_| ConfigError::Invalid {
        name: "DB_HOST",
        value: host.clone(),
    })?;
    url.set_host(Some(&host)).map_err(|_| ConfigError::Invalid {
        name: "DB_HOST",
        value: host.clone(),
    })?;
    // set_port/set_username only fail for cannot-be-a-base URLs
    let _ = url.set_port(Some(port));
    if let Some(user) = var("DB_USER") {
        let _ = url.set_username(&user);
    }
    if let Some(password) = var("DB_PASSWORD") {
        let _ = url.set_password(Some(&password));
    }
    url.set_path(&format!("/{}", database));
    Ok(url.into())
}
