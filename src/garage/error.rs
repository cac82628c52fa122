use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const UNKNOWN_ERROR_CODE: &str = "UnknownError";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";
pub const DEFAULT_REGION: &str = "garage";

/// Error payload reported by the Garage admin API, with gaps filled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedError {
    pub code: String,
    pub message: String,
    pub region: String,
    pub path: String,
}

impl NormalizedError {
    /// Build from a raw error body. Fields that are absent, empty or not
    /// strings fall back to the sentinel values; `path` falls back to the
    /// path that was requested.
    pub fn from_body(body: &[u8], request_path: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_slice(body).ok();
        let field = |name: &str| -> Option<String> {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            code: field("code").unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_string()),
            message: field("message").unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
            region: field("region").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            path: field("path").unwrap_or_else(|| request_path.to_string()),
        }
    }
}

impl std::fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.path, self.message)
    }
}

/// Failure of a single call through the gateway
#[derive(Debug, Error)]
pub enum GarageError {
    /// The admin API answered with a non-success status
    #[error("Garage admin API error: {0}")]
    Upstream(NormalizedError),

    /// No response was received
    #[error("Failed to reach Garage admin API: {0}")]
    Transport(#[source] reqwest::Error),

    /// A success response whose body is not JSON
    #[error("Invalid response from Garage admin API: {0}")]
    Decode(String),

    #[error("GARAGE_API_KEY is not configured")]
    MissingCredential,
}

impl GarageError {
    /// Upstream error code, only present for `Upstream`
    pub fn code(&self) -> Option<&str> {
        match self {
            GarageError::Upstream(e) => Some(&e.code),
            _ => None,
        }
    }

    /// Message suitable for showing to the dashboard user
    pub fn message(&self) -> String {
        match self {
            GarageError::Upstream(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}
