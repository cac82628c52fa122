use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::{GarageError, NormalizedError};
use crate::config::GarageConfig;

/// Version segment every admin API route lives under
pub const API_VERSION: &str = "v1";

/// Optional per-call settings
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn json(body: Value) -> Self {
        Self {
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }
}

/// Single chokepoint for calls to the Garage admin API
#[derive(Clone)]
pub struct GarageClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GarageClient {
    pub fn new(config: &GarageConfig) -> Result<Self, GarageError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(GarageError::Transport)?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: &GarageConfig) -> Self {
        Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Path component of an admin API route, e.g. `/v1/bucket?list`
    pub fn route_path(route: &str) -> String {
        format!("/{}/{}", API_VERSION, route)
    }

    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, Self::route_path(route))
    }

    /// Whether `token` is the configured admin credential
    pub fn is_admin_token(&self, token: &str) -> bool {
        matches!(&self.api_key, Some(key) if key == token)
    }

    /// Issue a request and return the parsed JSON body on success
    pub async fn request(
        &self,
        route: &str,
        method: Method,
        options: RequestOptions,
    ) -> Result<Value, GarageError> {
        let api_key = self.api_key.as_deref().ok_or(GarageError::MissingCredential)?;
        let url = self.url(route);
        let headers = self.build_headers(api_key, &options)?;

        debug!(%method, %url, "garage admin request");

        let mut request = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = &options.body {
            request = request.body(body.to_string());
        }

        let response = request.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "garage admin API unreachable");
            GarageError::Transport(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(GarageError::Transport)?;

        if !status.is_success() {
            let error = NormalizedError::from_body(&bytes, &Self::route_path(route));
            warn!(%method, %url, status = status.as_u16(), code = %error.code, "garage admin API error: {}", error.message);
            return Err(GarageError::Upstream(error));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| GarageError::Decode(e.to_string()))
    }

    pub async fn get(&self, route: &str) -> Result<Value, GarageError> {
        self.request(route, Method::GET, RequestOptions::default()).await
    }

    pub async fn post(&self, route: &str, options: RequestOptions) -> Result<Value, GarageError> {
        self.request(route, Method::POST, options).await
    }

    pub async fn put(&self, route: &str, options: RequestOptions) -> Result<Value, GarageError> {
        self.request(route, Method::PUT, options).await
    }

    pub async fn delete(&self, route: &str, options: RequestOptions) -> Result<Value, GarageError> {
        self.request(route, Method::DELETE, options).await
    }

    /// Defaults first, caller headers on top. Authorization always carries
    /// the configured credential.
    fn build_headers(&self, api_key: &str, options: &RequestOptions) -> Result<HeaderMap, GarageError> {
        let mut headers = HeaderMap::new();
        if options.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        for (name, value) in options.headers.iter() {
            if name == AUTHORIZATION {
                warn!("ignoring caller-supplied Authorization header for garage admin request");
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        // Appending above would keep a duplicate default; caller wins
        if let Some(content_type) = options.headers.get(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, content_type.clone());
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| GarageError::MissingCredential)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(headers)
    }
}
