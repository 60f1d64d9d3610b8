//! JSON-over-HTTP transport
//!
//! This module implements the request/response types, error taxonomy and the
//! reqwest-backed client used by the auth endpoints. There is no retry or
//! interceptor layer: each request is sent exactly once.

use reqwest::{Client as ReqwestClient, Response as ReqwestResponse};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::Result;

// =============================================================================
// Error Types
// =============================================================================

/// Errors produced by the HTTP transport
///
/// `Http` is the only variant that comes from the server itself; everything
/// else is a failure on the client side of the wire.
///
/// # Examples
/// ```
/// use auth_client::http::ApiError;
///
/// let error = ApiError::http(409, Some("Username taken".to_string()));
/// assert_eq!(error.status(), Some(409));
/// assert_eq!(error.server_message(), Some("Username taken"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response from the server
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Http {
        /// HTTP status code
        status: u16,
        /// The `message` field of the error body, if one was usable
        message: Option<String>,
    },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// A 2xx response whose body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Create an HTTP-layer error
    pub fn http(status: u16, message: Option<String>) -> Self {
        Self::Http { status, message }
    }

    /// HTTP status code, for HTTP-layer errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server-supplied message, for HTTP-layer errors that carried one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method for API requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A request against the configured base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL (e.g., "/auth/login")
    pub path: String,
    /// JSON body, already serialized
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a new GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a new POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Set the request body from JSON
    pub fn json_body<T: Serialize>(mut self, value: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(value)?);
        Ok(self)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// A decoded successful response
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, data: T) -> Self {
        Self { status, headers, data }
    }
}

/// Error body shape returned by the auth service
///
/// `message` is usually a string, but validation failures send an array of
/// strings, so it is kept as raw JSON until normalized.
#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Extract a displayable message: a non-empty string, or a non-empty list
    /// of strings joined with ", "
    fn into_message(self) -> Option<String> {
        match self.message? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            serde_json::Value::Array(items) => {
                let parts: Vec<String> = items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(s) if !s.is_empty() => Some(s),
                        _ => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(", "))
                }
            }
            _ => None,
        }
    }
}

/// Pull the `message` out of a non-2xx body, if there is a usable one
fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base service URL (e.g., "http://localhost:3000")
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Headers sent with every request
    pub default_headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("auth-session/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Client Implementation
// =============================================================================

/// HTTP client bound to one base URL
///
/// # Examples
/// ```no_run
/// use auth_client::http::{ApiClient, ApiClientConfig, ApiRequest};
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ApiClient::new(ApiClientConfig::new("http://localhost:3000"))?;
///
///     let request = ApiRequest::get("/auth/profile");
///     let response = client.send::<serde_json::Value>(request).await?;
///     println!("{}", response.data);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: ReqwestClient,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// A copy of this client that authenticates every request with `token`
    ///
    /// The underlying connection pool is shared.
    pub fn with_bearer(&self, token: &str) -> Self {
        let mut config = self.config.clone();
        config
            .default_headers
            .insert("Authorization".to_string(), format!("Bearer {}", token));
        Self {
            client: self.client.clone(),
            config,
        }
    }

    /// Send a request and decode a JSON response body
    pub async fn send<T>(&self, request: ApiRequest) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.url_for(&request.path);

        let mut req = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.header("Content-Type", "application/json").body(body);
        }

        tracing::debug!(method = request.method.as_str(), %url, "sending request");

        let response = req
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Request failed: {}", e)))?;

        self.parse_response(response).await
    }

    /// Turn a reqwest response into a decoded body or an `ApiError`
    async fn parse_response<T>(&self, response: ReqwestResponse) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(key.to_string(), value_str.to_string());
            }
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ApiError::http(status, parse_error_message(&error_body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response: {}", e)))?;

        let data: T = serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse JSON: {}", e)))?;

        Ok(ApiResponse::new(status, headers, data))
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Get the client configuration
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }
}

// =============================================================================
// Tests
// =============================================================================
