//! Client-side authentication session
//!
//! This crate wires the workspace together: the HTTP auth endpoints from
//! `auth-client`, the cookie jars from `storage`, and the session store from
//! `app-state`, plus environment configuration and tracing setup.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod telemetry;

pub use app_state::{
    reduce, AuthAction, AuthOp, AuthState, ErrorInfo, Rejection, SessionConfig, SessionStore,
};
pub use auth_client::{AccessToken, ApiClient, ApiClientConfig, ApiError, Credentials, User};
pub use config::AppConfig;
pub use storage::{Cookie, CookieError, CookieJar, FileCookieJar, MemoryCookieJar};

/// Errors raised while assembling a session store
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP client could not be built
    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    /// Cookie file could not be opened
    #[error("Cookie storage error: {0}")]
    Cookie(#[from] CookieError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for setup operations
pub type Result<T> = std::result::Result<T, Error>;
