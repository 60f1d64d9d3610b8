//! HTTP client for the authentication service
//!
//! This crate provides the JSON-over-HTTP transport used to talk to the auth
//! backend and the typed register/login endpoints built on top of it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod http;

pub use api::{AccessToken, AuthApi, Credentials, HttpAuthApi, User};
pub use http::{ApiClient, ApiClientConfig, ApiError, ApiRequest, ApiResponse};

/// Result type for auth client operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let err = ApiError::InvalidRequest("test".to_string());
        assert!(err.to_string().contains("Invalid request"));
    }
}
