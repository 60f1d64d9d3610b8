//! Auth service endpoints
//!
//! Typed wrappers for `POST /auth/register` and `POST /auth/login`. Both
//! return a [`User`]; the login response is reshaped from the server's
//! `{ user, token }` envelope into the same shape register returns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::http::{ApiClient, ApiRequest};
use crate::Result;

/// Path of the registration endpoint
pub const REGISTER_PATH: &str = "/auth/register";

/// Path of the login endpoint
pub const LOGIN_PATH: &str = "/auth/login";

/// Username/password pair sent to both endpoints
#[derive(Clone, Serialize)]
pub struct Credentials {
    /// Account username
    pub username: String,
    /// Plain-text password
    pub password: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access token issued by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Opaque bearer credential; empty when no session is held
    #[serde(default)]
    pub access_token: String,
}

impl AccessToken {
    /// Wrap a token string
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Whether a token is present
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }
}

/// An authenticated user plus the credential issued for them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Account username
    pub username: String,
    /// Token issued at login/registration
    #[serde(default)]
    pub token: AccessToken,
}

#[derive(Debug, Deserialize)]
struct LoginUser {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    username: String,
}

/// Body of a successful login
#[derive(Debug, Deserialize)]
struct LoginResponse {
    user: LoginUser,
    token: AccessToken,
}

impl From<LoginResponse> for User {
    fn from(response: LoginResponse) -> Self {
        Self {
            id: response.user.id,
            username: response.user.username,
            token: response.token,
        }
    }
}

/// The two calls the session store makes against the auth service
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Create an account
    async fn register(&self, credentials: &Credentials) -> Result<User>;

    /// Authenticate an existing account
    async fn login(&self, credentials: &Credentials) -> Result<User>;
}

/// [`AuthApi`] over HTTP
///
/// # Example
///
/// ```rust,no_run
/// use auth_client::{ApiClient, ApiClientConfig, AuthApi, Credentials, HttpAuthApi};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ApiClient::new(ApiClientConfig::new("http://localhost:3000"))?;
///     let api = HttpAuthApi::new(client);
///
///     let user = api.login(&Credentials::new("alice", "pw")).await?;
///     println!("Logged in as: {}", user.username);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: ApiClient,
}

impl HttpAuthApi {
    /// Create endpoints bound to `client`'s base URL
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn register(&self, credentials: &Credentials) -> Result<User> {
        let request = ApiRequest::post(REGISTER_PATH).json_body(credentials)?;
        let response = self.client.send::<User>(request).await?;
        Ok(response.data)
    }

    async fn login(&self, credentials: &Credentials) -> Result<User> {
        let request = ApiRequest::post(LOGIN_PATH).json_body(credentials)?;
        let response = self.client.send::<LoginResponse>(request).await?;
        Ok(response.data.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("alice", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_wire_shape() {
        let json = serde_json::to_value(Credentials::new("alice", "pw")).unwrap();
        assert_eq!(json, serde_json::json!({ "username": "alice", "password": "pw" }));
    }

    #[test]
    fn test_login_response_reshape() {
        let response: LoginResponse = serde_json::from_value(serde_json::json!({
            "user": { "_id": "1", "username": "alice" },
            "token": { "access_token": "abc" }
        }))
        .unwrap();

        let user = User::from(response);
        assert_eq!(user.id, "1");
        assert_eq!(user.username, "alice");
        assert_eq!(user.token, AccessToken::new("abc"));
    }

    #[test]
    fn test_user_serializes_with_underscore_id() {
        let user = User {
            id: "1".to_string(),
            username: "alice".to_string(),
            token: AccessToken::new("abc"),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "_id": "1", "username": "alice", "token": { "access_token": "abc" } })
        );
    }

    #[test]
    fn test_register_body_without_token() {
        let user: User =
            serde_json::from_str(r#"{"_id":"7","username":"bob"}"#).unwrap();
        assert_eq!(user.id, "7");
        assert!(user.token.is_empty());
    }
}
