//! Application configuration
//!
//! Settings come from the environment:
//!
//! | variable                  | default                 |
//! |---------------------------|-------------------------|
//! | `AUTH_API_URL`            | `http://localhost:3000` |
//! | `AUTH_HTTP_TIMEOUT_SECS`  | `30`                    |
//! | `AUTH_COOKIE_FILE`        | unset (in-memory jar)   |
//! | `AUTH_COOKIE_NAME`        | `jwt`                   |
//! | `AUTH_COOKIE_TTL_DAYS`    | `7` (at most 400)       |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use app_state::{SessionConfig, SessionStore};
use auth_client::{ApiClient, ApiClientConfig, HttpAuthApi};
use storage::{CookieJar, FileCookieJar, MemoryCookieJar, PersistenceConfig, MAX_TTL_DAYS};

use crate::{Error, Result};

/// Everything needed to build a [`SessionStore`]
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// HTTP client settings
    pub api: ApiClientConfig,
    /// Store settings
    pub session: SessionConfig,
    /// Where to persist cookies; `None` keeps them in memory
    pub cookie_file: Option<PathBuf>,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = var("AUTH_API_URL") {
            config.api.base_url = url;
        }

        if let Some(raw) = var("AUTH_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| Error::Config(format!("invalid AUTH_HTTP_TIMEOUT_SECS: {raw}")))?;
            config.api.timeout = Duration::from_secs(secs);
        }

        config.cookie_file = var("AUTH_COOKIE_FILE").map(PathBuf::from);

        if let Some(name) = var("AUTH_COOKIE_NAME") {
            config.session.cookie_name = name;
        }

        if let Some(raw) = var("AUTH_COOKIE_TTL_DAYS") {
            let days: i64 = raw
                .parse()
                .ok()
                .filter(|d| (1..=MAX_TTL_DAYS).contains(d))
                .ok_or_else(|| Error::Config(format!("invalid AUTH_COOKIE_TTL_DAYS: {raw}")))?;
            config.session.cookie_ttl_days = days;
        }

        Ok(config)
    }

    /// Set the auth service base URL
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api.base_url = url.into();
        self
    }

    /// Persist cookies to `path`
    pub fn with_cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_file = Some(path.into());
        self
    }

    /// Build a store over HTTP, restoring any persisted token
    pub fn build_store(&self) -> Result<SessionStore> {
        let client = ApiClient::new(self.api.clone())?;

        let cookies: Arc<dyn CookieJar> = match &self.cookie_file {
            Some(path) => Arc::new(FileCookieJar::open(PersistenceConfig::new(path))?),
            None => Arc::new(MemoryCookieJar::new()),
        };

        let store = SessionStore::with_config(
            Arc::new(HttpAuthApi::new(client)),
            cookies,
            self.session.clone(),
        );

        if store.restore_from_cookie().is_some() {
            tracing::info!(base_url = %self.api.base_url, "resumed persisted session token");
        }

        Ok(store)
    }
}
