//! Cookie model and in-memory jar

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Cookie storage errors
#[derive(Debug, Error)]
pub enum CookieError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Corruption detected
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Version mismatch
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: u32,
        /// Found version
        found: u32,
    },
}

/// Result type for cookie operations
pub type Result<T> = std::result::Result<T, CookieError>;

/// Longest lifetime a cookie may be given, matching the RFC 6265bis cap
pub const MAX_TTL_DAYS: i64 = 400;

/// A named value with an absolute expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (e.g., "jwt")
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Instant after which the cookie is no longer returned
    pub expires_at: DateTime<Utc>,
}

impl Cookie {
    /// Create a cookie that expires `ttl` from now
    ///
    /// `ttl` is clamped to [`MAX_TTL_DAYS`] in either direction.
    pub fn with_ttl(name: impl Into<String>, value: impl Into<String>, ttl: Duration) -> Self {
        let limit = Duration::days(MAX_TTL_DAYS);
        Self {
            name: name.into(),
            value: value.into(),
            expires_at: Utc::now() + ttl.clamp(-limit, limit),
        }
    }

    /// Create a cookie that expires `days` days from now, clamped like [`with_ttl`](Self::with_ttl)
    pub fn expires_in_days(name: impl Into<String>, value: impl Into<String>, days: i64) -> Self {
        Self::with_ttl(name, value, Duration::days(days.clamp(-MAX_TTL_DAYS, MAX_TTL_DAYS)))
    }

    /// Whether the cookie has expired as of `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the cookie has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// A store of cookies keyed by name
///
/// Writes are synchronous. Callers treat them as fire-and-forget and only log
/// failures; a jar is convenience persistence, not a credential vault.
pub trait CookieJar: Send + Sync {
    /// Insert or replace a cookie
    fn set(&self, cookie: Cookie) -> Result<()>;

    /// Look up a cookie; expired cookies are never returned
    fn get(&self, name: &str) -> Option<Cookie>;

    /// Delete a cookie; deleting a missing cookie is not an error
    fn remove(&self, name: &str) -> Result<()>;

    /// Convenience accessor for the value of a live cookie
    fn value(&self, name: &str) -> Option<String> {
        self.get(name).map(|cookie| cookie.value)
    }
}

/// Cookie jar held in process memory
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: RwLock<HashMap<String, Cookie>>,
}

impl MemoryCookieJar {
    /// Create an empty jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cookies, expired ones included
    pub fn len(&self) -> usize {
        self.cookies.read().len()
    }

    /// Whether the jar is empty
    pub fn is_empty(&self) -> bool {
        self.cookies.read().is_empty()
    }
}

impl CookieJar for MemoryCookieJar {
    fn set(&self, cookie: Cookie) -> Result<()> {
        self.cookies.write().insert(cookie.name.clone(), cookie);
        Ok(())
    }

    fn get(&self, name: &str) -> Option<Cookie> {
        self.cookies
            .read()
            .get(name)
            .filter(|cookie| !cookie.is_expired())
            .cloned()
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.cookies.write().remove(name);
        Ok(())
    }
}
