//! Cookie storage for the session layer
//!
//! This crate provides the cookie model, an in-memory jar, and a jar
//! persisted to a versioned JSON file.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cookie;
pub mod persistence;

pub use cookie::{Cookie, CookieError, CookieJar, MemoryCookieJar, MAX_TTL_DAYS};
pub use persistence::{FileCookieJar, PersistenceConfig};
