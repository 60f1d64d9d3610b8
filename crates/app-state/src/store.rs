//! The session store
//!
//! [`SessionStore`] is an explicitly constructed, cloneable container for one
//! [`AuthState`]. It runs register/login against an injected [`AuthApi`],
//! feeds their lifecycle through [`reduce`], and writes the access token to an
//! injected [`CookieJar`] when a login succeeds.
//!
//! # Example
//!
//! ```rust,no_run
//! use app_state::SessionStore;
//! use auth_client::{ApiClient, ApiClientConfig, HttpAuthApi};
//! use std::sync::Arc;
//! use storage::MemoryCookieJar;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ApiClientConfig::new("http://localhost:3000"))?;
//!     let store = SessionStore::new(
//!         Arc::new(HttpAuthApi::new(client)),
//!         Arc::new(MemoryCookieJar::new()),
//!     );
//!
//!     match store.login_user("alice", "pw").await {
//!         Ok(user) => println!("Logged in as: {}", user.username),
//!         Err(rejection) => println!("{}", rejection.message()),
//!     }
//!
//!     store.logout();
//!     Ok(())
//! }
//! ```

use auth_client::{ApiClient, AuthApi, Credentials, User};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use storage::{Cookie, CookieJar, MAX_TTL_DAYS};

use crate::request::{RequestId, RequestPhase, RequestSequence};
use crate::session::{reduce, AuthAction, AuthOp, AuthState, ErrorInfo};

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Name of the cookie holding the access token
    pub cookie_name: String,
    /// Lifetime of that cookie, in days
    pub cookie_ttl_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "jwt".to_string(),
            cookie_ttl_days: 7,
        }
    }
}

impl SessionConfig {
    /// Set the cookie name
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the cookie lifetime, clamped to `1..=MAX_TTL_DAYS`
    pub fn with_cookie_ttl_days(mut self, days: i64) -> Self {
        self.cookie_ttl_days = days.clamp(1, MAX_TTL_DAYS);
        self
    }
}

/// A failed register/login, already recorded in the store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{op} rejected: {}", .error.message)]
pub struct Rejection {
    /// Operation that failed
    pub op: AuthOp,
    /// Request that failed
    pub request_id: RequestId,
    /// Normalized failure
    pub error: ErrorInfo,
}

impl Rejection {
    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.error.message
    }
}

/// Callback invoked with every new state
pub type StateListener = Arc<dyn Fn(&AuthState) + Send + Sync>;

/// Handle returned by [`SessionStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A committed state and its position in commit order
struct Snapshot {
    version: u64,
    state: AuthState,
}

struct Shared {
    state: AuthState,
    sequence: RequestSequence,
    version: u64,
}

impl Shared {
    fn apply(&mut self, action: &AuthAction) -> Snapshot {
        self.state = reduce(&self.state, action);
        self.version += 1;
        Snapshot {
            version: self.version,
            state: self.state.clone(),
        }
    }
}

struct Inner {
    api: Arc<dyn AuthApi>,
    cookies: Arc<dyn CookieJar>,
    config: SessionConfig,
    shared: RwLock<Shared>,
    listeners: RwLock<Vec<(ListenerId, StateListener)>>,
    next_listener: AtomicU64,
    /// Version of the last snapshot handed to listeners
    delivered: ReentrantMutex<Cell<u64>>,
    /// Version of the last state the session cookie was synced to
    cookie_version: Mutex<u64>,
}

/// Client-side authentication state container
///
/// Clones share the same state. No lock is held across an `.await`, so the
/// store can be driven from several tasks at once; when async operations
/// overlap, only the most recently started one is applied.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.inner.shared.read();
        f.debug_struct("SessionStore")
            .field("state", &shared.state)
            .field("phase", &shared.sequence.phase())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl SessionStore {
    /// Create a store with the default configuration
    pub fn new(api: Arc<dyn AuthApi>, cookies: Arc<dyn CookieJar>) -> Self {
        Self::with_config(api, cookies, SessionConfig::default())
    }

    /// Create a store with a custom configuration
    pub fn with_config(
        api: Arc<dyn AuthApi>,
        cookies: Arc<dyn CookieJar>,
        config: SessionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                cookies,
                config,
                shared: RwLock::new(Shared {
                    state: AuthState::default(),
                    sequence: RequestSequence::new(),
                    version: 0,
                }),
                listeners: RwLock::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                delivered: ReentrantMutex::new(Cell::new(0)),
                cookie_version: Mutex::new(0),
            }),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.inner.shared.read().state.clone()
    }

    /// Phase of the most recently started async operation
    pub fn phase(&self) -> RequestPhase {
        self.inner.shared.read().sequence.phase()
    }

    /// Id of the most recently started async operation
    pub fn latest_request(&self) -> Option<RequestId> {
        self.inner.shared.read().sequence.latest()
    }

    /// Store configuration
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Register a listener called after every state change
    ///
    /// Listeners are called one at a time, outside the state lock, in commit
    /// order. When changes race, a listener may miss an intermediate state
    /// but never sees an older state after a newer one.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Apply `action` through the reducer and notify listeners
    ///
    /// This is the plain reducer path: it performs no request sequencing and
    /// no cookie I/O. Those belong to [`register_user`](Self::register_user)
    /// and [`login_user`](Self::login_user).
    pub fn dispatch(&self, action: AuthAction) -> AuthState {
        let snapshot = self.inner.shared.write().apply(&action);

        tracing::trace!(action = %action.type_name(), version = snapshot.version, "dispatched");
        self.notify(&snapshot);
        snapshot.state
    }

    /// Create an account and make it the current session
    pub async fn register_user(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<User, Rejection> {
        self.run(AuthOp::Register, Credentials::new(username, password))
            .await
    }

    /// Authenticate and make the account the current session
    ///
    /// On success the access token is also written to the session cookie.
    pub async fn login_user(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<User, Rejection> {
        self.run(AuthOp::Login, Credentials::new(username, password))
            .await
    }

    /// Clear the user and token and drop the session cookie
    ///
    /// In-flight requests are not cancelled.
    pub fn logout(&self) {
        let snapshot = self.inner.shared.write().apply(&AuthAction::Logout);

        self.notify(&snapshot);
        self.sync_cookie(snapshot.version, None);
        tracing::info!("logged out");
    }

    /// Load a previously persisted access token into the store
    ///
    /// The user stays absent; only the token is known until the next login.
    pub fn restore_from_cookie(&self) -> Option<String> {
        let token = self
            .inner
            .cookies
            .value(&self.inner.config.cookie_name)
            .filter(|token| !token.is_empty())?;

        self.dispatch(AuthAction::TokenRestored {
            access_token: token.clone(),
        });
        tracing::debug!("restored access token from cookie");

        Some(token)
    }

    /// A copy of `client` that sends the current access token, if one is held
    pub fn authorize(&self, client: &ApiClient) -> Option<ApiClient> {
        let token = self.inner.shared.read().state.token.clone();
        (!token.is_empty()).then(|| client.with_bearer(&token.access_token))
    }

    async fn run(&self, op: AuthOp, credentials: Credentials) -> Result<User, Rejection> {
        let request_id = self.begin(op);

        let result = match op {
            AuthOp::Register => self.inner.api.register(&credentials).await,
            AuthOp::Login => self.inner.api.login(&credentials).await,
        };

        match result {
            Ok(user) => {
                tracing::info!(
                    op = %op,
                    request = %request_id,
                    user_id = %user.id,
                    username = %user.username,
                    "auth request fulfilled"
                );
                self.settle(AuthAction::Fulfilled {
                    op,
                    request_id,
                    user: user.clone(),
                });
                Ok(user)
            }
            Err(err) => {
                let error = ErrorInfo::rejected(op, &err);
                tracing::warn!(op = %op, request = %request_id, error = %err, "auth request rejected");
                self.settle(AuthAction::Rejected {
                    op,
                    request_id,
                    error: error.clone(),
                });
                Err(Rejection { op, request_id, error })
            }
        }
    }

    /// Issue a request id and apply the pending action under one lock
    fn begin(&self, op: AuthOp) -> RequestId {
        let (request_id, snapshot) = {
            let mut shared = self.inner.shared.write();
            let request_id = shared.sequence.issue();
            let snapshot = shared.apply(&AuthAction::Pending { op, request_id });
            (request_id, snapshot)
        };

        tracing::debug!(op = %op, request = %request_id, "auth request started");
        self.notify(&snapshot);
        request_id
    }

    /// Apply a fulfilled/rejected action if it belongs to the latest request
    ///
    /// A fulfilled login also syncs the session cookie, after the state lock
    /// is released.
    fn settle(&self, action: AuthAction) {
        let (request_id, phase) = match &action {
            AuthAction::Fulfilled { request_id, .. } => (*request_id, RequestPhase::Fulfilled),
            AuthAction::Rejected { request_id, .. } => (*request_id, RequestPhase::Rejected),
            _ => return,
        };

        let snapshot = {
            let mut shared = self.inner.shared.write();
            if !shared.sequence.resolve(request_id, phase) {
                tracing::debug!(
                    action = %action.type_name(),
                    request = %request_id,
                    "dropping stale resolution"
                );
                return;
            }

            shared.apply(&action)
        };

        self.notify(&snapshot);

        if let AuthAction::Fulfilled { op: AuthOp::Login, user, .. } = &action {
            self.sync_cookie(snapshot.version, Some(&user.token.access_token));
        }
    }

    /// Write (`Some`) or remove (`None`) the session cookie for state `version`
    ///
    /// A write overtaken by one for a newer version is skipped.
    fn sync_cookie(&self, version: u64, access_token: Option<&str>) {
        let config = &self.inner.config;
        let mut synced = self.inner.cookie_version.lock();
        if version <= *synced {
            tracing::debug!(version, "skipping superseded cookie update");
            return;
        }
        *synced = version;

        match access_token {
            Some(token) => {
                let cookie = Cookie::expires_in_days(&config.cookie_name, token, config.cookie_ttl_days);
                if let Err(e) = self.inner.cookies.set(cookie) {
                    tracing::warn!(cookie = %config.cookie_name, error = %e, "failed to persist access token");
                }
            }
            None => {
                if let Err(e) = self.inner.cookies.remove(&config.cookie_name) {
                    tracing::warn!(cookie = %config.cookie_name, error = %e, "failed to remove session cookie");
                }
            }
        }
    }

    fn notify(&self, snapshot: &Snapshot) {
        let delivered = self.inner.delivered.lock();
        if snapshot.version <= delivered.get() {
            tracing::trace!(version = snapshot.version, "skipping superseded notification");
            return;
        }
        delivered.set(snapshot.version);

        let listeners: Vec<StateListener> = self
            .inner
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            // A listener that dispatches re-enters here with a newer state
            if delivered.get() != snapshot.version {
                break;
            }
            listener(&snapshot.state);
        }
    }
}
