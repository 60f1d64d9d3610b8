//! Session state, actions and the reducer
//!
//! [`reduce`] is a pure function from an explicit previous state and an
//! [`AuthAction`] to the next state. It performs no I/O; the cookie write that
//! accompanies a successful login is the store's job.

use auth_client::{AccessToken, ApiError, User};
use serde::{Deserialize, Serialize};

use crate::request::RequestId;

/// Which async operation an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthOp {
    /// Account creation
    Register,
    /// Authentication
    Login,
}

impl AuthOp {
    /// Action type prefix (e.g., "auth/loginUser")
    pub fn type_prefix(self) -> &'static str {
        match self {
            AuthOp::Register => "auth/registerUser",
            AuthOp::Login => "auth/loginUser",
        }
    }

    /// Message used when a failure carries no usable server message
    pub fn default_message(self) -> &'static str {
        match self {
            AuthOp::Register => "Registration failed",
            AuthOp::Login => "Login failed",
        }
    }

    /// `name` recorded in [`ErrorInfo`] for a rejection
    pub fn error_name(self) -> &'static str {
        match self {
            AuthOp::Register => "RegisterError",
            AuthOp::Login => "LoginError",
        }
    }
}

impl std::fmt::Display for AuthOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_prefix())
    }
}

/// Serializable description of the last failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error kind
    pub name: String,
    /// Human-readable message
    pub message: String,
    /// Stack trace; always empty on this side of the wire
    pub stack: String,
    /// HTTP status code as text, for HTTP-layer failures
    pub code: String,
}

impl ErrorInfo {
    /// Normalize an API failure for `op`
    ///
    /// An HTTP error body's `message` is surfaced verbatim. Anything else,
    /// including HTTP errors without a usable message, gets the operation's
    /// fixed default.
    pub fn rejected(op: AuthOp, error: &ApiError) -> Self {
        Self {
            name: op.error_name().to_string(),
            message: error
                .server_message()
                .unwrap_or_else(|| op.default_message())
                .to_string(),
            stack: String::new(),
            code: error.status().map(|s| s.to_string()).unwrap_or_default(),
        }
    }

    /// Whether no error is recorded
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.message.is_empty() && self.stack.is_empty() && self.code.is_empty()
    }
}

/// The session held by a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    /// Current user, absent when logged out
    pub user: Option<User>,
    /// Current access token; empty when none is held
    pub token: AccessToken,
    /// True while the latest async operation is unresolved
    pub loading: bool,
    /// Most recent failure
    pub error: ErrorInfo,
}

impl AuthState {
    /// Whether a user is signed in
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Everything that can change an [`AuthState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    /// An async operation started
    Pending {
        /// Operation
        op: AuthOp,
        /// Id of the request that started
        request_id: RequestId,
    },

    /// An async operation resolved with a user
    Fulfilled {
        /// Operation
        op: AuthOp,
        /// Id of the request that resolved
        request_id: RequestId,
        /// Returned user
        user: User,
    },

    /// An async operation failed
    Rejected {
        /// Operation
        op: AuthOp,
        /// Id of the request that failed
        request_id: RequestId,
        /// Normalized failure
        error: ErrorInfo,
    },

    /// A persisted token was picked up at startup
    TokenRestored {
        /// Token read from storage
        access_token: String,
    },

    /// Clear the session
    Logout,
}

impl AuthAction {
    /// Action type string (e.g., "auth/loginUser/fulfilled")
    pub fn type_name(&self) -> String {
        match self {
            AuthAction::Pending { op, .. } => format!("{}/pending", op.type_prefix()),
            AuthAction::Fulfilled { op, .. } => format!("{}/fulfilled", op.type_prefix()),
            AuthAction::Rejected { op, .. } => format!("{}/rejected", op.type_prefix()),
            AuthAction::TokenRestored { .. } => "auth/tokenRestored".to_string(),
            AuthAction::Logout => "auth/logout".to_string(),
        }
    }

    /// Request id carried by async lifecycle actions
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            AuthAction::Pending { request_id, .. }
            | AuthAction::Fulfilled { request_id, .. }
            | AuthAction::Rejected { request_id, .. } => Some(*request_id),
            AuthAction::TokenRestored { .. } | AuthAction::Logout => None,
        }
    }
}

/// Compute the state that follows `previous` under `action`
pub fn reduce(previous: &AuthState, action: &AuthAction) -> AuthState {
    let mut state = previous.clone();

    match action {
        AuthAction::Pending { .. } => {
            state.loading = true;
        }
        AuthAction::Fulfilled { user, .. } => {
            state.loading = false;
            state.token = user.token.clone();
            state.user = Some(user.clone());
        }
        AuthAction::Rejected { error, .. } => {
            state.loading = false;
            state.error = error.clone();
        }
        AuthAction::TokenRestored { access_token } => {
            state.token = AccessToken::new(access_token.clone());
        }
        AuthAction::Logout => {
            state.user = None;
            state.token = AccessToken::default();
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestSequence;

    fn alice() -> User {
        User {
            id: "1".to_string(),
            username: "alice".to_string(),
            token: AccessToken::new("abc"),
        }
    }

    fn rid() -> RequestId {
        RequestSequence::new().issue()
    }

    #[test]
    fn test_initial_state() {
        let state = AuthState::default();
        assert!(state.user.is_none());
        assert_eq!(state.token.access_token, "");
        assert!(!state.loading);
        assert!(state.error.is_empty());
    }

    #[test]
    fn test_pending_sets_loading_keeps_error() {
        let previous = AuthState {
            error: ErrorInfo {
                message: "Login failed".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let next = reduce(&previous, &AuthAction::Pending { op: AuthOp::Login, request_id: rid() });

        assert!(next.loading);
        assert_eq!(next.error, previous.error);
    }

    #[test]
    fn test_fulfilled_replaces_user_and_token() {
        let pending = AuthState { loading: true, ..Default::default() };
        let next = reduce(
            &pending,
            &AuthAction::Fulfilled { op: AuthOp::Login, request_id: rid(), user: alice() },
        );

        assert!(!next.loading);
        assert_eq!(next.user, Some(alice()));
        assert_eq!(next.token, AccessToken::new("abc"));
    }

    #[test]
    fn test_rejected_replaces_error_only() {
        let previous = AuthState {
            user: Some(alice()),
            token: AccessToken::new("abc"),
            loading: true,
            error: ErrorInfo { message: "older".to_string(), ..Default::default() },
        };
        let error = ErrorInfo::rejected(AuthOp::Register, &ApiError::http(409, Some("Username taken".to_string())));

        let next = reduce(
            &previous,
            &AuthAction::Rejected { op: AuthOp::Register, request_id: rid(), error: error.clone() },
        );

        assert!(!next.loading);
        assert_eq!(next.error, error);
        assert_eq!(next.user, previous.user);
        assert_eq!(next.token, previous.token);
    }

    #[test]
    fn test_logout_clears_session_from_any_state() {
        let states = [
            AuthState::default(),
            AuthState { user: Some(alice()), token: AccessToken::new("abc"), ..Default::default() },
            AuthState { loading: true, token: AccessToken::new("restored"), ..Default::default() },
        ];

        for previous in &states {
            let next = reduce(previous, &AuthAction::Logout);
            assert!(next.user.is_none());
            assert_eq!(next.token.access_token, "");
            assert_eq!(next.loading, previous.loading);
            assert_eq!(next.error, previous.error);
        }
    }

    #[test]
    fn test_token_restored() {
        let next = reduce(
            &AuthState::default(),
            &AuthAction::TokenRestored { access_token: "persisted".to_string() },
        );
        assert_eq!(next.token.access_token, "persisted");
        assert!(next.user.is_none());
    }

    #[test]
    fn test_reduce_leaves_previous_untouched() {
        let previous = AuthState { user: Some(alice()), ..Default::default() };
        let _ = reduce(&previous, &AuthAction::Logout);
        assert_eq!(previous.user, Some(alice()));
    }

    #[test]
    fn test_error_info_uses_server_message() {
        let info = ErrorInfo::rejected(AuthOp::Login, &ApiError::http(401, Some("X".to_string())));
        assert_eq!(info.message, "X");
        assert_eq!(info.name, "LoginError");
        assert_eq!(info.code, "401");
        assert_eq!(info.stack, "");
    }

    #[test]
    fn test_error_info_defaults() {
        let http = ErrorInfo::rejected(AuthOp::Register, &ApiError::http(500, None));
        assert_eq!(http.message, "Registration failed");
        assert_eq!(http.code, "500");

        let network = ErrorInfo::rejected(AuthOp::Login, &ApiError::Network("refused".to_string()));
        assert_eq!(network.message, "Login failed");
        assert_eq!(network.code, "");

        let decode = ErrorInfo::rejected(AuthOp::Register, &ApiError::Decode("bad".to_string()));
        assert_eq!(decode.message, "Registration failed");
    }

    #[test]
    fn test_action_type_names() {
        let id = rid();
        assert_eq!(
            AuthAction::Pending { op: AuthOp::Register, request_id: id }.type_name(),
            "auth/registerUser/pending"
        );
        assert_eq!(
            AuthAction::Fulfilled { op: AuthOp::Login, request_id: id, user: alice() }.type_name(),
            "auth/loginUser/fulfilled"
        );
        assert_eq!(AuthAction::Logout.type_name(), "auth/logout");
        assert_eq!(AuthAction::Logout.request_id(), None);
        assert_eq!(
            AuthAction::Pending { op: AuthOp::Login, request_id: id }.request_id(),
            Some(id)
        );
    }

    #[test]
    fn test_state_serializes_like_the_wire() {
        let state = AuthState { user: Some(alice()), token: AccessToken::new("abc"), ..Default::default() };
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["user"]["_id"], "1");
        assert_eq!(json["token"]["access_token"], "abc");
        assert_eq!(json["loading"], false);
        assert_eq!(json["error"]["message"], "");
    }
}
