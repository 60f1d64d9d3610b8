//! Authentication state management
//!
//! This crate holds the client-side session: a pure reducer over explicit
//! state, request sequencing for async operations, and the injectable store
//! that drives register/login/logout against the auth service.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod request;
pub mod session;
pub mod store;

pub use request::{RequestId, RequestPhase, RequestSequence};
pub use session::{reduce, AuthAction, AuthOp, AuthState, ErrorInfo};
pub use store::{ListenerId, Rejection, SessionConfig, SessionStore, StateListener};
