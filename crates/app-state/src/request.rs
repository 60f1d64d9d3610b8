//! Request sequencing for async auth operations
//!
//! Every register/login call takes a fresh [`RequestId`] from the store's
//! [`RequestSequence`]. Only the resolution of the most recently issued id is
//! applied to state; anything older is stale and dropped.

use serde::{Deserialize, Serialize};

/// Monotonically increasing identifier of one async operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Raw sequence number
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Phase of the latest issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestPhase {
    /// Nothing issued yet
    #[default]
    Idle,

    /// Awaiting the server
    Pending,

    /// Resolved with a user
    Fulfilled,

    /// Resolved with an error
    Rejected,
}

/// Issues request ids and tracks which one is current
///
/// Not internally synchronized: it lives inside the store's state lock so
/// that issuing an id and applying its pending action happen together.
#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: u64,
    phase: RequestPhase,
}

impl RequestSequence {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next id and mark it pending
    pub fn issue(&mut self) -> RequestId {
        self.issued += 1;
        self.phase = RequestPhase::Pending;
        RequestId(self.issued)
    }

    /// Most recently issued id, if any
    pub fn latest(&self) -> Option<RequestId> {
        (self.issued > 0).then_some(RequestId(self.issued))
    }

    /// Whether `id` is the most recently issued id
    pub fn is_current(&self, id: RequestId) -> bool {
        id.0 == self.issued
    }

    /// Record the resolution of `id`
    ///
    /// Returns `false` and leaves the phase untouched when `id` is stale.
    pub fn resolve(&mut self, id: RequestId, phase: RequestPhase) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.phase = phase;
        true
    }

    /// Phase of the latest request
    pub fn phase(&self) -> RequestPhase {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sequence_is_idle() {
        let seq = RequestSequence::new();
        assert_eq!(seq.phase(), RequestPhase::Idle);
        assert!(seq.latest().is_none());
    }

    #[test]
    fn test_issue_is_monotonic() {
        let mut seq = RequestSequence::new();
        let first = seq.issue();
        let second = seq.issue();

        assert!(second > first);
        assert_eq!(seq.latest(), Some(second));
        assert_eq!(seq.phase(), RequestPhase::Pending);
    }

    #[test]
    fn test_stale_resolution_rejected() {
        let mut seq = RequestSequence::new();
        let first = seq.issue();
        let second = seq.issue();

        assert!(!seq.resolve(first, RequestPhase::Fulfilled));
        assert_eq!(seq.phase(), RequestPhase::Pending);

        assert!(seq.resolve(second, RequestPhase::Rejected));
        assert_eq!(seq.phase(), RequestPhase::Rejected);
    }

    #[test]
    fn test_request_id_display() {
        let mut seq = RequestSequence::new();
        assert_eq!(seq.issue().to_string(), "#1");
        assert_eq!(seq.issue().get(), 2);
    }
}
