//! Error types for GraphQL operations.
//!
//! Two layers: [`TransportError`] is what a [`Transport`](crate::Transport)
//! reports when a request never produced a GraphQL response, and
//! [`ClientError`] is what callers of the [`QueryClient`](crate::QueryClient)
//! see. Client errors are `Clone` so they can travel inside actions and state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to obtain any GraphQL response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint could not be reached (offline, connection refused)
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    /// A response arrived but was not a GraphQL envelope
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Errors surfaced by the query client
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientError {
    /// Network-level failure; no response was received
    #[error("transport error: {0}")]
    Transport(String),

    /// The server rejected the operation (e.g. unknown id)
    #[error("server error: {0}")]
    Server(String),

    /// Caller-side validation failed before the operation was issued
    #[error("validation error: {0}")]
    Validation(String),

    /// The response or cached value did not match the operation's data shape
    #[error("decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Returns true if the failure happened before reaching the server
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if the server answered with GraphQL errors
    #[must_use]
    pub const fn is_server(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

impl From<TransportError> for ClientError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_converts_to_client_error() {
        let error: ClientError = TransportError::Unreachable("offline".into()).into();
        assert!(error.is_transport());
        assert_eq!(error.to_string(), "transport error: endpoint unreachable: offline");
    }

    #[test]
    fn server_error_display() {
        let error = ClientError::Server("Todo not found: 42".into());
        assert!(error.is_server());
        assert!(!error.is_transport());
        assert_eq!(error.to_string(), "server error: Todo not found: 42");
    }
}
