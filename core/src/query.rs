//! Loading / error / data state of a query.
//!
//! A single enum instead of three independent flags: the variants are
//! ordered the way a consumer must check them (loading, then error, then
//! data), so it is impossible to render stale data while a failure is pending.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};

/// Observable state of a query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryState<T> {
    /// Not requested yet
    Idle,
    /// Request in flight
    Loading,
    /// Request failed
    Failed(ClientError),
    /// Result available
    Ready(T),
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> QueryState<T> {
    /// Returns true while the request is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Error of a failed request
    #[must_use]
    pub const fn error(&self) -> Option<&ClientError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Data of a settled request
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    /// Consume into the data, if any
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    /// Map the ready data, keeping the other states
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> QueryState<U> {
        match self {
            Self::Idle => QueryState::Idle,
            Self::Loading => QueryState::Loading,
            Self::Failed(error) => QueryState::Failed(error),
            Self::Ready(data) => QueryState::Ready(f(data)),
        }
    }
}

impl<T> From<Result<T, ClientError>> for QueryState<T> {
    fn from(result: Result<T, ClientError>) -> Self {
        match result {
            Ok(data) => Self::Ready(data),
            Err(error) => Self::Failed(error),
        }
    }
}
