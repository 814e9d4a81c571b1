//! # GraphQL Todo Testing
//!
//! Testing utilities for the GraphQL Todo client.
//!
//! This crate provides:
//! - A deterministic [`Clock`] for server timestamps
//! - [`Transport`] doubles: offline, scripted and recording
//! - The [`ReducerTest`] Given-When-Then harness and effect assertions
//! - proptest strategies for titles and search keywords
//!
//! ## Example
//!
//! ```ignore
//! use graphql_todo_testing::{test_clock, RecordingTransport};
//!
//! #[tokio::test]
//! async fn add_refetches_list() {
//!     let server = Arc::new(RecordingTransport::new(MockTodoServer::seeded(test_clock())));
//!     let api = TodoApi::new(QueryClient::new(server.clone(), Arc::new(InMemoryCache::new())));
//!
//!     api.add_todo("Buy milk").await.unwrap();
//!     assert_eq!(server.operation_names(), vec!["AddTodo", "GetTodos"]);
//! }
//! ```

use chrono::{DateTime, Utc};
use graphql_todo_core::environment::Clock;


pub use reducer_test::{assertions, collect_actions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making server timestamps reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use graphql_todo_testing::mocks::FixedClock;
    /// use graphql_todo_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Transport doubles
///
/// Stand-ins for a GraphQL endpoint that let tests control what the client
/// sees without running a server.
pub mod transports {
    use async_trait::async_trait;
    use graphql_todo_core::{GraphQlRequest, GraphQlResponse, Transport, TransportError};
    use std::collections::VecDeque;
    use std::sync::{Mutex, PoisonError};

    /// Transport that never reaches the endpoint
    #[derive(Debug, Clone, Default)]
    pub struct OfflineTransport;

    #[async_trait]
    impl Transport for OfflineTransport {
        async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError> {
            Err(TransportError::Unreachable(format!(
                "offline while sending {}",
                request.operation_name
            )))
        }
    }

    /// Transport that answers from a queue of canned responses
    ///
    /// Responses are handed out in the order they were pushed. An empty queue
    /// answers with [`TransportError::Protocol`].
    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<GraphQlResponse, TransportError>>>,
    }

    impl ScriptedTransport {
        /// Create a transport with no scripted responses
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response
        #[must_use]
        pub fn respond(self, response: GraphQlResponse) -> Self {
            self.push(Ok(response));
            self
        }

        /// Queue a transport failure
        #[must_use]
        pub fn fail(self, error: TransportError) -> Self {
            self.push(Err(error));
            self
        }

        /// Queue a response or failure after construction
        pub fn push(&self, outcome: Result<GraphQlResponse, TransportError>) {
            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(outcome);
        }

        /// Number of responses not yet consumed
        #[must_use]
        pub fn remaining(&self) -> usize {
            self.responses.lock().unwrap_or_else(PoisonError::into_inner).len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError> {
            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or_else(|| {
                    Err(TransportError::Protocol(format!(
                        "no scripted response for {}",
                        request.operation_name
                    )))
                })
        }
    }

    /// Transport wrapper that records every request before delegating
    #[derive(Debug)]
    pub struct RecordingTransport<T> {
        inner: T,
        requests: Mutex<Vec<GraphQlRequest>>,
    }

    impl<T: Transport> RecordingTransport<T> {
        /// Wrap a transport
        #[must_use]
        pub const fn new(inner: T) -> Self {
            Self {
                inner,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Borrow the wrapped transport
        #[must_use]
        pub const fn inner(&self) -> &T {
            &self.inner
        }

        /// All requests seen so far, oldest first
        #[must_use]
        pub fn requests(&self) -> Vec<GraphQlRequest> {
            self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        /// Operation names of all requests seen so far, oldest first
        #[must_use]
        pub fn operation_names(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|r| r.operation_name.clone())
                .collect()
        }

        /// Number of requests for one operation
        #[must_use]
        pub fn count(&self, operation_name: &str) -> usize {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .filter(|r| r.operation_name == operation_name)
                .count()
        }

        /// Forget recorded requests
        pub fn clear(&self) {
            self.requests.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    #[async_trait]
    impl<T: Transport> Transport for RecordingTransport<T> {
        async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request.clone());
            self.inner.execute(request).await
        }
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Titles that pass validation: non-blank, printable ASCII with spaces
    pub fn title() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ]{0,23}"
    }

    /// Any title, including blank and whitespace-only ones
    pub fn any_title() -> impl Strategy<Value = String> {
        prop_oneof![title(), "[ \t]{0,4}"]
    }

    /// Search keywords with mixed case and optional surrounding whitespace
    pub fn keyword() -> impl Strategy<Value = String> {
        ("[ ]{0,2}", "[A-Za-z]{0,4}", "[ ]{0,2}").prop_map(|(lead, word, trail)| format!("{lead}{word}{trail}"))
    }
}

/// Install a tracing subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};
pub use transports::{OfflineTransport, RecordingTransport, ScriptedTransport};
