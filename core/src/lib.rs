//! # GraphQL Todo Core
//!
//! Core traits and types for the GraphQL Todo client.
//!
//! The crate splits a client application into a pure, testable core and a
//! thin imperative shell:
//!
//! - **State**: client-side cells (filter, search keyword, selection, query results)
//! - **Action**: every input to a reducer (user intents and operation results)
//! - **Reducer**: pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: description of async work (a network operation), not its execution
//! - **Environment**: injected dependencies (clock, query client)
//!
//! On the GraphQL side it provides:
//!
//! - [`operation`]: typed operations and the request/response envelopes
//! - [`cache`]: the response cache keyed by query identity
//! - [`transport`]: the seam to whatever answers GraphQL requests
//! - [`client`]: the query/mutation client with post-mutation cache updates
//! - [`query`]: loading / error / data state for a query result
//!
//! ## Example
//!
//! ```ignore
//! use graphql_todo_core::*;
//!
//! impl Reducer for FilterReducer {
//!     type State = FilterState;
//!     type Action = FilterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut FilterState,
//!         action: FilterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<FilterAction>; 4]> {
//!         match action {
//!             FilterAction::SetFilter(filter) => state.filter = filter,
//!         }
//!         SmallVec::new()
//!     }
//! }
//! ```

pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Query cache keyed by query identity
pub mod cache;

/// Query/mutation client
pub mod client;

/// Reducer composition utilities
pub mod composition;

/// Client error taxonomy
pub mod error;

/// Typed GraphQL operations and wire envelopes
pub mod operation;

/// Loading / error / data state of a query
pub mod query;

/// Transport seam for executing GraphQL requests
pub mod transport;

pub use cache::{InMemoryCache, QueryCache, QueryKey};
pub use client::{ClientConfig, FetchPolicy, QueryClient};
pub use error::{ClientError, TransportError};
pub use operation::{GraphQlError, GraphQlRequest, GraphQlResponse, Operation, OperationKind};
pub use query::QueryState;
pub use transport::Transport;
pub use effect::Effect;
pub use environment::{Clock, SystemClock};
pub use reducer::Reducer;

/// The [`Reducer`](reducer::Reducer) trait
///
/// A reducer never performs I/O. Network work comes back as [`Effect`]
/// values that the runtime executes.
///
/// [`Effect`]: crate::effect::Effect
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Applies actions to a state and describes the async work that follows
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for SelectionReducer {
    ///     type State = Option<TodoId>;
    ///     type Action = TodoId;
    ///     type Environment = ();
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut Option<TodoId>,
    ///         clicked: TodoId,
    ///         _env: &(),
    ///     ) -> SmallVec<[Effect<TodoId>; 4]> {
    ///         *state = if state.as_ref() == Some(&clicked) { None } else { Some(clicked) };
    ///         SmallVec::new()
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// State mutated in place
        type State;

        /// Intents and operation results
        type Action;

        /// Dependencies the effects need (API client, clock)
        type Environment;

        /// Apply `action` to `state` and return the effects to run
        ///
        /// Up to four effects are stored inline.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Descriptions of async work returned by reducers
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Work for the store to run after a reduction
    ///
    /// A `Future` that yields `Some(action)` sends that action back into the
    /// store. Effects returned together by one reduction run concurrently.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Async computation, usually a GraphQL operation, with an optional
        /// result action
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async block as an [`Effect::Future`]
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Returns true for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Injected dependencies shared by reducers and the mock server
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Source of the current time
    ///
    /// Sync timestamps and server-side `createdAt`/`updatedAt` come from
    /// here, so tests can pin them with a fixed clock.
    pub trait Clock: Send + Sync {
        /// Current UTC time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock implementation backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
